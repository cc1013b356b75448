//! Example: Homography estimation from point correspondences
//!
//! Generates correspondences under a known rotation + translation, mixes in
//! random outliers and recovers the transform with RANSAC.
//!
//! ```text
//! RUST_LOG=debug cargo run --example homography_estimation -- --outliers 40 --workers 4
//! ```

use clap::Parser;
use homography_ransac::*;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// number of inlier correspondences
    #[arg(long, default_value_t = 30)]
    inliers: usize,

    /// number of random outlier correspondences
    #[arg(long, default_value_t = 10)]
    outliers: usize,

    /// inlier threshold in pixels
    #[arg(long, default_value_t = 2.0)]
    threshold: f64,

    #[arg(long, default_value_t = 1000)]
    iterations: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// run in parallel on this many workers
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let angle: f64 = 0.1;
    let (tx, ty) = (10.0, 5.0);
    let truth = Homography::new(nalgebra::Matrix3::new(
        angle.cos(),
        -angle.sin(),
        tx,
        angle.sin(),
        angle.cos(),
        ty,
        0.0,
        0.0,
        1.0,
    ));

    let mut items = Vec::with_capacity(cli.inliers + cli.outliers);
    for _ in 0..cli.inliers {
        let s = Point2D::new(rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0));
        let mut t = truth.transform_point(&s);
        t.x += rng.random_range(-0.5..0.5);
        t.y += rng.random_range(-0.5..0.5);
        items.push(PointCorrespondence::new(s, t));
    }
    for _ in 0..cli.outliers {
        items.push(PointCorrespondence::from_coords(
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
        ));
    }
    let set = CorrespondenceSet::new(items);
    info!("generated {} inliers and {} outliers", cli.inliers, cli.outliers);

    let settings = RansacSettings {
        workers: cli.workers,
        refine_on_inliers: true,
        ..RansacSettings::with_threshold_and_iterations(cli.threshold, cli.iterations)
    };
    let estimator = RansacEstimator::new(settings)?;
    let result = match cli.workers {
        Some(_) => estimator.run_parallel(&set, cli.seed)?,
        None => estimator.run(&set, &mut rng)?,
    };

    println!("Found {} inliers out of {} points", result.inlier_count, set.len());
    println!("  Inlier ratio: {:.2}%", 100.0 * result.inlier_ratio(set.len()));
    println!(
        "  Iterations: {} ({} degenerate), best at {:?}, refined: {}",
        result.iterations, result.degenerate_iterations, result.best_iteration, result.refined
    );

    if let Some(h) = &result.homography {
        let h = h.normalized().h;
        println!("\nEstimated homography matrix:");
        for i in 0..3 {
            println!("  [{:8.4}, {:8.4}, {:8.4}]", h[(i, 0)], h[(i, 1)], h[(i, 2)]);
        }
    }

    let correct = result.inliers.iter().filter(|&&i| i < cli.inliers).count();
    println!("\nCorrectly identified {correct} out of {} true inliers", cli.inliers);

    Ok(())
}
