use binary_pivot::analysis::metrics::MoveTally;
use binary_pivot::core::configuration::Configuration;
use binary_pivot::core::domain::{MovePolicy, SimulationParams};
use binary_pivot::engine::moves::perform_move;
use binary_pivot::engine::overlap::NeighbourScan;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;
use anyhow::Result;

const MOVES: usize = 20_000;

fn bench(policy: MovePolicy, params: &SimulationParams) -> Result<()> {
    let mut cfg = Configuration::from_params(params)?;
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let scan = NeighbourScan::new(params.ring_margin);
    let mut tally = MoveTally::default();

    let start = Instant::now();
    for _ in 0..MOVES {
        let report = perform_move(policy, &mut cfg, &mut rng, &scan)?;
        tally.record(&report);
    }
    let duration = start.elapsed();

    println!(
        "{:?}: {} moves in {:?} ({:.0} moves/s), mean cluster {:.2}, largest {}",
        policy,
        MOVES,
        duration,
        MOVES as f64 / duration.as_secs_f64(),
        tally.mean_cluster_size(),
        tally.largest_cluster
    );
    Ok(())
}

fn main() -> Result<()> {
    let params = SimulationParams {
        large_count: 50,
        small_count: 2000,
        small_radius: 0.1,
        density: 0.3,
        ..Default::default()
    };

    bench(MovePolicy::RandomDisk, &params)?;
    bench(MovePolicy::LargeDisk, &params)?;
    Ok(())
}
