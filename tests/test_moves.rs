use binary_pivot::core::configuration::Configuration;
use binary_pivot::core::domain::MovePolicy;
use binary_pivot::engine::cluster::cluster_move;
use binary_pivot::engine::moves::{perform_large_disk_move, perform_move, perform_random_move};
use binary_pivot::engine::overlap::NeighbourScan;
use nalgebra::Point2;

mod common;

fn run_policy(policy: MovePolicy, seed: u64) {
    let mut cfg = common::small_mixture();
    let radii = cfg.radii().to_vec();
    let l = cfg.domain_size();
    let scan = NeighbourScan::default();
    let mut rng = common::seeded_rng(seed);

    for step in 0..2_000 {
        let report = perform_move(policy, &mut cfg, &mut rng, &scan).unwrap();
        assert!(report.cluster_size() >= 1);
        if step % 100 == 0 {
            common::assert_valid(&cfg);
        }
    }
    common::assert_valid(&cfg);

    // Conservation
    assert_eq!(cfg.len(), 210);
    assert_eq!(cfg.radii(), radii.as_slice());
    assert_eq!(cfg.domain_size(), l);
}

#[test]
fn test_random_disk_moves_stay_valid() {
    run_policy(MovePolicy::RandomDisk, 7);
}

#[test]
fn test_large_disk_moves_stay_valid() {
    run_policy(MovePolicy::LargeDisk, 11);
}

#[test]
fn test_large_disk_policy_seeds_large_disks() {
    let mut cfg = common::small_mixture();
    let scan = NeighbourScan::default();
    let mut rng = common::seeded_rng(3);
    for _ in 0..200 {
        let report = perform_large_disk_move(&mut cfg, &mut rng, &scan).unwrap();
        assert!(report.seed < cfg.large_count());
        assert_eq!(report.moved[0], report.seed);
    }
}

#[test]
fn test_dense_mixture_stays_valid() {
    // Wide ring margin on a crowded box
    let mut cfg = Configuration::from_density(16, 400, 0.15, 0.45).unwrap();
    let scan = NeighbourScan::new(2);
    let mut rng = common::seeded_rng(99);
    for _ in 0..1_000 {
        perform_random_move(&mut cfg, &mut rng, &scan).unwrap();
    }
    common::assert_valid(&cfg);
}

#[test]
fn test_same_seed_same_trajectory() {
    let scan = NeighbourScan::default();
    let mut a = common::small_mixture();
    let mut b = common::small_mixture();
    let mut rng_a = common::seeded_rng(42);
    let mut rng_b = common::seeded_rng(42);
    for _ in 0..300 {
        perform_random_move(&mut a, &mut rng_a, &scan).unwrap();
        perform_random_move(&mut b, &mut rng_b, &scan).unwrap();
    }
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn test_move_can_resume_from_snapshot() {
    let scan = NeighbourScan::default();
    let mut cfg = common::small_mixture();
    let mut rng = common::seeded_rng(5);
    for _ in 0..100 {
        perform_random_move(&mut cfg, &mut rng, &scan).unwrap();
    }
    let mut restored = Configuration::from_snapshot(&cfg.snapshot()).unwrap();
    for _ in 0..100 {
        perform_random_move(&mut restored, &mut rng, &scan).unwrap();
    }
    common::assert_valid(&restored);
}

#[test]
fn test_pivot_on_lone_disk_is_fixed_point() {
    let mut cfg =
        Configuration::with_positions(1, 0, 0.1, 10.0, vec![Point2::new(5.0, 5.0)]).unwrap();
    let report = cluster_move(&mut cfg, 0, &Point2::new(5.0, 5.0), &NeighbourScan::default()).unwrap();
    assert_eq!(report.moved, vec![0]);
    assert!((*cfg.position(0) - Point2::new(5.0, 5.0)).norm() < 1e-12);
    common::assert_valid(&cfg);
}
