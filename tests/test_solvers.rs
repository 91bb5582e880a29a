use std::fs;

use binary_pivot::core::configuration::Configuration;
use binary_pivot::core::domain::{MovePolicy, SimulationParams};
use binary_pivot::io::results::{load_snapshot, ResultsWriter};
use binary_pivot::solvers::pivot::PivotSampler;
use binary_pivot::solvers::{SolverCommand, SolverEvent};
use crossbeam_channel::unbounded;

mod common;

fn quick_params() -> SimulationParams {
    SimulationParams {
        large_count: 6,
        small_count: 80,
        small_radius: 0.2,
        density: 0.3,
        warmup_moves: 50,
        moves_per_measurement: 40,
        measurements: 3,
        ..Default::default()
    }
}

#[test]
fn test_sampler_flow() {
    let params = quick_params();
    let mut cfg = Configuration::from_params(&params).unwrap();
    let sampler = PivotSampler::new(params);

    let (tx, rx) = unbounded();
    let mut rng = common::seeded_rng(1);
    let outcome = sampler.run(&mut cfg, &mut rng, &tx, None, None).unwrap();
    drop(tx);

    assert!(!outcome.stopped);
    assert_eq!(outcome.samples.len(), 3);
    assert_eq!(outcome.tally.moves, 50 + 3 * 40);
    let summary = outcome.summary.unwrap();
    assert_eq!(summary.count, 3);
    assert!(summary.min <= summary.mean && summary.mean <= summary.max);

    let events: Vec<SolverEvent> = rx.iter().collect();
    let measurements = events.iter().filter(|e| matches!(e, SolverEvent::Measurement(_))).count();
    assert_eq!(measurements, 3);
    assert!(events.iter().any(|e| matches!(e, SolverEvent::Summary(_))));
    assert!(events.iter().any(|e| matches!(e, SolverEvent::Snapshot(_))));
    assert!(matches!(events.last(), Some(SolverEvent::Finished)));
    assert!(!events.iter().any(|e| matches!(e, SolverEvent::Failed(_))));

    common::assert_valid(&cfg);
}

#[test]
fn test_sampler_on_worker_thread_can_be_stopped() {
    let params = SimulationParams {
        warmup_moves: usize::MAX,
        policy: MovePolicy::LargeDisk,
        ..quick_params()
    };
    let cfg = Configuration::from_params(&params).unwrap();

    let (tx, rx) = unbounded();
    let (ctl_tx, ctl_rx) = unbounded();
    let handle = std::thread::spawn(move || {
        let mut cfg = cfg;
        let mut rng = common::seeded_rng(2);
        let outcome = PivotSampler::new(params)
            .run(&mut cfg, &mut rng, &tx, Some(&ctl_rx), None)
            .unwrap();
        (outcome, cfg)
    });

    // First snapshot arrives before any move
    assert!(matches!(rx.recv().unwrap(), SolverEvent::Log(_)));
    assert!(matches!(rx.recv().unwrap(), SolverEvent::Snapshot(_)));
    ctl_tx.send(SolverCommand::Pause).unwrap();
    ctl_tx.send(SolverCommand::Resume).unwrap();
    ctl_tx.send(SolverCommand::Stop).unwrap();

    let (outcome, cfg) = handle.join().unwrap();
    assert!(outcome.stopped);
    assert!(outcome.samples.is_empty());
    common::assert_valid(&cfg);
}

#[test]
fn test_results_are_written() {
    let root = std::env::temp_dir().join(format!("binary_pivot_it_{}", uuid::Uuid::new_v4()));
    let params = SimulationParams {
        snapshot_every: 2,
        output_dir: Some(root.clone()),
        ..quick_params()
    };
    let mut cfg = Configuration::from_params(&params).unwrap();
    let mut writer = ResultsWriter::create(&root, &params).unwrap();
    let dir = writer.dir().to_path_buf();

    let (tx, _rx) = unbounded();
    let mut rng = common::seeded_rng(3);
    PivotSampler::new(params)
        .run(&mut cfg, &mut rng, &tx, None, Some(&mut writer))
        .unwrap();

    let csv_text = fs::read_to_string(dir.join("measurements.csv")).unwrap();
    assert_eq!(csv_text.lines().count(), 1 + 3);
    assert!(dir.join("params.json").exists());
    assert!(dir.join("summary.json").exists());
    assert!(dir.join("snapshot_0.json").exists());
    assert!(!dir.join("snapshot_1.json").exists());

    let last = load_snapshot(&dir.join("snapshot_2.json")).unwrap();
    assert_eq!(last, cfg.snapshot());

    fs::remove_dir_all(&root).unwrap();
}
