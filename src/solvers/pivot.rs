use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, warn};
use rand::Rng;

use crate::analysis::metrics::{average_pair_distance, BatchSummary, MoveTally};
use crate::core::configuration::Configuration;
use crate::core::domain::SimulationParams;
use crate::core::error::SimError;
use crate::engine::moves::perform_move;
use crate::engine::overlap::NeighbourScan;
use crate::io::results::ResultsWriter;
use crate::solvers::{MeasurementStats, SolverCommand, SolverEvent};

/// What a finished (or stopped) run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// `D_avg` of every completed measurement.
    pub samples: Vec<f64>,
    pub summary: Option<BatchSummary>,
    pub tally: MoveTally,
    /// The run was ended early by `SolverCommand::Stop`.
    pub stopped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Drives cluster moves on one configuration: a warm-up phase, then
/// `measurements` batches of `moves_per_measurement` moves, measuring the
/// large-disk pair distance after each batch.
pub struct PivotSampler {
    params: SimulationParams,
    scan: NeighbourScan,
}

impl PivotSampler {
    pub fn new(params: SimulationParams) -> Self {
        let scan = NeighbourScan::new(params.ring_margin);
        Self { params, scan }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Runs the whole schedule. Always ends with `SolverEvent::Finished`;
    /// a consistency error is reported as `SolverEvent::Failed` first.
    pub fn run<R: Rng + ?Sized>(
        &self,
        cfg: &mut Configuration,
        rng: &mut R,
        tx: &Sender<SolverEvent>,
        control: Option<&Receiver<SolverCommand>>,
        writer: Option<&mut ResultsWriter>,
    ) -> Result<RunOutcome, SimError> {
        let result = self.sample(cfg, rng, tx, control, writer);

        match &result {
            Ok(outcome) => {
                let msg = format!(
                    "Sampler finished: {} moves, mean cluster {:.2}, largest {}",
                    outcome.tally.moves,
                    outcome.tally.mean_cluster_size(),
                    outcome.tally.largest_cluster
                );
                info!("{msg}");
                let _ = tx.send(SolverEvent::Log(msg));
            }
            Err(e) => {
                error!("cluster move failed: {e}");
                let _ = tx.send(SolverEvent::Failed(e.to_string()));
            }
        }
        let _ = tx.send(SolverEvent::Finished);
        result
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        cfg: &mut Configuration,
        rng: &mut R,
        tx: &Sender<SolverEvent>,
        control: Option<&Receiver<SolverCommand>>,
        mut writer: Option<&mut ResultsWriter>,
    ) -> Result<RunOutcome, SimError> {
        let p = &self.params;
        let start = Instant::now();
        let mut tally = MoveTally::default();
        let mut samples = Vec::with_capacity(p.measurements);

        let _ = tx.send(SolverEvent::Log(format!(
            "Packing: {} large + {} small (r = {}), L = {}, density {:.3}",
            cfg.large_count(),
            cfg.small_count(),
            cfg.small_radius(),
            cfg.domain_size(),
            cfg.density()
        )));
        let _ = tx.send(SolverEvent::Snapshot(cfg.snapshot()));

        // 1. Warm-up
        for _ in 0..p.warmup_moves {
            if poll_control(control, tx) == Flow::Stop {
                return Ok(RunOutcome { summary: BatchSummary::from_samples(&samples), samples, tally, stopped: true });
            }
            self.step(cfg, rng, &mut tally)?;
        }
        let _ = tx.send(SolverEvent::Log(format!(
            "Warm-up complete ({} moves, {:.2}s)",
            p.warmup_moves,
            start.elapsed().as_secs_f64()
        )));
        let _ = tx.send(SolverEvent::Snapshot(cfg.snapshot()));

        // 2. Measurements
        for m in 0..p.measurements {
            let batch_start = Instant::now();
            for _ in 0..p.moves_per_measurement {
                if poll_control(control, tx) == Flow::Stop {
                    return Ok(RunOutcome { summary: BatchSummary::from_samples(&samples), samples, tally, stopped: true });
                }
                self.step(cfg, rng, &mut tally)?;
            }

            let d_avg = average_pair_distance(cfg);
            if let Some(d) = d_avg {
                samples.push(d);
            }
            let stats = MeasurementStats {
                measurement: m,
                total_moves: tally.moves,
                d_avg,
                mean_cluster_size: tally.mean_cluster_size(),
                largest_cluster: tally.largest_cluster,
                elapsed_s: start.elapsed().as_secs_f64(),
            };
            debug!("measurement {m}: d_avg = {d_avg:?}, mean cluster {:.2}", stats.mean_cluster_size);

            if let Some(w) = writer.as_deref_mut() {
                self.persist(w, &stats, cfg, tx);
            }

            let batch_secs = batch_start.elapsed().as_secs_f64();
            if batch_secs > 0.0 {
                let _ = tx.send(SolverEvent::WorkerHeartbeat(p.moves_per_measurement as f64 / batch_secs));
            }
            let _ = tx.send(SolverEvent::Measurement(stats));
            let _ = tx.send(SolverEvent::Snapshot(cfg.snapshot()));
        }

        // 3. Batch statistics
        let summary = BatchSummary::from_samples(&samples);
        if let Some(s) = &summary {
            let _ = tx.send(SolverEvent::Log(format!(
                ">>> Mean distance {:.5} with std {:.5} over {} measurements",
                s.mean, s.std_dev, s.count
            )));
            if let Some(w) = writer.as_deref() {
                if let Err(e) = w.write_summary(s) {
                    warn!("{e:#}");
                    let _ = tx.send(SolverEvent::Log(format!("Failed to write summary: {e:#}")));
                }
            }
            let _ = tx.send(SolverEvent::Summary(*s));
        }

        Ok(RunOutcome { samples, summary, tally, stopped: false })
    }

    #[inline]
    fn step<R: Rng + ?Sized>(
        &self,
        cfg: &mut Configuration,
        rng: &mut R,
        tally: &mut MoveTally,
    ) -> Result<(), SimError> {
        let report = perform_move(self.params.policy, cfg, rng, &self.scan)?;
        tally.record(&report);
        Ok(())
    }

    /// Result-file failures are reported but never stop the run.
    fn persist(
        &self,
        writer: &mut ResultsWriter,
        stats: &MeasurementStats,
        cfg: &Configuration,
        tx: &Sender<SolverEvent>,
    ) {
        if let Err(e) = writer.record_measurement(stats) {
            warn!("{e:#}");
            let _ = tx.send(SolverEvent::Log(format!("Failed to record measurement: {e:#}")));
        }
        let every = self.params.snapshot_every;
        if every > 0 && stats.measurement % every == 0 {
            if let Err(e) = writer.write_snapshot(stats.measurement, &cfg.snapshot()) {
                warn!("{e:#}");
                let _ = tx.send(SolverEvent::Log(format!("Failed to write snapshot: {e:#}")));
            }
        }
    }
}

/// Drains pending commands. A pause blocks here, between two moves, until
/// the worker is resumed or stopped.
fn poll_control(control: Option<&Receiver<SolverCommand>>, tx: &Sender<SolverEvent>) -> Flow {
    let Some(rx) = control else {
        return Flow::Continue;
    };
    loop {
        match rx.try_recv() {
            Ok(SolverCommand::Stop) => return Flow::Stop,
            Ok(SolverCommand::Resume) => continue,
            Ok(SolverCommand::Pause) => {
                let _ = tx.send(SolverEvent::Log("Paused.".to_string()));
                loop {
                    match rx.recv() {
                        Ok(SolverCommand::Resume) => {
                            let _ = tx.send(SolverEvent::Log("Resumed.".to_string()));
                            break;
                        }
                        Ok(SolverCommand::Stop) => return Flow::Stop,
                        Ok(SolverCommand::Pause) => {}
                        // Controller gone: nobody can resume us
                        Err(_) => return Flow::Stop,
                    }
                }
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Flow::Continue,
        }
    }
}
