use crate::analysis::metrics::BatchSummary;
use crate::core::configuration::DiskSnapshot;

/// Statistics reported after each batch of moves.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementStats {
    /// Zero-based batch number.
    pub measurement: usize,
    /// Moves performed since the start of the run, warm-up included.
    pub total_moves: u64,
    /// Average pairwise distance of large disks, if there are at least two.
    pub d_avg: Option<f64>,
    pub mean_cluster_size: f64,
    pub largest_cluster: usize,
    /// Seconds since the sampler started.
    pub elapsed_s: f64,
}

/// Events emitted by the sampler to the main thread.
#[derive(Debug, Clone)]
pub enum SolverEvent {
    /// Diagnostic log message.
    Log(String),

    /// Moves per second over the last batch.
    WorkerHeartbeat(f64),

    /// A completed measurement batch.
    Measurement(MeasurementStats),

    /// Copy of the packing taken between two moves.
    Snapshot(DiskSnapshot),

    /// Mean and spread of `D_avg` over all measurements.
    Summary(BatchSummary),

    /// The run stopped on an error; the configuration is no longer usable.
    Failed(String),

    /// Sampler has finished its run.
    Finished,
}

/// Commands from the main thread, honoured between moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverCommand {
    Pause,
    Resume,
    Stop,
}

pub mod pivot;
