use std::collections::VecDeque;
use std::time::Instant;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::analysis::metrics::BatchSummary;
use crate::core::configuration::DiskSnapshot;
use crate::core::domain::SimulationParams;
use crate::solvers::{MeasurementStats, SolverCommand, SolverEvent};

// --- Constants ---
const HISTORY_CAPACITY: usize = 1000;
const LOG_CAPACITY: usize = 200;
const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 8.0;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Dashboard,
    Parameters,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Starting,
    Running,
    Paused,
    Finished,
    Error,
}

// --- Telemetry & Analytics ---

#[derive(Debug, Clone)]
pub struct Telemetry {
    // History Queues for Sparklines
    pub d_avg_history: VecDeque<(f64, f64)>,        // (Measurement, D_avg)
    pub cluster_size_history: VecDeque<(f64, f64)>, // (Measurement, mean cluster size)

    // Global Bounds for Chart Scaling
    pub min_d_avg: f64,
    pub max_d_avg: f64,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            d_avg_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            cluster_size_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            min_d_avg: f64::MAX,
            max_d_avg: f64::MIN,
        }
    }

    pub fn ingest(&mut self, stats: &MeasurementStats) {
        if self.d_avg_history.len() >= HISTORY_CAPACITY {
            self.d_avg_history.pop_front();
        }
        if self.cluster_size_history.len() >= HISTORY_CAPACITY {
            self.cluster_size_history.pop_front();
        }

        let x = stats.measurement as f64;
        if let Some(d) = stats.d_avg {
            if d < self.min_d_avg { self.min_d_avg = d; }
            if d > self.max_d_avg { self.max_d_avg = d; }
            self.d_avg_history.push_back((x, d));
        }
        self.cluster_size_history.push_back((x, stats.mean_cluster_size));
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// View settings for the packing canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    /// Draw the periodic copies of disks that straddle an edge.
    pub show_images: bool,
}

impl Viewport {
    pub fn new() -> Self {
        Self { zoom: 1.0, show_images: true }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.25).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.25).max(ZOOM_MIN);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

// --- The Master State ---

pub struct AppState {
    // System
    pub should_quit: bool,
    pub mode: AppMode,
    pub params: SimulationParams,

    // Worker
    pub rx: Option<Receiver<SolverEvent>>,
    control: Option<Sender<SolverCommand>>,
    pub worker_status: WorkerStatus,

    // Simulation Data
    pub start_time: Instant,
    pub snapshot: Option<DiskSnapshot>,
    pub last_measurement: Option<MeasurementStats>,
    pub summary: Option<BatchSummary>,

    // Analytics
    pub telemetry: Telemetry,
    pub logs: VecDeque<String>,

    // UI Elements
    pub viewport: Viewport,

    // Performance Metrics
    pub moves_per_second: f64,
}

impl AppState {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            should_quit: false,
            mode: AppMode::Dashboard,
            params,
            rx: None,
            control: None,
            worker_status: WorkerStatus::Idle,
            start_time: Instant::now(),
            snapshot: None,
            last_measurement: None,
            summary: None,
            telemetry: Telemetry::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            viewport: Viewport::new(),
            moves_per_second: 0.0,
        }
    }

    pub fn set_channel(&mut self, rx: Receiver<SolverEvent>, control: Sender<SolverCommand>) {
        self.rx = Some(rx);
        self.control = Some(control);
        self.worker_status = WorkerStatus::Starting;
        self.start_time = Instant::now();
    }

    pub fn tick(&mut self) {
        if let Some(rx) = self.rx.clone() {
            for _ in 0..100 {
                match rx.try_recv() {
                    Ok(evt) => self.handle_event(evt),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if self.worker_status != WorkerStatus::Error {
                            self.worker_status = WorkerStatus::Finished;
                        }
                        self.log("Worker disconnected.");
                        self.rx = None;
                        break;
                    }
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: SolverEvent) {
        match event {
            SolverEvent::Log(msg) => self.log(msg),

            SolverEvent::WorkerHeartbeat(rate) => {
                self.mark_running();
                if rate > 0.0 { self.moves_per_second = rate; }
            },

            SolverEvent::Measurement(stats) => {
                self.mark_running();
                self.telemetry.ingest(&stats);
                self.last_measurement = Some(stats);
            },

            SolverEvent::Snapshot(snapshot) => {
                self.mark_running();
                self.snapshot = Some(snapshot);
            },

            SolverEvent::Summary(summary) => {
                self.summary = Some(summary);
            },

            SolverEvent::Failed(msg) => {
                self.worker_status = WorkerStatus::Error;
                self.log(format!("Error: {}", msg));
            },

            SolverEvent::Finished => {
                if self.worker_status != WorkerStatus::Error {
                    self.worker_status = WorkerStatus::Finished;
                }
                self.log("Sampler finished.");
            }
        }
    }

    fn mark_running(&mut self) {
        if self.worker_status == WorkerStatus::Starting {
            self.worker_status = WorkerStatus::Running;
        }
    }

    /// Logs a message to the internal buffer.
    fn log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    // --- Input Handling ---

    pub fn on_key(&mut self, key: char) {
        match key {
            'q' => self.quit(),
            '1' => self.mode = AppMode::Dashboard,
            '2' => self.mode = AppMode::Parameters,
            '3' => self.mode = AppMode::Viewer,
            ' ' => self.toggle_pause(),
            '+' | '=' => self.viewport.zoom_in(),
            '-' => self.viewport.zoom_out(),
            'i' => self.viewport.show_images = !self.viewport.show_images,
            'r' => self.viewport = Viewport::new(),
            _ => {}
        }
    }

    /// Asks the worker to stop at the next move boundary and leaves the UI loop.
    pub fn quit(&mut self) {
        self.send_command(SolverCommand::Stop);
        self.should_quit = true;
    }

    pub fn toggle_pause(&mut self) {
        match self.worker_status {
            WorkerStatus::Running | WorkerStatus::Starting => {
                self.send_command(SolverCommand::Pause);
                self.worker_status = WorkerStatus::Paused;
            },
            WorkerStatus::Paused => {
                self.send_command(SolverCommand::Resume);
                self.worker_status = WorkerStatus::Running;
            },
            _ => {}
        }
    }

    fn send_command(&mut self, cmd: SolverCommand) {
        if let Some(tx) = &self.control {
            if tx.send(cmd).is_err() {
                // Worker already gone
                self.control = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn stats(m: usize, d: f64) -> MeasurementStats {
        MeasurementStats {
            measurement: m,
            total_moves: (m as u64 + 1) * 10,
            d_avg: Some(d),
            mean_cluster_size: 2.0,
            largest_cluster: 5,
            elapsed_s: 0.1,
        }
    }

    #[test]
    fn events_update_state() {
        let (tx, rx) = unbounded();
        let (ctl_tx, _ctl_rx) = unbounded();
        let mut app = AppState::new(SimulationParams::default());
        app.set_channel(rx, ctl_tx);

        tx.send(SolverEvent::Measurement(stats(0, 6.0))).unwrap();
        tx.send(SolverEvent::Measurement(stats(1, 7.5))).unwrap();
        tx.send(SolverEvent::Finished).unwrap();
        app.tick();

        assert_eq!(app.telemetry.d_avg_history.len(), 2);
        assert_eq!(app.telemetry.min_d_avg, 6.0);
        assert_eq!(app.telemetry.max_d_avg, 7.5);
        assert_eq!(app.worker_status, WorkerStatus::Finished);
        assert_eq!(app.last_measurement.as_ref().map(|s| s.measurement), Some(1));
    }

    #[test]
    fn failure_is_sticky() {
        let mut app = AppState::new(SimulationParams::default());
        app.handle_event(SolverEvent::Failed("disk 3 not found in cell (1, 2)".into()));
        app.handle_event(SolverEvent::Finished);
        assert_eq!(app.worker_status, WorkerStatus::Error);
        assert!(app.logs.iter().any(|l| l.contains("disk 3")));
    }

    #[test]
    fn pause_and_quit_reach_the_worker() {
        let (_tx, rx) = unbounded();
        let (ctl_tx, ctl_rx) = unbounded();
        let mut app = AppState::new(SimulationParams::default());
        app.set_channel(rx, ctl_tx);
        app.worker_status = WorkerStatus::Running;

        app.on_key(' ');
        assert_eq!(app.worker_status, WorkerStatus::Paused);
        app.on_key(' ');
        app.on_key('q');
        assert!(app.should_quit);

        let sent: Vec<_> = ctl_rx.try_iter().collect();
        assert_eq!(sent, vec![SolverCommand::Pause, SolverCommand::Resume, SolverCommand::Stop]);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut v = Viewport::new();
        for _ in 0..50 { v.zoom_in(); }
        assert_eq!(v.zoom, ZOOM_MAX);
        for _ in 0..50 { v.zoom_out(); }
        assert_eq!(v.zoom, ZOOM_MIN);
    }
}
