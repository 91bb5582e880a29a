use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::metrics::BatchSummary;
use crate::core::configuration::DiskSnapshot;
use crate::core::domain::SimulationParams;
use crate::solvers::MeasurementStats;

/// One line of `measurements.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRow {
    pub measurement: usize,
    pub moves: u64,
    pub d_avg: Option<f64>,
    pub mean_cluster_size: f64,
    pub elapsed_s: f64,
    pub timestamp: String,
}

impl MeasurementRow {
    fn from_stats(stats: &MeasurementStats) -> Self {
        Self {
            measurement: stats.measurement,
            moves: stats.total_moves,
            d_avg: stats.d_avg,
            mean_cluster_size: stats.mean_cluster_size,
            elapsed_s: stats.elapsed_s,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Writes a run's artifacts under `<root>/<run_id>/`:
/// `params.json`, `measurements.csv`, `snapshot_<k>.json` and `summary.json`.
pub struct ResultsWriter {
    run_id: Uuid,
    dir: PathBuf,
    csv: csv::Writer<File>,
}

impl ResultsWriter {
    pub fn create(root: &Path, params: &SimulationParams) -> Result<Self> {
        let run_id = Uuid::new_v4();
        let dir = root.join(run_id.to_string());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create results directory {}", dir.display()))?;

        let params_path = dir.join("params.json");
        let file = File::create(&params_path)
            .with_context(|| format!("Failed to create {}", params_path.display()))?;
        serde_json::to_writer_pretty(file, params).context("Failed to write params.json")?;

        let csv_path = dir.join("measurements.csv");
        let csv = csv::Writer::from_path(&csv_path)
            .with_context(|| format!("Failed to create {}", csv_path.display()))?;

        info!("writing results to {}", dir.display());
        Ok(Self { run_id, dir, csv })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_measurement(&mut self, stats: &MeasurementStats) -> Result<()> {
        self.csv
            .serialize(MeasurementRow::from_stats(stats))
            .context("Failed to append measurement row")?;
        self.csv.flush().context("Failed to flush measurements.csv")?;
        Ok(())
    }

    pub fn write_snapshot(&self, measurement: usize, snapshot: &DiskSnapshot) -> Result<PathBuf> {
        let path = self.dir.join(format!("snapshot_{measurement}.json"));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer(file, snapshot)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_summary(&self, summary: &BatchSummary) -> Result<()> {
        let path = self.dir.join("summary.json");
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, summary).context("Failed to write summary.json")?;
        Ok(())
    }
}

/// Reads a snapshot written by [`ResultsWriter::write_snapshot`].
pub fn load_snapshot(path: &Path) -> Result<DiskSnapshot> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("Failed to parse {}", path.display()))
}
