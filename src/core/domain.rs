use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

// --- Constants ---

/// Radius of every large disk. Lengths in the model are measured in units of it.
pub const LARGE_RADIUS: f64 = 1.0;

/// Slack used when checking contact distances for the no-overlap invariant.
pub const OVERLAP_TOLERANCE: f64 = 1e-9;

// --- Physics Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiskKind {
    Large,
    Small,
}

/// How the seed disk of a cluster move is chosen. The pivot is always uniform
/// over the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovePolicy {
    /// Seed uniform over all `N + n` disks.
    RandomDisk,
    /// Seed uniform over the `N` large disks only.
    LargeDisk,
}

impl TryFrom<&str> for MovePolicy {
    type Error = ConfigError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "random" | "random-disk" | "any" => Ok(Self::RandomDisk),
            "large" | "large-disk" | "big" => Ok(Self::LargeDisk),
            _ => Err(ConfigError::InvalidParameter {
                name: "policy",
                reason: format!("unknown move policy '{s}', expected 'random' or 'large'"),
            }),
        }
    }
}

// --- Configuration Types ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationParams {
    // Packing
    pub large_count: usize,
    pub small_count: usize,
    pub small_radius: f64,
    /// Target packing fraction; used to derive the box when `domain_size` is unset.
    pub density: f64,
    /// Explicit box side. Takes precedence over `density`.
    pub domain_size: Option<f64>,

    // Sampling
    pub policy: MovePolicy,
    pub seed: u64,
    pub warmup_moves: usize,
    pub moves_per_measurement: usize,
    pub measurements: usize,

    // Neighbour scan tuning
    pub ring_margin: usize,

    // Output
    pub output_dir: Option<PathBuf>,
    /// Write a JSON snapshot every k-th measurement (0 disables).
    pub snapshot_every: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            large_count: 20,
            small_count: 700,
            small_radius: 0.1,
            density: 0.26,
            domain_size: None,
            policy: MovePolicy::RandomDisk,
            seed: 0,
            warmup_moves: 500,
            moves_per_measurement: 500,
            measurements: 10,
            ring_margin: 1,
            output_dir: None,
            snapshot_every: 0,
        }
    }
}

impl SimulationParams {
    /// Rejects values the sampler cannot run with. Placement feasibility is
    /// only known once the configuration is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.small_radius > 0.0 && self.small_radius <= LARGE_RADIUS) {
            return Err(ConfigError::UnsupportedRadius(self.small_radius));
        }
        match self.domain_size {
            Some(l) if !(l.is_finite() && l > 0.0) => {
                return Err(ConfigError::InvalidDomainSize(l));
            }
            Some(_) => {}
            None => {
                if !(self.density > 0.0 && self.density <= 1.0) {
                    return Err(ConfigError::InvalidDensity(self.density));
                }
            }
        }
        if self.large_count + self.small_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "large_count",
                reason: "at least one disk is required".to_string(),
            });
        }
        if self.policy == MovePolicy::LargeDisk && self.large_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "policy",
                reason: "large-disk moves need at least one large disk".to_string(),
            });
        }
        if self.measurements > 0 && self.moves_per_measurement == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "moves_per_measurement",
                reason: "must be >= 1 when measurements are requested".to_string(),
            });
        }
        Ok(())
    }

    pub fn total_disks(&self) -> usize {
        self.large_count + self.small_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimulationParams::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_radius_and_density() {
        let p = SimulationParams { small_radius: 1.5, ..Default::default() };
        assert_eq!(p.validate(), Err(ConfigError::UnsupportedRadius(1.5)));

        let p = SimulationParams { density: 0.0, ..Default::default() };
        assert_eq!(p.validate(), Err(ConfigError::InvalidDensity(0.0)));

        // Density is ignored once the box is explicit
        let p = SimulationParams { density: 0.0, domain_size: Some(20.0), ..Default::default() };
        assert_eq!(p.validate(), Ok(()));

        let p = SimulationParams { domain_size: Some(-1.0), ..Default::default() };
        assert_eq!(p.validate(), Err(ConfigError::InvalidDomainSize(-1.0)));
    }

    #[test]
    fn large_policy_needs_large_disks() {
        let p = SimulationParams {
            large_count: 0,
            policy: MovePolicy::LargeDisk,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidParameter { name: "policy", .. })));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(MovePolicy::try_from("Large"), Ok(MovePolicy::LargeDisk));
        assert_eq!(MovePolicy::try_from("random"), Ok(MovePolicy::RandomDisk));
        assert!(MovePolicy::try_from("wolff").is_err());
    }

    #[test]
    fn params_load_from_partial_json() {
        let json = r#"{ "large_count": 4, "small_count": 10, "policy": "LargeDisk" }"#;
        let p: SimulationParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.large_count, 4);
        assert_eq!(p.policy, MovePolicy::LargeDisk);
        assert_eq!(p.small_radius, SimulationParams::default().small_radius);
    }
}
