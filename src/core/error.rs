use thiserror::Error;

/// Problems detected while building a configuration or validating parameters.
/// No partial `Configuration` is ever returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unsupported small-disk radius {0} (expected 0 < r <= 1)")]
    UnsupportedRadius(f64),

    #[error("domain size must be positive and finite, got {0}")]
    InvalidDomainSize(f64),

    #[error("packing density must be in (0, 1], got {0}")]
    InvalidDensity(f64),

    #[error(
        "cannot place {large} large and {small} small disks in a {domain}x{domain} box \
         ({needed:.3} rows of height needed)"
    )]
    PlacementInfeasible {
        large: usize,
        small: usize,
        domain: f64,
        needed: f64,
    },

    #[error("disks {a} and {b} overlap in the supplied positions")]
    PositionOverlap { a: usize, b: usize },

    #[error("expected {expected} positions, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("no disk eligible as a move seed")]
    NoEligibleSeed,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Broken invariants of the cell list or the cluster engine.
/// These never occur in a correct run; they carry the disk and cell involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("disk {index} not found in cell {cell:?}")]
    NotInCell { index: usize, cell: (usize, usize) },

    #[error("disk {index} already indexed in cell {cell:?}")]
    AlreadyIndexed { index: usize, cell: (usize, usize) },

    #[error("disk {index} reported as overlapping itself")]
    SelfOverlap { index: usize },

    #[error("seed disk {index} still present in cell {cell:?} during overlap scan")]
    SeedStillIndexed { index: usize, cell: (usize, usize) },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
}
