use binary_pivot::core::configuration::Configuration;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A dilute mixture small enough for exhaustive overlap checks.
pub fn small_mixture() -> Configuration {
    Configuration::from_density(10, 200, 0.2, 0.3).unwrap()
}

/// Checks the invariants every move must preserve.
pub fn assert_valid(cfg: &Configuration) {
    cfg.verify_index().unwrap();
    assert_eq!(cfg.find_overlapping_pair(), None, "disks overlap");
    assert_eq!(cfg.cell_list().len(), cfg.len());
    for (i, p) in cfg.positions().iter().enumerate() {
        let l = cfg.domain_size();
        assert!(p.x >= 0.0 && p.x < l && p.y >= 0.0 && p.y < l, "disk {i} outside box: {p:?}");
    }
}
