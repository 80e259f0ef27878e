use serde::{Deserialize, Serialize};

/// Default cap on delta links followed to reach a base object.
pub const DEFAULT_MAX_DELTA_DEPTH: usize = 50;

/// Configuration for reading packs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Maximum number of delta links between a requested object and its
    /// non-delta base, counted across packs.
    pub max_delta_depth: usize,
    /// Recompute index and pack trailer checksums when a pack is opened.
    pub verify_checksums: bool,
    /// Check each requested entry's CRC32 against the index.
    pub verify_crc: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            max_delta_depth: DEFAULT_MAX_DELTA_DEPTH,
            verify_checksums: false,
            verify_crc: false,
        }
    }
}

impl PackConfig {
    /// Every check enabled; for fsck-style reads.
    pub fn strict() -> Self {
        Self {
            verify_checksums: true,
            verify_crc: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = PackConfig::default();
        assert_eq!(c.max_delta_depth, 50);
        assert!(!c.verify_checksums);
        assert!(!c.verify_crc);
    }

    #[test]
    fn strict_enables_checks() {
        let c = PackConfig::strict();
        assert!(c.verify_checksums && c.verify_crc);
        assert_eq!(c.max_delta_depth, DEFAULT_MAX_DELTA_DEPTH);
    }
}
