use std::path::Path;

use odb_pack::PackConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OdbError, OdbResult};

/// zlib level git uses for loose objects.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Object store configuration.
///
/// Every field has a default, so a TOML file only names what it changes:
///
/// ```toml
/// compression_level = 9
///
/// [pack]
/// max_delta_depth = 20
/// verify_crc = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// zlib level (0-9) for newly written loose objects.
    pub compression_level: u32,
    /// Pack reading limits and checks.
    pub pack: PackConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            pack: PackConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(content: &str) -> OdbResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| OdbError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> OdbResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded store config");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> OdbResult<String> {
        toml::to_string_pretty(self).map_err(|e| OdbError::Config(e.to_string()))
    }

    pub fn validate(&self) -> OdbResult<()> {
        if self.compression_level > 9 {
            return Err(OdbError::Config(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.pack.max_delta_depth, 50);
        assert!(!config.pack.verify_crc);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StoreConfig::from_toml_str("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn partial_toml() {
        let config = StoreConfig::from_toml_str(
            "compression_level = 1\n\n[pack]\nmax_delta_depth = 8\nverify_checksums = true\n",
        )
        .unwrap();
        assert_eq!(config.compression_level, 1);
        assert_eq!(config.pack.max_delta_depth, 8);
        assert!(config.pack.verify_checksums);
        assert!(!config.pack.verify_crc);
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = StoreConfig::default();
        config.pack.verify_crc = true;
        let text = config.to_toml_string().unwrap();
        assert_eq!(StoreConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            StoreConfig::from_toml_str("compression_level = 12"),
            Err(OdbError::Config(_))
        ));
        assert!(matches!(
            StoreConfig::from_toml_str("compression_level = \"fast\""),
            Err(OdbError::Config(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odb.toml");
        std::fs::write(&path, "[pack]\nverify_crc = true\n").unwrap();
        assert!(StoreConfig::load(&path).unwrap().pack.verify_crc);
        assert!(matches!(
            StoreConfig::load(&dir.path().join("missing.toml")),
            Err(OdbError::Io(_))
        ));
    }
}
