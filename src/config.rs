//! Expander configuration
//!
//! ```toml
//! sentinel_prefix = "completed_"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Tunables for [`ResourceGraphExpander`](crate::expander::ResourceGraphExpander)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpanderConfig {
    /// Prefix of sentinel names; the generating resource's title follows it
    pub sentinel_prefix: String,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            sentinel_prefix: "completed_".to_string(),
        }
    }
}

impl ExpanderConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Loaded expander config from {}", path.display());
        Ok(config)
    }

    /// Name of the sentinel closing over `title`'s generated resources
    pub fn sentinel_name(&self, title: &str) -> String {
        format!("{}{title}", self.sentinel_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ExpanderConfig::default();
        assert_eq!(config.sentinel_name("/tmp"), "completed_/tmp");
        assert_eq!(ExpanderConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_partial_override() {
        let config = ExpanderConfig::from_toml_str("sentinel_prefix = \"done_\"").unwrap();
        assert_eq!(config.sentinel_name("x"), "done_x");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ExpanderConfig::from_toml_str("sentinel = \"x\"").is_err());
        assert!(ExpanderConfig::from_toml_str("preserve_declared_order = false").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sentinel_prefix = \"finished_\"").unwrap();

        let config = ExpanderConfig::load(file.path()).unwrap();
        assert_eq!(config.sentinel_prefix, "finished_");
        assert_eq!(config.sentinel_name("/srv"), "finished_/srv");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("graft.toml");
        assert!(matches!(
            ExpanderConfig::load(&missing),
            Err(Error::ConfigNotFound(_))
        ));

        fs::write(&missing, "sentinel_prefix = 3").unwrap();
        assert!(matches!(
            ExpanderConfig::load(&missing),
            Err(Error::ConfigParse { .. })
        ));
    }
}
