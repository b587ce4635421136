//! rota.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Tuning knobs for the scheduling engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days after a placement ends during which an adjustment may still
    /// target it as "effectively current".
    #[serde(default = "default_grace_window")]
    pub grace_window_days: u32,
    /// Reference timezone as a whole-hour UTC offset.
    #[serde(default)]
    pub utc_offset_hours: i32,
    /// How many times a conflicted commit is re-planned before giving up.
    #[serde(default = "default_commit_retries")]
    pub commit_retries: u32,
}

fn default_grace_window() -> u32 {
    7
}

fn default_commit_retries() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_window_days: default_grace_window(),
            utc_offset_hours: 0,
            commit_retries: default_commit_retries(),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.utc_offset_hours.abs() > 23 {
            return Err(EngineError::Config(format!(
                "utc_offset_hours must be within -23..=23, got {}",
                self.utc_offset_hours
            )));
        }
        if self.commit_retries == 0 {
            return Err(EngineError::Config(
                "commit_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level rota.toml: where the ledger lives plus engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotaConfig {
    /// Path of the redb ledger file.
    pub data_path: PathBuf,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RotaConfig {
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("read {}: {e}", path.display())))?;
        let config: RotaConfig = toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("parse {}: {e}", path.display())))?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> EngineResult<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Scaffold a default rota.toml pointing at the given ledger path.
    pub fn scaffold(data_path: &Path) -> Self {
        Self {
            data_path: data_path.to_path_buf(),
            engine: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_round_trips() {
        let config = RotaConfig::scaffold(Path::new("rota.redb"));
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("rota.redb"));
        assert!(toml_str.contains("grace_window_days"));

        let parsed: RotaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.grace_window_days, 7);
        assert_eq!(parsed.engine.commit_retries, 3);
    }

    #[test]
    fn parse_minimal_applies_defaults() {
        let toml_str = r#"data_path = "ledger.redb""#;
        let config: RotaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data_path, PathBuf::from("ledger.redb"));
        assert_eq!(config.engine.grace_window_days, 7);
        assert_eq!(config.engine.utc_offset_hours, 0);
    }

    #[test]
    fn parse_overrides() {
        let toml_str = r#"
data_path = "ledger.redb"

[engine]
grace_window_days = 3
utc_offset_hours = 5
"#;
        let config: RotaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.grace_window_days, 3);
        assert_eq!(config.engine.utc_offset_hours, 5);
    }

    #[test]
    fn validate_rejects_bad_offset() {
        let config = EngineConfig {
            utc_offset_hours: 26,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retries() {
        let config = EngineConfig {
            commit_retries: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rota.toml");
        std::fs::write(&path, "data_path = \"rota.redb\"\n").unwrap();

        let config = RotaConfig::from_file(&path).unwrap();
        assert_eq!(config.data_path, PathBuf::from("rota.redb"));

        assert!(RotaConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
