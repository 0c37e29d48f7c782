//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::TelemetryConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<TelemetryConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: TelemetryConfig = toml::from_str(&content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Semantic validation on top of what serde already enforces.
pub fn validate_config(config: &TelemetryConfig) -> Result<(), ConfigError> {
    if config.app_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "app_name must not be empty".to_string(),
        ));
    }
    if config.log_to_file {
        if config.log_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "log_dir must not be empty when log_to_file is enabled".to_string(),
            ));
        }
        if config.rotation.max_size_mb == 0 {
            return Err(ConfigError::Validation(
                "rotation.max_size_mb must be at least 1".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&TelemetryConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_app_name_rejected() {
        let mut config = TelemetryConfig::default();
        config.app_name = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_rotation_threshold_rejected() {
        let mut config = TelemetryConfig::default();
        config.rotation.max_size_mb = 0;
        assert!(validate_config(&config).is_err());

        // Irrelevant once the file sink is off.
        config.log_to_file = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_config_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "telemetry-pipeline-config-{}.toml",
            std::process::id()
        ));
        fs::write(
            &path,
            "app_name = \"auth-api\"\nlog_to_console = false\n\n[rotation]\nmax_size_mb = 25\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.app_name, "auth-api");
        assert!(!config.log_to_console);
        assert_eq!(config.rotation.max_size_mb, 25);
        assert_eq!(config.rotation.max_backups, 3);

        fs::remove_file(&path).unwrap_or_default();
    }
}
