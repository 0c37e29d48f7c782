//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log identity of the emitting service.
    pub app_name: String,

    /// Host name stamped on every artifact. When unset, `$HOSTNAME` is
    /// consulted, then `"localhost"`.
    pub host: Option<String>,

    /// Optional process/worker tag (e.g. a PM instance id).
    pub instance_id: Option<String>,

    /// Include original, uncensored payloads in emitted events.
    pub raw_data_capture: bool,

    /// Emit artifacts to stdout, one JSON object per line.
    pub log_to_console: bool,

    /// Emit artifacts to the rotating log file.
    pub log_to_file: bool,

    /// Directory for the detail log files.
    pub log_dir: String,

    /// File rotation policy.
    pub rotation: RotationConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            app_name: "telemetry-pipeline".to_string(),
            host: None,
            instance_id: None,
            raw_data_capture: true,
            log_to_console: true,
            log_to_file: true,
            log_dir: "./log/detail".to_string(),
            rotation: RotationConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Resolved host name: explicit config, else `$HOSTNAME`, else
    /// `"localhost"`.
    pub fn hostname(&self) -> String {
        self.host
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Resolved instance tag: explicit config, else `$INSTANCE_ID`.
    pub fn instance(&self) -> Option<String> {
        self.instance_id
            .clone()
            .or_else(|| std::env::var("INSTANCE_ID").ok().filter(|i| !i.is_empty()))
    }
}

/// Rotation policy for the file sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Size threshold in megabytes that triggers rotation.
    pub max_size_mb: u64,

    /// Number of rotated segments to retain.
    pub max_backups: usize,

    /// Maximum age in days before a rotated segment is removed.
    pub max_age_days: u64,

    /// Gzip-compress rotated segments.
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 500,
            max_backups: 3,
            max_age_days: 1,
            compress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.app_name, "telemetry-pipeline");
        assert!(config.raw_data_capture);
        assert!(config.log_to_console);
        assert!(config.log_to_file);
        assert_eq!(config.log_dir, "./log/detail");
        assert_eq!(config.rotation.max_size_mb, 500);
        assert_eq!(config.rotation.max_backups, 3);
        assert_eq!(config.rotation.max_age_days, 1);
        assert!(config.rotation.compress);
    }

    #[test]
    fn test_explicit_host_wins_over_environment() {
        let mut config = TelemetryConfig::default();
        config.host = Some("edge-7".to_string());
        assert_eq!(config.hostname(), "edge-7");
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config: TelemetryConfig = toml::from_str("app_name = \"auth-api\"").unwrap();
        assert_eq!(config.app_name, "auth-api");
        assert!(config.raw_data_capture);
        assert_eq!(config.rotation.max_backups, 3);
    }
}
