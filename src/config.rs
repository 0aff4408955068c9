//! Configuration management for the resale price predictor

use crate::encoder::UnknownLabelPolicy;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "RESALE_CONFIG";

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub request_subject: String,
    /// Subject for replies to requests that carry no reply subject
    pub response_subject: String,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Path to the ONNX regression model
    pub model_path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Load the model at startup instead of on the first request
    #[serde(default)]
    pub preload: bool,
}

fn default_onnx_threads() -> usize {
    1
}

/// Categorical encoding configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EncodingConfig {
    /// Handling of labels missing from the encoding tables
    #[serde(default)]
    pub unknown_labels: UnknownLabelPolicy,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of requests processed concurrently
    pub workers: usize,
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between periodic metrics summaries (0 disables them)
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Load configuration from `$RESALE_CONFIG`, or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Config::builder()
            .add_source(File::from(path))
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "resale.predict".to_string(),
                response_subject: "resale.predictions".to_string(),
            },
            models: ModelsConfig {
                model_path: "models/resale_flat_prices.onnx".to_string(),
                onnx_threads: 1,
                preload: false,
            },
            encoding: EncodingConfig::default(),
            pipeline: PipelineConfig { workers: 4 },
            metrics: MetricsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("resale-config-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.nats.request_subject, "resale.predict");
        assert_eq!(config.models.onnx_threads, 1);
        assert!(!config.models.preload);
        assert_eq!(config.encoding.unknown_labels, UnknownLabelPolicy::Sentinel);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_shipped_config_matches_default() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = AppConfig::load_from_path(path).unwrap();
        let default = AppConfig::default();

        assert_eq!(config.nats.url, default.nats.url);
        assert_eq!(config.nats.response_subject, default.nats.response_subject);
        assert_eq!(config.models.model_path, default.models.model_path);
        assert_eq!(config.pipeline.workers, default.pipeline.workers);
        assert_eq!(config.metrics.report_interval_secs, default.metrics.report_interval_secs);
        assert_eq!(config.encoding.unknown_labels, default.encoding.unknown_labels);
    }

    #[test]
    fn test_optional_sections_default() {
        let path = write_temp(
            r#"
            [nats]
            url = "nats://nats:4222"
            request_subject = "predict"
            response_subject = "predictions"

            [models]
            model_path = "model.onnx"

            [pipeline]
            workers = 2

            [logging]
            level = "debug"
            "#,
        );
        let config = AppConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.models.onnx_threads, 1);
        assert_eq!(config.encoding.unknown_labels, UnknownLabelPolicy::Sentinel);
        assert_eq!(config.metrics.report_interval_secs, 60);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_reject_policy_from_file() {
        let path = write_temp(
            r#"
            [nats]
            url = "nats://nats:4222"
            request_subject = "predict"
            response_subject = "predictions"

            [models]
            model_path = "model.onnx"
            preload = true

            [encoding]
            unknown_labels = "reject"

            [pipeline]
            workers = 1

            [logging]
            level = "info"
            format = "json"
            "#,
        );
        let config = AppConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(config.models.preload);
        assert_eq!(config.encoding.unknown_labels, UnknownLabelPolicy::Reject);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(AppConfig::load_from_path("config/nope.toml").is_err());
    }
}
