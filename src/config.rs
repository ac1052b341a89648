use std::env;
use std::num::NonZeroUsize;

use crate::analysis::LabelSet;

pub const DEFAULT_SHEET_NAME: &str = "Gabung";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid METRIC_LABELS: {0}")]
    InvalidLabelSet(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub sheet_name: String,
    pub cache_capacity: NonZeroUsize,
    pub max_upload_bytes: usize,
    pub coordinates_path: Option<String>,
    pub label_set: LabelSet,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            cache_capacity: NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN),
            max_upload_bytes: 20 * 1024 * 1024,
            coordinates_path: None,
            label_set: LabelSet::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let label_set = match env::var("METRIC_LABELS") {
            Ok(value) => value.parse().map_err(ConfigError::InvalidLabelSet)?,
            Err(_) => defaults.label_set,
        };

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            sheet_name: env::var("WORKBOOK_SHEET")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.sheet_name),
            cache_capacity: env::var("ANALYSIS_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            coordinates_path: env::var("PROVINCE_COORDINATES_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            label_set,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
