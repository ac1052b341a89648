// Environment-driven configuration
// Env vars are process-global, so every test here runs serially

use anomaly_correlation_service::analysis::LabelSet;
use anomaly_correlation_service::config::{Config, ConfigError, DEFAULT_SHEET_NAME};
use serial_test::serial;
use std::env;

const VARS: [&str; 7] = [
    "SERVER_HOST",
    "SERVER_PORT",
    "WORKBOOK_SHEET",
    "ANALYSIS_CACHE_CAPACITY",
    "MAX_UPLOAD_BYTES",
    "PROVINCE_COORDINATES_PATH",
    "METRIC_LABELS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_env() {
    clear_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config.server_addr(), "0.0.0.0:8080");
    assert_eq!(config.sheet_name, DEFAULT_SHEET_NAME);
    assert_eq!(config.cache_capacity.get(), 8);
    assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    assert_eq!(config.coordinates_path, None);
    assert_eq!(config.label_set, LabelSet::Anomaly);
}

#[test]
#[serial]
fn test_values_from_env() {
    clear_env();
    env::set_var("SERVER_HOST", "127.0.0.1");
    env::set_var("SERVER_PORT", "9090");
    env::set_var("WORKBOOK_SHEET", "Rekap");
    env::set_var("ANALYSIS_CACHE_CAPACITY", "2");
    env::set_var("MAX_UPLOAD_BYTES", "1048576");
    env::set_var("PROVINCE_COORDINATES_PATH", "/etc/provinces.json");
    env::set_var("METRIC_LABELS", "enso");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.server_addr(), "127.0.0.1:9090");
    assert_eq!(config.sheet_name, "Rekap");
    assert_eq!(config.cache_capacity.get(), 2);
    assert_eq!(config.max_upload_bytes, 1_048_576);
    assert_eq!(config.coordinates_path.as_deref(), Some("/etc/provinces.json"));
    assert_eq!(config.label_set, LabelSet::Enso);
}

#[test]
#[serial]
fn test_unparseable_numbers_fall_back_to_defaults() {
    clear_env();
    env::set_var("SERVER_PORT", "not-a-port");
    env::set_var("ANALYSIS_CACHE_CAPACITY", "0");
    env::set_var("WORKBOOK_SHEET", "   ");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.server_port, 8080);
    assert_eq!(config.cache_capacity.get(), 8);
    assert_eq!(config.sheet_name, DEFAULT_SHEET_NAME);
}

#[test]
#[serial]
fn test_unknown_label_set_is_rejected() {
    clear_env();
    env::set_var("METRIC_LABELS", "celsius");

    let result = Config::from_env();
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidLabelSet(_))));
}
