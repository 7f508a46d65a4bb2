//! Integration tests for configuration loading and context wiring

use camino::Utf8PathBuf;
use reactive_query::config::CONFIG_FILE_NAME;
use reactive_query::{AdapterConfig, ConfigManager, QueryContext};
use std::fs;
use tempfile::TempDir;

fn manager_in(temp_dir: &TempDir) -> ConfigManager {
    let dir = Utf8PathBuf::try_from(temp_dir.path().join("config")).unwrap();
    ConfigManager::new(&dir)
        .unwrap()
        .with_env_prefix("REACTIVE_QUERY_INTEGRATION_TEST")
}

#[test]
fn test_config_directory_created() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    assert!(manager.config_dir().is_dir());
    assert_eq!(manager.config_path().file_name(), Some(CONFIG_FILE_NAME));
}

#[test]
fn test_yaml_file_round_trips_through_context() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    fs::write(
        manager.config_path(),
        "default_client_key: admin\nchange_buffer: 12\nlogging:\n  log_prefix: app\n",
    )
    .unwrap();

    let config = manager.load().unwrap();
    assert_eq!(config.default_client_key.as_deref(), Some("admin"));
    assert_eq!(config.logging.log_prefix, "app");
    assert_eq!(config.logging.log_dir, "logs");

    let context = QueryContext::from_config(&config);
    assert_eq!(context.change_buffer(), 12);
    assert!(context.resolve(None).is_err());
}

#[test]
fn test_saved_defaults_reload_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    manager.save(&AdapterConfig::default()).unwrap();
    let contents = fs::read_to_string(manager.config_path()).unwrap();

    assert!(contents.contains("change_buffer: 100"));
    assert_eq!(manager.load().unwrap(), AdapterConfig::default());
}
