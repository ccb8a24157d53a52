use anyhow::Result;
use poi_sync::utils::validation::Validate;
use poi_sync::{SyncConfig, SyncError};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_config_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("poi-sync.toml");
    std::env::set_var("POI_SYNC_TEST_APP_TOKEN", "from-env");

    std::fs::write(
        &path,
        r#"
[viewport]
debounce_ms = 600
change_fraction = 0.2

[fetch]
timeout_ms = 3000
result_limit = 200

[sources.restroom]
endpoint = "https://data.example.org/resource/restrooms.json"
app_token = "${POI_SYNC_TEST_APP_TOKEN}"

[sources.restroom.headers]
Accept = "application/json"

[location]
default_latitude = 40.7061
default_longitude = -74.0087
"#,
    )?;

    let config = SyncConfig::from_file(&path)?;
    config.validate()?;

    assert_eq!(config.debounce(), Duration::from_millis(600));
    assert_eq!(config.fetch.result_limit, 200);
    assert_eq!(config.sources.restroom.app_token.as_deref(), Some("from-env"));
    assert_eq!(
        config.sources.restroom.headers.as_ref().and_then(|h| h.get("Accept")).map(String::as_str),
        Some("application/json")
    );
    // 未指定的區段使用預設值
    assert_eq!(config.sources.restaurant.filter.as_deref(), Some("grade = 'A'"));
    assert_eq!(config.declutter.max_markers, 100);
    assert_eq!(config.default_origin().latitude, 40.7061);
    Ok(())
}

#[test]
fn test_out_of_range_debounce_fails_validation() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("fast.toml");
    std::fs::write(&path, "[viewport]\ndebounce_ms = 100\n")?;

    let config = SyncConfig::from_file(&path)?;
    let err = config.validate().unwrap_err();

    assert!(matches!(
        err,
        SyncError::InvalidConfigValueError { ref field, .. } if field == "viewport.debounce_ms"
    ));
    assert!(!err.is_recoverable());
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();

    let err = SyncConfig::from_file(temp_dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, SyncError::Io(_)));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let err = SyncConfig::from_toml_str("[viewport\ndebounce_ms = ").unwrap_err();
    assert!(matches!(err, SyncError::ConfigError { .. }));
}
