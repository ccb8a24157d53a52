use crate::domain::model::Coordinate;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{
    validate_fraction, validate_non_empty_string, validate_positive_number, validate_range,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const RESTROOM_ENDPOINT: &str = "https://data.cityofnewyork.us/resource/i7jb-7jku.json";
pub const RESTAURANT_ENDPOINT: &str = "https://data.cityofnewyork.us/resource/43nn-pn8j.json";
pub const OSRM_ENDPOINT: &str = "https://router.project-osrm.org";

/// Times Square; used whenever geolocation is unavailable.
pub const DEFAULT_ORIGIN: Coordinate = Coordinate {
    latitude: 40.7580,
    longitude: -73.9855,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub viewport: ViewportConfig,
    pub fetch: FetchConfig,
    pub declutter: DeclutterConfig,
    pub sources: SourcesConfig,
    pub location: LocationConfig,
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub debounce_ms: u64,
    /// Fraction of a span an edge must move before a refetch.
    pub change_fraction: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 750,
            change_fraction: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub result_limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            result_limit: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclutterConfig {
    /// Minimum separation in degrees on both axes.
    pub min_delta: f64,
    pub max_markers: usize,
}

impl Default for DeclutterConfig {
    fn default() -> Self {
        Self {
            min_delta: 0.0005,
            max_markers: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub restroom: SourceConfig,
    pub restaurant: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            restroom: SourceConfig::new(RESTROOM_ENDPOINT),
            restaurant: SourceConfig {
                filter: Some("grade = 'A'".to_string()),
                ..SourceConfig::new(RESTAURANT_ENDPOINT)
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    /// Extra SoQL predicate ANDed with the bounding box.
    pub filter: Option<String>,
    /// Socrata app token, sent as `X-App-Token`.
    pub app_token: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

impl SourceConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub timeout_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            default_latitude: DEFAULT_ORIGIN.latitude,
            default_longitude: DEFAULT_ORIGIN.longitude,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub endpoint: String,
    pub profile: String,
    pub timeout_ms: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            endpoint: OSRM_ENDPOINT.to_string(),
            profile: "foot".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SOCRATA_APP_TOKEN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.viewport.debounce_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch.timeout_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location.timeout_ms)
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_millis(self.routing.timeout_ms)
    }

    pub fn default_origin(&self) -> Coordinate {
        Coordinate::new(self.location.default_latitude, self.location.default_longitude)
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        validate_range("viewport.debounce_ms", self.viewport.debounce_ms, 500, 1000)?;
        validate_fraction("viewport.change_fraction", self.viewport.change_fraction)?;

        validate_positive_number("fetch.timeout_ms", self.fetch.timeout_ms, 1)?;
        validate_positive_number("fetch.result_limit", self.fetch.result_limit, 1)?;

        validate_positive_number("declutter.min_delta", self.declutter.min_delta, 0.0)?;
        validate_positive_number("declutter.max_markers", self.declutter.max_markers, 1)?;

        validate_url("sources.restroom.endpoint", &self.sources.restroom.endpoint)?;
        validate_url("sources.restaurant.endpoint", &self.sources.restaurant.endpoint)?;

        validate_range("location.default_latitude", self.location.default_latitude, -90.0, 90.0)?;
        validate_range(
            "location.default_longitude",
            self.location.default_longitude,
            -180.0,
            180.0,
        )?;
        validate_positive_number("location.timeout_ms", self.location.timeout_ms, 1)?;

        validate_url("routing.endpoint", &self.routing.endpoint)?;
        validate_non_empty_string("routing.profile", &self.routing.profile)?;
        validate_positive_number("routing.timeout_ms", self.routing.timeout_ms, 1)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(750));
        assert_eq!(config.sources.restaurant.filter.as_deref(), Some("grade = 'A'"));
        assert_eq!(config.default_origin(), DEFAULT_ORIGIN);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SyncConfig::from_toml_str(
            r#"
[viewport]
debounce_ms = 600

[declutter]
max_markers = 50
"#,
        )
        .unwrap();

        assert_eq!(config.viewport.debounce_ms, 600);
        assert_eq!(config.viewport.change_fraction, 0.1);
        assert_eq!(config.declutter.max_markers, 50);
        assert_eq!(config.sources.restroom.endpoint, RESTROOM_ENDPOINT);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("POI_SYNC_TEST_TOKEN", "secret-token");
        let config = SyncConfig::from_toml_str(
            r#"
[sources.restroom]
endpoint = "https://example.com/restrooms.json"
app_token = "${POI_SYNC_TEST_TOKEN}"
"#,
        )
        .unwrap();

        assert_eq!(config.sources.restroom.app_token.as_deref(), Some("secret-token"));
        assert_eq!(config.sources.restaurant.endpoint, RESTAURANT_ENDPOINT);
    }

    #[test]
    fn test_unset_env_var_is_left_verbatim() {
        let config = SyncConfig::from_toml_str(
            r#"
[routing]
profile = "${POI_SYNC_SURELY_UNSET_VAR}"
"#,
        )
        .unwrap();
        assert_eq!(config.routing.profile, "${POI_SYNC_SURELY_UNSET_VAR}");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = SyncConfig::default();
        config.viewport.debounce_ms = 100;
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidConfigValueError { ref field, .. }) if field == "viewport.debounce_ms"
        ));

        let mut config = SyncConfig::default();
        config.sources.restaurant.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = SyncConfig::default();
        config.viewport.change_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let config = SyncConfig::from_toml_str("[declutter]\nmin_delta = nan\n").unwrap();
        assert!(config.declutter.min_delta.is_nan());
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidConfigValueError { ref field, .. }) if field == "declutter.min_delta"
        ));

        let config = SyncConfig::from_toml_str("[location]\ndefault_latitude = nan\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidConfigValueError { ref field, .. }) if field == "location.default_latitude"
        ));
    }

    #[test]
    fn test_empty_endpoint_is_missing_setting() {
        let mut config = SyncConfig::default();
        config.routing.endpoint = String::new();
        assert!(matches!(
            config.validate(),
            Err(SyncError::MissingConfigError { ref field }) if field == "routing.endpoint"
        ));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = SyncConfig::from_toml_str("[viewport\ndebounce_ms = ").unwrap_err();
        assert!(matches!(err, SyncError::ConfigError { .. }));
    }
}
