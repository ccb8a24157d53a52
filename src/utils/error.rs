use crate::domain::model::PoiCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{category} fetch timed out after {timeout_ms}ms")]
    FetchTimeout {
        category: PoiCategory,
        timeout_ms: u64,
    },

    #[error("{category} fetch failed: {details}")]
    FetchFailure {
        category: PoiCategory,
        details: String,
    },

    #[error("Geolocation unavailable: {reason}")]
    GeolocationUnavailable { reason: String },

    #[error("Routing failed: {reason}")]
    RoutingFailure { reason: String },

    #[error("No points of interest available to search")]
    EmptySearchResult,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Location,
    Routing,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 可忽略，畫面維持現狀
    Low,
    /// 暫時性錯誤，下一輪刷新可能恢復
    Medium,
    /// 需要使用者處理
    High,
    /// 無法繼續執行
    Critical,
}

impl SyncError {
    pub fn fetch_failure(category: PoiCategory, details: impl Into<String>) -> Self {
        Self::FetchFailure {
            category,
            details: details.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FetchTimeout { .. } | Self::Http(_) => ErrorCategory::Network,
            Self::FetchFailure { .. } | Self::EmptySearchResult => ErrorCategory::Data,
            Self::GeolocationUnavailable { .. } => ErrorCategory::Location,
            Self::RoutingFailure { .. } => ErrorCategory::Routing,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EmptySearchResult | Self::GeolocationUnavailable { .. } => ErrorSeverity::Low,
            Self::FetchTimeout { .. }
            | Self::FetchFailure { .. }
            | Self::RoutingFailure { .. }
            | Self::Http(_) => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Errors below `High` never end a session.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::High
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::FetchTimeout { category, .. } => {
                format!("Loading {} took too long, showing the last known results", category.plural())
            }
            Self::FetchFailure { category, .. } => {
                format!("Could not load {}, showing the last known results", category.plural())
            }
            Self::GeolocationUnavailable { .. } => {
                "Your location is unavailable, using the default starting point".to_string()
            }
            Self::RoutingFailure { .. } => "Directions could not be calculated".to_string(),
            Self::EmptySearchResult => "No restrooms or restaurants found nearby".to_string(),
            Self::Http(_) => "Network request failed".to_string(),
            Self::Io(_) => "A system error occurred".to_string(),
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("Missing setting '{}'", field),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection; the next map move retries automatically",
            ErrorCategory::Data => "Pan or zoom the map to load a different area",
            ErrorCategory::Location => "Allow location access or move to an area with better signal",
            ErrorCategory::Routing => "Try requesting directions again",
            ErrorCategory::Configuration => "Fix the configuration file and restart",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}
