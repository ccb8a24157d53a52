use crate::utils::error::{Result, SyncError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.trim().is_empty() {
        return Err(SyncError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SyncError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// NaN never satisfies the bound.
#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn validate_positive_number<T>(field_name: &str, value: T, min_value: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if !(value >= min_value) {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[allow(clippy::neg_cmp_op_on_partial_ord)]
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(value >= min && value <= max) {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Open interval (0, 1), used for fractions of a span.
pub fn validate_fraction(field_name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be greater than 0 and less than 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("sources.restroom.endpoint", "https://example.com").is_ok());
        assert!(validate_url("sources.restroom.endpoint", "http://example.com").is_ok());
        assert!(matches!(
            validate_url("sources.restroom.endpoint", ""),
            Err(SyncError::MissingConfigError { ref field }) if field == "sources.restroom.endpoint"
        ));
        assert!(validate_url("sources.restroom.endpoint", "invalid-url").is_err());
        assert!(validate_url("sources.restroom.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("fetch.result_limit", 5, 1).is_ok());
        assert!(validate_positive_number("fetch.result_limit", 0, 1).is_err());
        assert!(validate_positive_number("declutter.min_delta", -0.1, 0.0).is_err());
        assert!(validate_positive_number("declutter.min_delta", f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_validate_range_and_fraction() {
        assert!(validate_range("viewport.debounce_ms", 750, 500, 1000).is_ok());
        assert!(validate_range("viewport.debounce_ms", 200, 500, 1000).is_err());
        assert!(validate_range("location.default_latitude", f64::NAN, -90.0, 90.0).is_err());
        assert!(validate_fraction("viewport.change_fraction", 0.1).is_ok());
        assert!(validate_fraction("viewport.change_fraction", 0.0).is_err());
        assert!(validate_fraction("viewport.change_fraction", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("routing.profile", "foot").is_ok());
        assert!(validate_non_empty_string("routing.profile", "  ").is_err());
    }
}
