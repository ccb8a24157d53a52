use crate::config::SourceConfig;
use crate::domain::model::{Coordinate, PoiCategory, PoiDetails, PointOfInterest, Viewport};
use crate::domain::ports::PoiSource;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

pub const USER_AGENT: &str = concat!("poi-sync/", env!("CARGO_PKG_VERSION"));

/// NYC Open Data (Socrata SODA) dataset queried by bounding box.
#[derive(Debug, Clone)]
pub struct SocrataPoiSource {
    client: Client,
    config: SourceConfig,
}

impl SocrataPoiSource {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: SourceConfig) -> Self {
        Self { client, config }
    }

    /// SoQL predicate selecting rows inside `bounds`, ANDed with the
    /// configured filter.
    pub fn where_clause(&self, bounds: &Viewport) -> String {
        let bbox = format!(
            "latitude >= {:.6} AND latitude <= {:.6} AND longitude >= {:.6} AND longitude <= {:.6}",
            bounds.south(),
            bounds.north(),
            bounds.west(),
            bounds.east()
        );
        match self.config.filter.as_deref().map(str::trim) {
            Some(filter) if !filter.is_empty() => format!("{} AND ({})", bbox, filter),
            _ => bbox,
        }
    }
}

#[async_trait]
impl PoiSource for SocrataPoiSource {
    async fn query(
        &self,
        category: PoiCategory,
        bounds: &Viewport,
        limit: usize,
    ) -> Result<Vec<PointOfInterest>> {
        let where_clause = self.where_clause(bounds);
        tracing::debug!("📡 GET {} $where={}", self.config.endpoint, where_clause);

        let mut request = self
            .client
            .get(&self.config.endpoint)
            .query(&[("$where", where_clause), ("$limit", limit.to_string())]);

        // 添加自定義標頭
        if let Some(headers) = &self.config.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }
        if let Some(token) = &self.config.app_token {
            request = request.header("X-App-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::fetch_failure(category, format!("request error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::fetch_failure(category, format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::fetch_failure(category, format!("malformed payload: {}", e)))?;

        let Value::Array(items) = body else {
            return Err(SyncError::fetch_failure(category, "expected a JSON array"));
        };

        let total = items.len();
        let points: Vec<PointOfInterest> = items
            .iter()
            .filter_map(|item| parse_record(category, item))
            .collect();
        if points.len() < total {
            tracing::debug!(
                "🧹 Discarded {} {} records without coordinates",
                total - points.len(),
                category
            );
        }

        Ok(points)
    }
}

/// Converts one raw record; `None` when it lacks a usable coordinate.
pub fn parse_record(category: PoiCategory, record: &Value) -> Option<PointOfInterest> {
    let fields = record.as_object()?;
    let latitude = numeric_field(fields, "latitude")?;
    let longitude = numeric_field(fields, "longitude")?;

    // 未地理編碼的資料以 0,0 表示
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    let details = match category {
        PoiCategory::Restroom => PoiDetails::Restroom {
            name: text_field(fields, "facility_name"),
            accessible: flag_field(fields, "handicap_accessible"),
            year_round: flag_field(fields, "open_year_round"),
            borough: text_field(fields, "borough"),
        },
        PoiCategory::Restaurant => PoiDetails::Restaurant {
            name: text_field(fields, "dba"),
            cuisine: text_field(fields, "cuisine_description"),
            grade: text_field(fields, "grade"),
            borough: text_field(fields, "boro"),
        },
    };

    Some(PointOfInterest::new(Coordinate::new(latitude, longitude), details))
}

fn numeric_field(fields: &Map<String, Value>, name: &str) -> Option<f64> {
    let value = match fields.get(name)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn text_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag_field(fields: &Map<String, Value>, name: &str) -> bool {
    fields
        .get(name)
        .and_then(Value::as_str)
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("yes"))
}
