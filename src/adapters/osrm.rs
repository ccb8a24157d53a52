use crate::config::toml_config::RoutingConfig;
use crate::domain::model::{Coordinate, Route};
use crate::domain::ports::RoutingProvider;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// OSRM Route API response (only the fields we read).
#[derive(Debug, Deserialize)]
pub struct RouteResponse {
    pub code: String,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub struct OsrmRoute {
    pub distance: f64,
    pub duration: f64,
    pub geometry: GeoJsonLine,
}

/// GeoJSON `LineString`; positions are `[lng, lat]`.
#[derive(Debug, Deserialize)]
pub struct GeoJsonLine {
    pub coordinates: Vec<[f64; 2]>,
}

/// Walking directions from an OSRM server.
#[derive(Debug, Clone)]
pub struct OsrmRoutingProvider {
    client: Client,
    base_url: String,
    profile: String,
}

impl OsrmRoutingProvider {
    pub fn new(config: &RoutingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(super::socrata::USER_AGENT)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    /// `{base}/route/v1/{profile}/{lng},{lat};{lng},{lat}`
    pub fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url,
            self.profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

fn into_route(response: RouteResponse) -> Result<Route> {
    if response.code != "Ok" {
        return Err(SyncError::RoutingFailure {
            reason: format!(
                "{}: {}",
                response.code,
                response.message.unwrap_or_default()
            ),
        });
    }

    let best = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| SyncError::RoutingFailure {
            reason: "response contained no routes".to_string(),
        })?;

    Ok(Route {
        geometry: best
            .geometry
            .coordinates
            .into_iter()
            .map(|[lng, lat]| Coordinate::new(lat, lng))
            .collect(),
        distance_m: best.distance,
        duration_s: best.duration,
    })
}

#[async_trait]
impl RoutingProvider for OsrmRoutingProvider {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route> {
        let url = self.route_url(origin, destination);
        tracing::debug!("📡 GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await
            .map_err(|e| SyncError::RoutingFailure {
                reason: format!("request error: {}", e),
            })?;

        // OSRM 的錯誤也以 JSON 回傳 (例如 400 + NoRoute)
        let status = response.status();
        let body: RouteResponse = response.json().await.map_err(|e| SyncError::RoutingFailure {
            reason: format!("HTTP {}: malformed payload: {}", status, e),
        })?;

        into_route(body)
    }
}
