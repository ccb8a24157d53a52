use crate::domain::model::{PoiCategory, PointOfInterest, Viewport};
use crate::domain::ports::PoiSource;
use crate::utils::error::SyncError;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of one category fetch. Only `Loaded` may touch the marker set.
#[derive(Debug)]
pub enum FetchOutcome {
    Loaded(Vec<PointOfInterest>),
    Failed(SyncError),
    Cancelled,
}

/// Both category outcomes of one refresh cycle.
#[derive(Debug)]
pub struct RefreshReport {
    pub viewport: Viewport,
    pub restrooms: FetchOutcome,
    pub restaurants: FetchOutcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RefreshReport {
    /// Wall-clock time from request to the slower category settling.
    pub fn latency(&self) -> TimeDelta {
        self.completed_at - self.started_at
    }

    /// Outcomes in the fixed category order.
    pub fn into_outcomes(self) -> [(PoiCategory, FetchOutcome); 2] {
        [
            (PoiCategory::Restroom, self.restrooms),
            (PoiCategory::Restaurant, self.restaurants),
        ]
    }
}

/// Per-category bounded remote query with timeout and cancellation.
#[derive(Clone)]
pub struct PoiFetcher {
    restrooms: Arc<dyn PoiSource>,
    restaurants: Arc<dyn PoiSource>,
    timeout: Duration,
    limit: usize,
}

impl PoiFetcher {
    pub fn new(
        restrooms: Arc<dyn PoiSource>,
        restaurants: Arc<dyn PoiSource>,
        timeout: Duration,
        limit: usize,
    ) -> Self {
        Self {
            restrooms,
            restaurants,
            timeout,
            limit,
        }
    }

    fn source(&self, category: PoiCategory) -> &Arc<dyn PoiSource> {
        match category {
            PoiCategory::Restroom => &self.restrooms,
            PoiCategory::Restaurant => &self.restaurants,
        }
    }

    pub async fn fetch(
        &self,
        category: PoiCategory,
        viewport: &Viewport,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let query = self.source(category).query(category, viewport, self.limit);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => FetchOutcome::Cancelled,
            result = tokio::time::timeout(self.timeout, query) => match result {
                Ok(Ok(points)) => FetchOutcome::Loaded(unique_by_key(category, points)),
                Ok(Err(e)) => FetchOutcome::Failed(classify(category, e)),
                Err(_) => FetchOutcome::Failed(SyncError::FetchTimeout {
                    category,
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            },
        };

        match &outcome {
            FetchOutcome::Loaded(points) => {
                tracing::info!("✅ Loaded {} {}", points.len(), category.plural());
            }
            FetchOutcome::Failed(e) => {
                tracing::warn!("⚠️ {} (keeping current {} markers)", e, category);
            }
            FetchOutcome::Cancelled => {
                tracing::debug!("🛑 {} fetch cancelled", category);
            }
        }

        outcome
    }

    /// Fetches both categories concurrently. Each category has its own child
    /// token and timeout; the report is ready once both have settled.
    pub fn refresh(
        &self,
        viewport: Viewport,
        token: CancellationToken,
    ) -> impl Future<Output = RefreshReport> + Send + 'static {
        let fetcher = self.clone();
        async move {
            let started_at = Utc::now();
            tracing::debug!(
                "📥 Refreshing POIs for S{:.5} W{:.5} N{:.5} E{:.5}",
                viewport.south(),
                viewport.west(),
                viewport.north(),
                viewport.east()
            );
            let restroom_token = token.child_token();
            let restaurant_token = token.child_token();

            let (restrooms, restaurants) = tokio::join!(
                fetcher.fetch(PoiCategory::Restroom, &viewport, &restroom_token),
                fetcher.fetch(PoiCategory::Restaurant, &viewport, &restaurant_token),
            );

            RefreshReport {
                viewport,
                restrooms,
                restaurants,
                started_at,
                completed_at: Utc::now(),
            }
        }
    }
}

fn classify(category: PoiCategory, error: SyncError) -> SyncError {
    match error {
        e @ (SyncError::FetchTimeout { .. } | SyncError::FetchFailure { .. }) => e,
        other => SyncError::fetch_failure(category, other.to_string()),
    }
}

/// 同一分類中相同座標鍵只保留第一筆
fn unique_by_key(category: PoiCategory, points: Vec<PointOfInterest>) -> Vec<PointOfInterest> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .into_iter()
        .filter(|p| p.category() == category && seen.insert(p.key()))
        .collect()
}
