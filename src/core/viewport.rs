use crate::core::scheduler::ScheduledTimer;
use crate::domain::model::Viewport;
use tokio::time::Duration;

/// What to do once the debounce timer fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportDecision {
    /// Bounds moved enough; fetch for this viewport.
    Fetch(Viewport),
    /// Every edge moved less than the threshold; nothing to do.
    Skip(Viewport),
}

/// Debounces viewport changes and decides whether a refetch is warranted.
pub struct ViewportWatcher {
    debounce: Duration,
    change_fraction: f64,
    timer: ScheduledTimer<Viewport>,
    last_fetched: Option<Viewport>,
}

impl ViewportWatcher {
    pub fn new(debounce: Duration, change_fraction: f64) -> Self {
        Self {
            debounce,
            change_fraction,
            timer: ScheduledTimer::new("viewport debounce"),
            last_fetched: None,
        }
    }

    /// 重新排程；尚未觸發的排程會被取代
    pub fn on_viewport_changed(&mut self, viewport: Viewport) {
        self.timer.schedule(self.debounce, viewport);
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    pub fn last_fetched(&self) -> Option<&Viewport> {
        self.last_fetched.as_ref()
    }

    /// Waits for the debounce timer and evaluates the viewport it carried.
    pub async fn fire(&mut self) -> ViewportDecision {
        let viewport = self.timer.elapsed().await;
        self.evaluate(viewport)
    }

    /// Records `viewport` as fetched without debounce or threshold checks.
    pub fn force(&mut self, viewport: Viewport) -> ViewportDecision {
        self.timer.cancel();
        self.last_fetched = Some(viewport);
        ViewportDecision::Fetch(viewport)
    }

    fn evaluate(&mut self, viewport: Viewport) -> ViewportDecision {
        match &self.last_fetched {
            Some(previous) if !moved_significantly(previous, &viewport, self.change_fraction) => {
                tracing::debug!("🔍 Viewport change below threshold, skipping fetch");
                ViewportDecision::Skip(viewport)
            }
            _ => {
                self.last_fetched = Some(viewport);
                ViewportDecision::Fetch(viewport)
            }
        }
    }
}

/// `true` unless every edge moved less than `fraction` of the previous
/// viewport's span along that edge's axis.
pub fn moved_significantly(previous: &Viewport, next: &Viewport, fraction: f64) -> bool {
    let lat_limit = previous.lat_span() * fraction;
    let lng_limit = previous.lng_span() * fraction;

    (next.south() - previous.south()).abs() >= lat_limit
        || (next.north() - previous.north()).abs() >= lat_limit
        || (next.west() - previous.west()).abs() >= lng_limit
        || (next.east() - previous.east()).abs() >= lng_limit
}
