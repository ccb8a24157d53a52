//! The owned synchronization session.
//!
//! A [`Session`] owns the map engine, the current POI sets, the marker table,
//! the directions state and every timer or in-flight request. It is driven
//! from one task: [`Session::run`] multiplexes inbound [`SessionEvent`]s, the
//! viewport debounce timer, the in-flight POI refresh and the in-flight route
//! request with `tokio::select!`. Nothing here is shared across threads.
//!
//! A refresh superseded by a newer executed fetch is hard-cancelled; its
//! results are never reconciled.

use crate::config::SyncConfig;
use crate::core::declutter::declutter;
use crate::core::directions::{DirectionsController, DirectionsStatus, RouteSettlement};
use crate::core::fetcher::{FetchOutcome, PoiFetcher, RefreshReport};
use crate::core::nearest::{haversine_m, nearest, PoiSets};
use crate::core::reconciler::{MarkerReconciler, ReconcileStats, SelectionRequest};
use crate::core::scheduler::TaskSlot;
use crate::core::viewport::{ViewportDecision, ViewportWatcher};
use crate::domain::model::{Coordinate, PoiCategory, PointOfInterest, Route, Viewport};
use crate::domain::ports::{
    LocationProvider, MapControl, MapEngine, MarkerId, PoiSource, RoutingProvider,
};
use crate::utils::error::{Result, SyncError};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const USER_ZOOM: f64 = 14.0;
pub const RECENTER_ZOOM: f64 = 15.0;
pub const FOCUS_ZOOM: f64 = 16.0;

/// Inputs from the map engine and the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ViewportChanged(Viewport),
    MarkerActivated(MarkerId),
    LocationUpdated(Coordinate),
    RecenterOnUser,
    FindNearest,
    /// Directions from the user to the current selection.
    RequestDirections,
    StopDirections,
    ClearSelection,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub poi: PointOfInterest,
    /// Great-circle distance from the user when selected.
    pub distance_m: f64,
}

/// Outputs for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Loading(bool),
    PoisUpdated {
        category: PoiCategory,
        points: Vec<PointOfInterest>,
        stats: ReconcileStats,
    },
    FetchFailed {
        category: PoiCategory,
        message: String,
    },
    RefreshCompleted {
        loaded: usize,
        failed: usize,
    },
    SelectionChanged(Option<Selection>),
    DirectionsChanged(DirectionsStatus),
    RouteReady {
        distance_m: f64,
        duration_s: f64,
    },
    LocationFallback(Coordinate),
    Advisory(String),
}

/// External capabilities a session consumes, besides the map engine.
#[derive(Clone)]
pub struct SessionPorts {
    pub restrooms: Arc<dyn PoiSource>,
    pub restaurants: Arc<dyn PoiSource>,
    pub location: Arc<dyn LocationProvider>,
    pub routing: Arc<dyn RoutingProvider>,
}

enum Step {
    Event(Option<SessionEvent>),
    Refreshed(RefreshReport),
    Routed((u64, Result<Route>)),
    Debounced(ViewportDecision),
}

pub struct Session<M: MapEngine> {
    config: SyncConfig,
    map: M,
    fetcher: PoiFetcher,
    location: Arc<dyn LocationProvider>,
    routing: Arc<dyn RoutingProvider>,
    watcher: ViewportWatcher,
    reconciler: MarkerReconciler,
    pois: PoiSets,
    selection: Option<Selection>,
    directions: DirectionsController,
    user_location: Coordinate,
    refresh: TaskSlot<RefreshReport>,
    route_request: TaskSlot<(u64, Result<Route>)>,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl<M: MapEngine> Session<M> {
    pub fn new(
        config: SyncConfig,
        map: M,
        ports: SessionPorts,
        notices: mpsc::UnboundedSender<SessionNotice>,
    ) -> Self {
        let fetcher = PoiFetcher::new(
            ports.restrooms,
            ports.restaurants,
            config.fetch_timeout(),
            config.fetch.result_limit,
        );
        let watcher = ViewportWatcher::new(config.debounce(), config.viewport.change_fraction);
        let origin = config.default_origin();

        Self {
            map,
            fetcher,
            location: ports.location,
            routing: ports.routing,
            watcher,
            reconciler: MarkerReconciler::new(),
            pois: PoiSets::default(),
            selection: None,
            directions: DirectionsController::new(origin),
            user_location: origin,
            refresh: TaskSlot::new("poi refresh"),
            route_request: TaskSlot::new("route request"),
            notices,
            config,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn pois(&self) -> &PoiSets {
        &self.pois
    }

    pub fn markers(&self) -> &MarkerReconciler {
        &self.reconciler
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn directions(&self) -> &DirectionsController {
        &self.directions
    }

    pub fn user_location(&self) -> Coordinate {
        self.user_location
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_pending()
    }

    pub fn is_debouncing(&self) -> bool {
        self.watcher.is_pending()
    }

    /// Runs the session until the event channel closes or `Shutdown`
    /// arrives, then tears everything down.
    pub async fn run(&mut self, mut events: mpsc::Receiver<SessionEvent>) {
        self.start().await;
        while self.step(&mut events).await {}
        self.shutdown();
    }

    /// Configures controls, locates the user and fetches the initial viewport.
    pub async fn start(&mut self) {
        tracing::info!("🗺️ Starting session");
        self.map.set_control_icon(MapControl::Geolocate, "📍");
        self.map.set_control_icon(MapControl::Nearest, "🚨");
        self.map.set_control_icon(MapControl::Directions, "🧭");

        self.locate_user().await;

        if let ViewportDecision::Fetch(viewport) = self.watcher.force(self.map.viewport()) {
            self.begin_refresh(viewport);
        }
    }

    /// Waits for and processes the next piece of work. Returns `false` once
    /// the session should stop.
    pub async fn step(&mut self, events: &mut mpsc::Receiver<SessionEvent>) -> bool {
        let step = tokio::select! {
            biased;
            event = events.recv() => Step::Event(event),
            report = self.refresh.settled() => Step::Refreshed(report),
            routed = self.route_request.settled() => Step::Routed(routed),
            decision = self.watcher.fire() => Step::Debounced(decision),
        };

        match step {
            Step::Event(Some(event)) => self.handle_event(event),
            Step::Event(None) => {
                tracing::debug!("📭 Event channel closed");
                false
            }
            Step::Refreshed(report) => {
                self.apply_refresh(report);
                true
            }
            Step::Routed((ticket_id, result)) => {
                self.settle_route(ticket_id, result);
                true
            }
            Step::Debounced(ViewportDecision::Fetch(viewport)) => {
                self.begin_refresh(viewport);
                true
            }
            Step::Debounced(ViewportDecision::Skip(_)) => true,
        }
    }

    /// Applies one event. Returns `false` for `Shutdown`.
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::ViewportChanged(viewport) => self.watcher.on_viewport_changed(viewport),
            SessionEvent::MarkerActivated(marker) => match self.reconciler.activate(marker) {
                Some(request) => self.select(request),
                None => tracing::debug!("👆 Click on unknown {}", marker),
            },
            SessionEvent::LocationUpdated(location) => self.set_user_location(location),
            SessionEvent::RecenterOnUser => self.map.fly_to(self.user_location, RECENTER_ZOOM),
            SessionEvent::FindNearest => self.find_nearest(),
            SessionEvent::RequestDirections => self.request_directions(),
            SessionEvent::StopDirections => self.stop_directions(),
            SessionEvent::ClearSelection => {
                if self.selection.take().is_some() {
                    self.notify(SessionNotice::SelectionChanged(None));
                }
            }
            SessionEvent::Shutdown => return false,
        }
        true
    }

    /// Releases every marker, cancels timers and requests, resets directions.
    pub fn shutdown(&mut self) -> usize {
        self.watcher.cancel();
        self.refresh.cancel();
        self.route_request.cancel();
        self.directions.stop(self.user_location, &mut self.map);

        let released = self.reconciler.release_all(&mut self.map);
        self.pois.clear();
        self.selection = None;
        tracing::info!("👋 Session closed, released {} markers", released);
        released
    }

    async fn locate_user(&mut self) {
        let timeout = self.config.location_timeout();
        let located = match tokio::time::timeout(timeout, self.location.current_location()).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::GeolocationUnavailable {
                reason: format!("no fix within {}ms", timeout.as_millis()),
            }),
        };

        match located {
            Ok(location) => {
                tracing::info!("📍 User location: {}", location);
                self.set_user_location(location);
                self.map.fly_to(location, USER_ZOOM);
            }
            Err(e) => {
                let fallback = self.config.default_origin();
                tracing::warn!("⚠️ {}; using default origin {}", e, fallback);
                self.user_location = fallback;
                self.directions.set_origin(fallback);
                self.notify(SessionNotice::LocationFallback(fallback));
            }
        }
    }

    fn set_user_location(&mut self, location: Coordinate) {
        self.user_location = location;
        self.map.set_user_location(location);
        self.directions.set_origin(location);
    }

    fn begin_refresh(&mut self, viewport: Viewport) {
        let fetcher = self.fetcher.clone();
        let superseded = self
            .refresh
            .start(move |token| fetcher.refresh(viewport, token));
        if superseded {
            tracing::debug!("🛑 Superseded in-flight refresh");
        }
        self.notify(SessionNotice::Loading(true));
    }

    fn apply_refresh(&mut self, report: RefreshReport) {
        tracing::debug!(
            "📦 Refresh took {}ms (completed {})",
            report.latency().num_milliseconds(),
            report.completed_at.format("%H:%M:%S%.3f")
        );
        let mut loaded = 0;
        let mut failed = 0;

        for (category, outcome) in report.into_outcomes() {
            match outcome {
                FetchOutcome::Loaded(points) => {
                    let points = declutter(
                        points,
                        self.config.declutter.min_delta,
                        self.config.declutter.max_markers,
                    );
                    let stats = self.reconciler.reconcile(category, &points, &mut self.map);
                    self.pois.replace(category, points.clone());
                    loaded += 1;
                    self.notify(SessionNotice::PoisUpdated {
                        category,
                        points,
                        stats,
                    });
                }
                // 失敗時保留該分類現有的標記
                FetchOutcome::Failed(e) => {
                    failed += 1;
                    self.notify(SessionNotice::FetchFailed {
                        category,
                        message: e.user_friendly_message(),
                    });
                }
                FetchOutcome::Cancelled => {}
            }
        }

        self.notify(SessionNotice::Loading(false));
        self.notify(SessionNotice::RefreshCompleted { loaded, failed });
    }

    fn select(&mut self, request: SelectionRequest) {
        // 切換分類時先清除另一分類的選取
        if self
            .selection
            .as_ref()
            .is_some_and(|previous| previous.poi.category() == request.clears)
        {
            tracing::debug!("👆 Clearing {} selection", request.clears);
            self.selection = None;
            self.notify(SessionNotice::SelectionChanged(None));
        }

        let distance_m = haversine_m(self.user_location, request.poi.coordinate());
        self.map.fly_to(request.focus, FOCUS_ZOOM);
        let selection = Selection {
            poi: request.poi,
            distance_m,
        };
        self.selection = Some(selection.clone());
        self.notify(SessionNotice::SelectionChanged(Some(selection)));
    }

    fn find_nearest(&mut self) {
        match nearest(self.user_location, &self.pois) {
            Some(found) => {
                tracing::info!(
                    "🚨 Nearest: {} ({:.0}m)",
                    found.poi.display_name(),
                    found.distance_m
                );
                let request = SelectionRequest {
                    clears: match found.poi.category() {
                        PoiCategory::Restroom => PoiCategory::Restaurant,
                        PoiCategory::Restaurant => PoiCategory::Restroom,
                    },
                    focus: found.poi.coordinate(),
                    poi: found.poi,
                };
                self.select(request);
            }
            None => {
                let advisory = SyncError::EmptySearchResult;
                tracing::info!("🔍 {}", advisory);
                self.notify(SessionNotice::Advisory(advisory.user_friendly_message()));
            }
        }
    }

    fn request_directions(&mut self) {
        let Some(destination) = self.selection.as_ref().map(|s| s.poi.coordinate()) else {
            self.notify(SessionNotice::Advisory(
                "Select a restroom or restaurant first".to_string(),
            ));
            return;
        };

        let ticket = self
            .directions
            .start(self.user_location, destination, &mut self.map);
        let routing = Arc::clone(&self.routing);
        let timeout = self.config.routing_timeout();

        self.route_request.start(move |token| async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(SyncError::RoutingFailure {
                    reason: "request cancelled".to_string(),
                }),
                answer = tokio::time::timeout(timeout, routing.route(ticket.origin, ticket.destination)) => {
                    match answer {
                        Ok(result) => result,
                        Err(_) => Err(SyncError::RoutingFailure {
                            reason: format!("no response within {}ms", timeout.as_millis()),
                        }),
                    }
                }
            };
            (ticket.id, result)
        });

        self.notify(SessionNotice::DirectionsChanged(DirectionsStatus::Requesting));
    }

    fn settle_route(&mut self, ticket_id: u64, result: Result<Route>) {
        match self.directions.complete(ticket_id, result, &mut self.map) {
            RouteSettlement::Active => {
                if let Some(route) = self.directions.route() {
                    let notice = SessionNotice::RouteReady {
                        distance_m: route.distance_m,
                        duration_s: route.duration_s,
                    };
                    self.notify(notice);
                }
                self.notify(SessionNotice::DirectionsChanged(DirectionsStatus::Active));
            }
            RouteSettlement::Failed(e) => {
                self.notify(SessionNotice::Advisory(e.user_friendly_message()));
                self.notify(SessionNotice::DirectionsChanged(DirectionsStatus::Idle));
            }
            RouteSettlement::Stale => {}
        }
    }

    fn stop_directions(&mut self) {
        self.route_request.cancel();
        if self.directions.stop(self.user_location, &mut self.map) {
            self.notify(SessionNotice::DirectionsChanged(DirectionsStatus::Idle));
        }
    }

    fn notify(&self, notice: SessionNotice) {
        if self.notices.send(notice).is_err() {
            tracing::trace!("No listener for session notices");
        }
    }
}
