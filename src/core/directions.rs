use crate::domain::model::{Coordinate, Route};
use crate::domain::ports::{MapEngine, ROUTE_LAYER};
use crate::utils::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionsStatus {
    Idle,
    Requesting,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsSession {
    pub origin: Coordinate,
    pub destination: Option<Coordinate>,
    pub status: DirectionsStatus,
}

/// Identifies one route request; results carrying an older id are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteTicket {
    pub id: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

#[derive(Debug)]
pub enum RouteSettlement {
    Active,
    Failed(SyncError),
    /// The request was superseded or stopped before it settled.
    Stale,
}

/// Idle → Requesting → Active state machine around an external routing
/// capability.
#[derive(Debug)]
pub struct DirectionsController {
    session: DirectionsSession,
    route: Option<Route>,
    pending: Option<u64>,
    next_id: u64,
}

impl DirectionsController {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            session: DirectionsSession {
                origin,
                destination: None,
                status: DirectionsStatus::Idle,
            },
            route: None,
            pending: None,
            next_id: 0,
        }
    }

    pub fn status(&self) -> DirectionsStatus {
        self.session.status
    }

    pub fn session(&self) -> &DirectionsSession {
        &self.session
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Moves the origin while idle (e.g. a new GPS fix).
    pub fn set_origin(&mut self, origin: Coordinate) {
        if self.session.status == DirectionsStatus::Idle {
            self.session.origin = origin;
        }
    }

    /// Begins a route request. An active or pending route is torn down first.
    pub fn start<M: MapEngine + ?Sized>(
        &mut self,
        origin: Coordinate,
        destination: Coordinate,
        map: &mut M,
    ) -> RouteTicket {
        if self.session.status != DirectionsStatus::Idle {
            tracing::debug!("🧭 Replacing current directions");
            self.teardown(map);
        }

        self.next_id += 1;
        self.pending = Some(self.next_id);
        self.session = DirectionsSession {
            origin,
            destination: Some(destination),
            status: DirectionsStatus::Requesting,
        };
        tracing::info!("🧭 Requesting route {} → {}", origin, destination);

        RouteTicket {
            id: self.next_id,
            origin,
            destination,
        }
    }

    /// Applies the provider's answer for `ticket_id`.
    pub fn complete<M: MapEngine + ?Sized>(
        &mut self,
        ticket_id: u64,
        result: Result<Route>,
        map: &mut M,
    ) -> RouteSettlement {
        if self.pending != Some(ticket_id) || self.session.status != DirectionsStatus::Requesting {
            tracing::debug!("🧭 Ignoring stale route result #{}", ticket_id);
            return RouteSettlement::Stale;
        }
        self.pending = None;

        match result {
            Ok(route) => {
                map.draw_route(&route);
                // 路線必須位於所有圖層之上
                map.raise_layer(ROUTE_LAYER);
                tracing::info!(
                    "✅ Route ready: {:.0}m, {:.0}s",
                    route.distance_m,
                    route.duration_s
                );
                self.route = Some(route);
                self.session.status = DirectionsStatus::Active;
                RouteSettlement::Active
            }
            Err(e) => {
                let error = match e {
                    e @ SyncError::RoutingFailure { .. } => e,
                    other => SyncError::RoutingFailure {
                        reason: other.to_string(),
                    },
                };
                tracing::warn!("❌ {}", error);
                self.session.status = DirectionsStatus::Idle;
                self.session.destination = None;
                RouteSettlement::Failed(error)
            }
        }
    }

    /// Clears any route and resets the origin. A no-op while idle.
    pub fn stop<M: MapEngine + ?Sized>(&mut self, current_location: Coordinate, map: &mut M) -> bool {
        if self.session.status == DirectionsStatus::Idle {
            return false;
        }
        self.teardown(map);
        self.session.origin = current_location;
        tracing::info!("🧭 Directions stopped");
        true
    }

    fn teardown<M: MapEngine + ?Sized>(&mut self, map: &mut M) {
        if self.route.take().is_some() {
            map.clear_route();
        }
        self.pending = None;
        self.session.destination = None;
        self.session.status = DirectionsStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::headless_map::{MapOp, RecordingMap};
    use crate::domain::model::Viewport;

    const HOME: Coordinate = Coordinate {
        latitude: 40.7580,
        longitude: -73.9855,
    };
    const PARK: Coordinate = Coordinate {
        latitude: 40.7536,
        longitude: -73.9832,
    };
    const PIER: Coordinate = Coordinate {
        latitude: 40.7644,
        longitude: -73.9990,
    };

    fn map() -> RecordingMap {
        RecordingMap::new(Viewport::around(HOME, 0.02, 0.04, 14.0))
    }

    fn route(to: Coordinate) -> Route {
        Route {
            geometry: vec![HOME, to],
            distance_m: 520.0,
            duration_s: 400.0,
        }
    }

    #[test]
    fn test_success_activates_and_raises_route_layer() {
        let mut map = map();
        let mut directions = DirectionsController::new(HOME);

        let ticket = directions.start(HOME, PARK, &mut map);
        assert_eq!(directions.status(), DirectionsStatus::Requesting);

        let settled = directions.complete(ticket.id, Ok(route(PARK)), &mut map);

        assert!(matches!(settled, RouteSettlement::Active));
        assert_eq!(directions.status(), DirectionsStatus::Active);
        assert_eq!(map.top_layer(), Some(ROUTE_LAYER));
        assert_eq!(
            map.ops().last(),
            Some(&MapOp::RaiseLayer(ROUTE_LAYER.to_string()))
        );
    }

    #[test]
    fn test_failure_returns_to_idle_without_retry() {
        let mut map = map();
        let mut directions = DirectionsController::new(HOME);
        let ticket = directions.start(HOME, PARK, &mut map);

        let settled = directions.complete(
            ticket.id,
            Err(SyncError::ConfigError {
                message: "no route".to_string(),
            }),
            &mut map,
        );

        assert!(matches!(
            settled,
            RouteSettlement::Failed(SyncError::RoutingFailure { .. })
        ));
        assert_eq!(directions.status(), DirectionsStatus::Idle);
        assert!(map.route().is_none());
    }

    #[test]
    fn test_stop_twice_from_idle_is_noop() {
        let mut map = map();
        let mut directions = DirectionsController::new(HOME);
        let ticket = directions.start(HOME, PARK, &mut map);
        directions.complete(ticket.id, Ok(route(PARK)), &mut map);

        assert!(directions.stop(PIER, &mut map));
        let before = directions.session().clone();
        let ops_before = map.ops().len();

        assert!(!directions.stop(HOME, &mut map));
        assert_eq!(directions.session(), &before);
        assert_eq!(map.ops().len(), ops_before);
        assert_eq!(directions.session().origin, PIER);
    }

    #[test]
    fn test_start_while_active_tears_down_old_route_first() {
        let mut map = map();
        let mut directions = DirectionsController::new(HOME);
        let first = directions.start(HOME, PARK, &mut map);
        directions.complete(first.id, Ok(route(PARK)), &mut map);
        map.take_ops();

        let second = directions.start(HOME, PIER, &mut map);

        assert_eq!(map.ops(), &[MapOp::ClearRoute]);
        assert!(map.route().is_none());
        assert_eq!(directions.status(), DirectionsStatus::Requesting);
        assert_eq!(directions.session().destination, Some(PIER));

        // 舊請求的結果不得覆蓋新請求
        assert!(matches!(
            directions.complete(first.id, Ok(route(PARK)), &mut map),
            RouteSettlement::Stale
        ));
        directions.complete(second.id, Ok(route(PIER)), &mut map);
        assert_eq!(map.route().and_then(|r| r.geometry.last().copied()), Some(PIER));
    }

    #[test]
    fn test_stop_while_requesting_discards_late_result() {
        let mut map = map();
        let mut directions = DirectionsController::new(HOME);
        let ticket = directions.start(HOME, PARK, &mut map);

        assert!(directions.stop(HOME, &mut map));
        let settled = directions.complete(ticket.id, Ok(route(PARK)), &mut map);

        assert!(matches!(settled, RouteSettlement::Stale));
        assert_eq!(directions.status(), DirectionsStatus::Idle);
        assert!(map.route().is_none());
    }
}
