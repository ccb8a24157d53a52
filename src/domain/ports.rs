use crate::domain::model::{Coordinate, PoiCategory, PointOfInterest, Route, Viewport};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Layer id under which the active route is drawn.
pub const ROUTE_LAYER: &str = "directions-route";

/// Opaque id of a visual marker created by a [`MapEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Everything the map engine needs to draw one POI marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub category: PoiCategory,
    pub coordinate: Coordinate,
    pub title: String,
    pub glyph: &'static str,
}

impl MarkerSpec {
    pub fn for_poi(poi: &PointOfInterest) -> Self {
        let glyph = match poi.category() {
            PoiCategory::Restroom => "🚻",
            PoiCategory::Restaurant => "🍽️",
        };
        Self {
            category: poi.category(),
            coordinate: poi.coordinate(),
            title: poi.display_name().to_string(),
            glyph,
        }
    }
}

/// Map controls whose look is configured declaratively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapControl {
    Geolocate,
    Nearest,
    Directions,
}

/// Remote dataset of one or more POI categories.
#[async_trait]
pub trait PoiSource: Send + Sync {
    async fn query(
        &self,
        category: PoiCategory,
        bounds: &Viewport,
        limit: usize,
    ) -> Result<Vec<PointOfInterest>>;
}

/// 使用者位置來源 (GPS、瀏覽器等)
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<Coordinate>;
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route>;
}

/// Capability surface of the map/render engine. Calls are synchronous UI
/// operations issued from the session's event loop.
pub trait MapEngine: Send {
    fn viewport(&self) -> Viewport;
    fn create_marker(&mut self, spec: &MarkerSpec) -> MarkerId;
    fn update_marker(&mut self, id: MarkerId, spec: &MarkerSpec);
    fn remove_marker(&mut self, id: MarkerId);
    fn fly_to(&mut self, center: Coordinate, zoom: f64);
    fn set_user_location(&mut self, location: Coordinate);
    fn draw_route(&mut self, route: &Route);
    fn clear_route(&mut self);
    /// Moves `layer` above every other map layer.
    fn raise_layer(&mut self, layer: &str);
    fn set_control_icon(&mut self, control: MapControl, icon: &str);
}
