use crate::domain::model::{Coordinate, Route, Viewport};
use crate::domain::ports::{MapControl, MapEngine, MarkerId, MarkerSpec, ROUTE_LAYER};
use std::collections::{BTreeMap, HashMap};

/// One operation issued against the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    CreateMarker(MarkerId, MarkerSpec),
    UpdateMarker(MarkerId, MarkerSpec),
    RemoveMarker(MarkerId),
    FlyTo(Coordinate, f64),
    SetUserLocation(Coordinate),
    DrawRoute(usize),
    ClearRoute,
    RaiseLayer(String),
    SetControlIcon(MapControl, String),
}

/// Map engine without a renderer: keeps the marker table and layer stack in
/// memory and records every call. Used by the CLI and in tests.
#[derive(Debug)]
pub struct RecordingMap {
    viewport: Viewport,
    next_id: u64,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    layers: Vec<String>,
    route: Option<Route>,
    user_location: Option<Coordinate>,
    controls: HashMap<MapControl, String>,
    ops: Vec<MapOp>,
}

impl RecordingMap {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_id: 1,
            markers: BTreeMap::new(),
            layers: vec!["base".to_string(), "labels".to_string(), "poi-markers".to_string()],
            route: None,
            user_location: None,
            controls: HashMap::new(),
            ops: Vec::new(),
        }
    }

    /// Simulates the user panning or zooming.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn ops(&self) -> &[MapOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<MapOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn live_markers(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MarkerSpec> {
        self.markers.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = (&MarkerId, &MarkerSpec)> {
        self.markers.iter()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.user_location
    }

    pub fn control_icon(&self, control: MapControl) -> Option<&str> {
        self.controls.get(&control).map(String::as_str)
    }

    /// Topmost layer in render order.
    pub fn top_layer(&self) -> Option<&str> {
        self.layers.last().map(String::as_str)
    }

    fn record(&mut self, op: MapOp) {
        tracing::trace!("🗺️ {:?}", op);
        self.ops.push(op);
    }
}

impl MapEngine for RecordingMap {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_marker(&mut self, spec: &MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.insert(id, spec.clone());
        self.record(MapOp::CreateMarker(id, spec.clone()));
        id
    }

    fn update_marker(&mut self, id: MarkerId, spec: &MarkerSpec) {
        if let Some(existing) = self.markers.get_mut(&id) {
            *existing = spec.clone();
        } else {
            tracing::warn!("⚠️ Update for unknown {}", id);
        }
        self.record(MapOp::UpdateMarker(id, spec.clone()));
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if self.markers.remove(&id).is_none() {
            tracing::warn!("⚠️ Removal of unknown {}", id);
        }
        self.record(MapOp::RemoveMarker(id));
    }

    fn fly_to(&mut self, center: Coordinate, zoom: f64) {
        let lat_span = self.viewport.lat_span();
        let lng_span = self.viewport.lng_span();
        self.viewport = Viewport::around(center, lat_span, lng_span, zoom);
        self.record(MapOp::FlyTo(center, zoom));
    }

    fn set_user_location(&mut self, location: Coordinate) {
        self.user_location = Some(location);
        self.record(MapOp::SetUserLocation(location));
    }

    fn draw_route(&mut self, route: &Route) {
        // 新路線圖層預設插在標籤下方
        self.layers.retain(|layer| layer != ROUTE_LAYER);
        self.layers.insert(1, ROUTE_LAYER.to_string());
        self.route = Some(route.clone());
        self.record(MapOp::DrawRoute(route.geometry.len()));
    }

    fn clear_route(&mut self) {
        self.layers.retain(|layer| layer != ROUTE_LAYER);
        self.route = None;
        self.record(MapOp::ClearRoute);
    }

    fn raise_layer(&mut self, layer: &str) {
        if let Some(index) = self.layers.iter().position(|l| l == layer) {
            let raised = self.layers.remove(index);
            self.layers.push(raised);
        }
        self.record(MapOp::RaiseLayer(layer.to_string()));
    }

    fn set_control_icon(&mut self, control: MapControl, icon: &str) {
        self.controls.insert(control, icon.to_string());
        self.record(MapOp::SetControlIcon(control, icon.to_string()));
    }
}
