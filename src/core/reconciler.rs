use crate::domain::model::{Coordinate, PoiCategory, PoiKey, PointOfInterest};
use crate::domain::ports::{MapEngine, MarkerId, MarkerSpec};
use std::collections::{HashMap, HashSet};

/// What a marker click asks of the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub poi: PointOfInterest,
    /// The competing category whose selection must be cleared.
    pub clears: PoiCategory,
    pub focus: Coordinate,
}

/// Click binding attached to a marker at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBinding {
    category: PoiCategory,
    key: PoiKey,
}

impl SelectionBinding {
    /// Reads the handle's POI and describes the selection; never mutates.
    pub fn activate(&self, poi: &PointOfInterest) -> SelectionRequest {
        let clears = match self.category {
            PoiCategory::Restroom => PoiCategory::Restaurant,
            PoiCategory::Restaurant => PoiCategory::Restroom,
        };
        tracing::debug!("👆 Selected {} {} ({})", self.category, poi.display_name(), self.key);
        SelectionRequest {
            poi: poi.clone(),
            clears,
            focus: poi.coordinate(),
        }
    }
}

/// Owns one visual marker on the map.
#[derive(Debug)]
pub struct MarkerHandle {
    id: MarkerId,
    key: PoiKey,
    binding: SelectionBinding,
    poi: PointOfInterest,
}

impl MarkerHandle {
    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn key(&self) -> PoiKey {
        self.key
    }

    pub fn category(&self) -> PoiCategory {
        self.binding.category
    }

    pub fn poi(&self) -> &PointOfInterest {
        &self.poi
    }

    /// Consumes the handle so its marker can only be removed once.
    fn release<M: MapEngine + ?Sized>(self, map: &mut M) {
        map.remove_marker(self.id);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Diffs fetched points against live markers, reusing handles whose key
/// persists so they never flicker.
#[derive(Debug, Default)]
pub struct MarkerReconciler {
    handles: HashMap<PoiCategory, HashMap<PoiKey, MarkerHandle>>,
    by_id: HashMap<MarkerId, (PoiCategory, PoiKey)>,
}

impl MarkerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile<M: MapEngine + ?Sized>(
        &mut self,
        category: PoiCategory,
        points: &[PointOfInterest],
        map: &mut M,
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let mut kept = HashSet::with_capacity(points.len());
        let existing = self.handles.entry(category).or_default();

        for poi in points.iter().filter(|p| p.category() == category) {
            let key = poi.key();
            if !kept.insert(key) {
                continue;
            }

            match existing.get_mut(&key) {
                Some(handle) if handle.poi == *poi => stats.unchanged += 1,
                Some(handle) => {
                    // 保留原本的 handle，只更新顯示資料
                    map.update_marker(handle.id, &MarkerSpec::for_poi(poi));
                    handle.poi = poi.clone();
                    stats.updated += 1;
                }
                None => {
                    let id = map.create_marker(&MarkerSpec::for_poi(poi));
                    self.by_id.insert(id, (category, key));
                    existing.insert(
                        key,
                        MarkerHandle {
                            id,
                            key,
                            binding: SelectionBinding { category, key },
                            poi: poi.clone(),
                        },
                    );
                    stats.created += 1;
                }
            }
        }

        let stale: Vec<PoiKey> = existing
            .keys()
            .filter(|key| !kept.contains(*key))
            .copied()
            .collect();
        for key in stale {
            if let Some(handle) = existing.remove(&key) {
                self.by_id.remove(&handle.id);
                handle.release(map);
                stats.removed += 1;
            }
        }

        tracing::debug!(
            "🗺️ Reconciled {}: +{} ~{} ={} -{}",
            category,
            stats.created,
            stats.updated,
            stats.unchanged,
            stats.removed
        );
        stats
    }

    /// Resolves a marker click into a selection request.
    pub fn activate(&self, marker: MarkerId) -> Option<SelectionRequest> {
        let (category, key) = self.by_id.get(&marker)?;
        let handle = self.handles.get(category)?.get(key)?;
        Some(handle.binding.activate(&handle.poi))
    }

    pub fn handle(&self, category: PoiCategory, key: PoiKey) -> Option<&MarkerHandle> {
        self.handles.get(&category)?.get(&key)
    }

    pub fn len(&self, category: PoiCategory) -> usize {
        self.handles.get(&category).map_or(0, HashMap::len)
    }

    pub fn total(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Releases every marker of every category.
    pub fn release_all<M: MapEngine + ?Sized>(&mut self, map: &mut M) -> usize {
        let mut released = 0;
        for (_, handles) in self.handles.drain() {
            for (_, handle) in handles {
                handle.release(map);
                released += 1;
            }
        }
        self.by_id.clear();
        released
    }
}
