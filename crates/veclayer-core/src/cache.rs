use std::collections::HashMap;

use parking_lot::RwLock;

use crate::feature::FeatureId;
use crate::geometry::Geometry;

/// Geometries recorded during a render pass, keyed by feature id.
///
/// Shared between a render pass (writer) and editing overlays (readers) that
/// may live on other threads; all access goes through an internal lock.
#[derive(Debug, Default)]
pub struct GeometryCache {
    geometries: RwLock<HashMap<FeatureId, Geometry>>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: FeatureId, geometry: Geometry) {
        self.geometries.write().insert(id, geometry);
    }

    pub fn get(&self, id: FeatureId) -> Option<Geometry> {
        self.geometries.read().get(&id).cloned()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.geometries.read().contains_key(&id)
    }

    pub fn remove(&self, id: FeatureId) -> Option<Geometry> {
        self.geometries.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.geometries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.read().is_empty()
    }

    pub fn clear(&self) {
        self.geometries.write().clear();
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self.geometries.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
