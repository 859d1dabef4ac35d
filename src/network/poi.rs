//! POI categories: precomputed per-node reach tables.
//!
//! Registration walks the network outward from every POI once; queries read
//! the resulting table and never touch the graph again. The registration
//! bounds `(max_distance, max_items)` are therefore hard caps on what any
//! later query can answer.

use smallvec::SmallVec;

/// A named POI set registered against a [`RoutableNetwork`].
///
/// [`RoutableNetwork`]: super::RoutableNetwork
#[derive(Debug, Clone)]
pub struct PoiCategory {
    max_distance: f64,
    max_items: usize,
    poi_count: usize,
    /// Per graph node: ascending network distances to distinct POIs,
    /// truncated to `max_items`. Equal distances keep registration order.
    reach: Vec<SmallVec<[f64; 4]>>,
}

impl PoiCategory {
    pub(crate) fn new(
        max_distance: f64,
        max_items: usize,
        poi_count: usize,
        reach: Vec<SmallVec<[f64; 4]>>,
    ) -> Self {
        Self { max_distance, max_items, poi_count, reach }
    }

    /// Search radius fixed at registration time.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Per-node POI cap fixed at registration time.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Number of POIs registered (before any truncation).
    pub fn poi_count(&self) -> usize {
        self.poi_count
    }

    /// Ascending distances from this node to its reachable POIs.
    pub fn distances(&self, node: usize) -> &[f64] {
        self.reach.get(node).map(|row| row.as_slice()).unwrap_or(&[])
    }
}
