//! Pipeline configuration.
//!
//! Everything the orchestrator needs travels in this struct — there is no
//! process-wide state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the per-city input directories.
    pub data_root: PathBuf,
    /// Where figures are written, one `<city>.png` each.
    pub fig_root: PathBuf,
    /// POI registration search radius (network units, typically meters).
    pub poi_max_distance: f64,
    /// POI registration per-node cap. This also caps accessibility counts:
    /// a node near more POIs than this still scores at most `poi_max_items`,
    /// so raise it for dense cities where the default would saturate.
    pub poi_max_items: usize,
    /// Query threshold for proximity and accessibility.
    pub distance_threshold: f64,
    /// k for the nearest-POI table. Must not exceed `poi_max_items`.
    pub poi_count: usize,
}

impl PipelineConfig {
    pub fn new(data_root: impl Into<PathBuf>, fig_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            fig_root: fig_root.into(),
            poi_max_distance: 800.0,
            poi_max_items: 10,
            distance_threshold: 800.0,
            poi_count: 3,
        }
    }

    pub fn with_threshold(mut self, distance_threshold: f64) -> Self {
        self.distance_threshold = distance_threshold;
        self
    }

    pub fn with_poi_bounds(mut self, max_distance: f64, max_items: usize) -> Self {
        self.poi_max_distance = max_distance;
        self.poi_max_items = max_items;
        self
    }

    pub fn with_poi_count(mut self, poi_count: usize) -> Self {
        self.poi_count = poi_count;
        self
    }
}
