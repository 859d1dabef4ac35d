//! # accessnet — Network Accessibility Analysis
//!
//! City-scale proximity and accessibility analysis over street networks.
//!
//! ## Design Principles
//!
//! 1. **Pure stages**: load → build → analyze → render are functions over
//!    immutable inputs; only the loader and renderer touch the filesystem
//! 2. **Bounded queries**: POI registration fixes `(max_distance, max_items)`
//!    up front, so query cost is bounded at build time
//! 3. **Plan, then compute**: batch work is described as a [`BatchPlan`] that
//!    can be inspected (`dot()`) before paying the execution cost
//! 4. **Isolated failures**: one city failing never aborts its siblings, and
//!    one building failing never aborts the rest of the table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use accessnet::{BatchPlan, City, PipelineConfig};
//!
//! # fn example() -> accessnet::Result<()> {
//! let config = PipelineConfig::new("data", "figs");
//! let plan = BatchPlan::new(config, ["delft", "utrecht"].map(City::new));
//!
//! // Inspect the task graph before running anything.
//! println!("{}", plan.dot());
//!
//! // Evaluate all cities in parallel; failures are recorded per city.
//! let report = plan.compute();
//! for outcome in report.failed() {
//!     eprintln!("{} failed: {}", outcome.city, outcome.result.as_ref().unwrap_err());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Input Layout
//!
//! One directory per city with four fixed-name GeoJSON layers:
//!
//! | Layer | File |
//! |-------|------|
//! | Nodes | `<data_root>/<city>/nodes_<city>.geojson` |
//! | Edges | `<data_root>/<city>/edges_<city>.geojson` |
//! | Parks | `<data_root>/<city>/parks_<city>.geojson` |
//! | Buildings | `<data_root>/<city>/buildings_<city>.geojson` |
//!
//! Output: one figure per city at `<fig_root>/<city>.png`.

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod io;
pub mod network;
pub mod analysis;
pub mod render;
pub mod pipeline;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{City, Feature, GeometryLayer, LayerKind};

// ============================================================================
// Re-exports: Network
// ============================================================================

pub use network::{NodeKey, PoiCategory, RoutableNetwork};

// ============================================================================
// Re-exports: Analysis
// ============================================================================

pub use analysis::{
    building_accessibility, nearest_pois, poi_counts, AccessibilityTable, BuildingScore,
    DistanceTable, UNREACHABLE,
};

// ============================================================================
// Re-exports: Rendering
// ============================================================================

pub use render::{render_access_map, RenderOptions};

// ============================================================================
// Re-exports: Pipeline
// ============================================================================

pub use pipeline::{
    run_city, BatchPlan, BatchReport, CityArtifacts, CityOutcome, CityPlan, PipelineConfig,
    POI_CATEGORY,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An expected input file is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A file exists but cannot be parsed as a geometry layer.
    #[error("format error in {path}: {message}")]
    Format { path: String, message: String },

    /// An edge references an unknown node, or a node id is duplicated.
    #[error("referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    /// A nearest-node or category lookup cannot be resolved.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// The figure cannot be drawn (degenerate extents, encoder failure).
    #[error("render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
