//! Per-node and per-building analyses over a built network.

mod accessibility;
mod proximity;

pub use accessibility::{building_accessibility, poi_counts, AccessibilityTable, BuildingScore};
pub use proximity::{nearest_pois, DistanceTable};

/// Sentinel for "no POI found in this slot". Infinity survives comparisons
/// without ever masquerading as a real distance.
pub const UNREACHABLE: f64 = f64::INFINITY;
