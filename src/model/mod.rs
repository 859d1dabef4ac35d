//! Domain model: cities, layers, and features.

mod city;
mod layer;

pub use city::{City, LayerKind};
pub use layer::{Feature, GeometryLayer};
