//! Geometry layers: immutable feature collections loaded from disk.

use geo::{Centroid, Geometry, Point};
use serde_json::{Map, Value};

/// One geometric record with its attribute map.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>, properties: Map<String, Value>) -> Self {
        Self { geometry, properties }
    }

    /// Centroid of the geometry, if it has one (empty geometries do not).
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }

    /// Integer attribute. GeoJSON numbers may arrive as floats, so integral
    /// floats are accepted too.
    pub fn property_i64(&self, key: &str) -> Option<i64> {
        let v = self.properties.get(key)?;
        v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key)?.as_f64()
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key)?.as_str()
    }
}

/// A named, immutable collection of features. The name is the source path
/// when loaded from disk, so errors can point back at the file.
#[derive(Debug, Clone)]
pub struct GeometryLayer {
    name: String,
    features: Vec<Feature>,
}

impl GeometryLayer {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self { name: name.into(), features }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Centroids of all features that have one, in feature order.
    pub fn centroids(&self) -> Vec<Point<f64>> {
        self.features.iter().filter_map(Feature::centroid).collect()
    }
}
