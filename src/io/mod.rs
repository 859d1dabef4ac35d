//! Feature loader: per-city GeoJSON layers from disk.
//!
//! Supports the GeoJSON subset the pipeline consumes: `FeatureCollection`
//! documents whose features carry Point, LineString, Polygon, or MultiPolygon
//! geometry. Anything else — including `null` geometry — is a format error;
//! this loader never guesses.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geo::{Geometry, LineString, MultiPolygon, Point, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{City, Feature, GeometryLayer, LayerKind};
use crate::{Error, Result};

// ============================================================================
// Path scheme
// ============================================================================

/// `<data_root>/<city>/<layer>_<city>.geojson`
pub fn layer_path(data_root: &Path, city: &City, layer: LayerKind) -> PathBuf {
    city.dir(data_root).join(layer.file_name(city))
}

// ============================================================================
// Loading
// ============================================================================

/// Read one named layer for one city.
///
/// Fails with [`Error::NotFound`] if the file is absent and [`Error::Format`]
/// if it cannot be parsed as a feature collection. No side effects beyond the
/// read.
pub fn load_layer(data_root: &Path, city: &City, layer: LayerKind) -> Result<GeometryLayer> {
    let path = layer_path(data_root, city, layer);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::NotFound(format!(
                "layer file {} for city {}",
                path.display(),
                city
            )));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let features = parse_collection(&path.display().to_string(), &text)?;
    debug!(city = %city, layer = layer.prefix(), features = features.len(), "loaded layer");
    Ok(GeometryLayer::new(path.display().to_string(), features))
}

// ============================================================================
// GeoJSON parsing
// ============================================================================

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

fn format_err(path: &str, message: impl Into<String>) -> Error {
    Error::Format { path: path.to_string(), message: message.into() }
}

/// Parse a FeatureCollection document into features. `source` names the file
/// for error reporting.
fn parse_collection(source: &str, text: &str) -> Result<Vec<Feature>> {
    let raw: RawCollection =
        serde_json::from_str(text).map_err(|e| format_err(source, e.to_string()))?;

    if raw.kind != "FeatureCollection" {
        return Err(format_err(
            source,
            format!("expected FeatureCollection, got {}", raw.kind),
        ));
    }

    raw.features
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let geometry = f
                .geometry
                .ok_or_else(|| format_err(source, format!("feature {i} has null geometry")))?;
            Ok(Feature::new(
                convert_geometry(geometry),
                f.properties.unwrap_or_default(),
            ))
        })
        .collect()
}

fn convert_geometry(raw: RawGeometry) -> Geometry<f64> {
    match raw {
        RawGeometry::Point { coordinates: [x, y] } => Point::new(x, y).into(),
        RawGeometry::LineString { coordinates } => line_string(coordinates).into(),
        RawGeometry::Polygon { coordinates } => polygon(coordinates).into(),
        RawGeometry::MultiPolygon { coordinates } => {
            MultiPolygon::new(coordinates.into_iter().map(polygon).collect()).into()
        }
    }
}

fn line_string(coords: Vec<[f64; 2]>) -> LineString<f64> {
    LineString::from(coords.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>())
}

fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Polygon<f64> {
    let mut rings = rings.into_iter();
    let exterior = rings
        .next()
        .map(line_string)
        .unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.map(line_string).collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_collection() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [4.36, 52.0]},
                    "properties": {"id": 1}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]},
                    "properties": null
                }
            ]
        }"#;

        let features = parse_collection("test", text).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].property_i64("id"), Some(1));
        assert!(matches!(features[1].geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn test_null_geometry_is_format_error() {
        let text = r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "geometry": null, "properties": {}}]}"#;
        let err = parse_collection("test", text).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn test_unsupported_geometry_is_format_error() {
        let text = r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "geometry": {"type": "GeometryCollection", "geometries": []}, "properties": {}}]}"#;
        assert!(matches!(
            parse_collection("test", text).unwrap_err(),
            Error::Format { .. }
        ));
    }

    #[test]
    fn test_garbage_is_format_error() {
        assert!(matches!(
            parse_collection("test", "this is not geojson").unwrap_err(),
            Error::Format { .. }
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_layer(dir.path(), &City::new("nowhere"), LayerKind::Nodes).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{err}");
    }
}
