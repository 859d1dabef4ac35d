//! Access-map rendering: buildings colored by accessibility, POIs overlaid.
//!
//! Raster output via the `image` crate. Building colors follow a logarithmic
//! ramp so dense city centers don't wash out the low end of the scale.

use std::path::Path;

use geo::Point;
use image::{ImageBuffer, Rgb, RgbImage};
use tracing::debug;

use crate::analysis::AccessibilityTable;
use crate::model::GeometryLayer;
use crate::{Error, Result};

/// Figure parameters. Height follows from the data's aspect ratio.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Drawable width in pixels, margins excluded.
    pub width: u32,
    /// Margin on every side, in pixels.
    pub margin: u32,
    pub background: [u8; 3],
    /// Ramp endpoint for score 0.
    pub low_color: [u8; 3],
    /// Ramp endpoint for the maximum score.
    pub high_color: [u8; 3],
    pub poi_color: [u8; 3],
    /// Buildings whose score could not be computed.
    pub error_color: [u8; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1024,
            margin: 32,
            background: [250, 250, 250],
            low_color: [255, 237, 160],
            high_color: [128, 0, 38],
            poi_color: [34, 139, 34],
            error_color: [170, 170, 170],
        }
    }
}

/// Render buildings colored by accessibility plus POI markers, written as a
/// PNG at `out`.
///
/// Fails with [`Error::Render`] when there is nothing drawable and
/// [`Error::Io`] when the output path is not writable. Rows in `access`
/// correspond 1:1 with features in `buildings`.
pub fn render_access_map(
    options: &RenderOptions,
    buildings: &GeometryLayer,
    access: &AccessibilityTable,
    pois: &[Point<f64>],
    out: &Path,
) -> Result<()> {
    // Building centroid, score (None for failed rows), in feature order.
    let marks: Vec<(Point<f64>, Option<f64>)> = buildings
        .features()
        .iter()
        .zip(access.scores())
        .filter_map(|(feature, row)| {
            feature
                .centroid()
                .map(|c| (c, row.score.as_ref().ok().copied()))
        })
        .collect();

    let extent = Extent::over(marks.iter().map(|(p, _)| *p).chain(pois.iter().copied()))
        .ok_or_else(|| Error::Render("no drawable features".to_string()))?;

    let width = options.width.max(1);
    let height = extent.height_for(width);
    let full_w = width + 2 * options.margin;
    let full_h = height + 2 * options.margin;
    let mut img: RgbImage = ImageBuffer::from_pixel(full_w, full_h, Rgb(options.background));

    let project = |p: Point<f64>| -> (i32, i32) {
        let (tx, ty) = extent.unit(p);
        let x = options.margin as f64 + tx * (width.saturating_sub(1)) as f64;
        let y = options.margin as f64 + (1.0 - ty) * (height.saturating_sub(1)) as f64;
        (x.round() as i32, y.round() as i32)
    };

    let max_score = marks
        .iter()
        .filter_map(|(_, s)| *s)
        .fold(0.0f64, f64::max);

    for (point, score) in &marks {
        let color = match score {
            Some(s) => ramp(options.low_color, options.high_color, log_unit(*s, max_score)),
            None => Rgb(options.error_color),
        };
        let (x, y) = project(*point);
        draw_disc(&mut img, x, y, 3.0, color);
    }

    for poi in pois {
        let (x, y) = project(*poi);
        draw_disc(&mut img, x, y, 4.0, Rgb(options.poi_color));
    }

    img.save(out).map_err(|e| match e {
        image::ImageError::IoError(io) => Error::Io(io),
        other => Error::Render(other.to_string()),
    })?;

    debug!(out = %out.display(), buildings = marks.len(), pois = pois.len(), "wrote figure");
    Ok(())
}

/// Position on the log ramp: `ln(1 + s) / ln(1 + max)`, clamped to [0, 1].
fn log_unit(score: f64, max_score: f64) -> f64 {
    if max_score <= 0.0 || score <= 0.0 {
        return 0.0;
    }
    ((1.0 + score).ln() / (1.0 + max_score).ln()).clamp(0.0, 1.0)
}

fn ramp(low: [u8; 3], high: [u8; 3], t: f64) -> Rgb<u8> {
    let mix = |a: u8, b: u8| -> u8 {
        (a as f64 + t * (b as f64 - a as f64)).round().clamp(0.0, 255.0) as u8
    };
    Rgb([mix(low[0], high[0]), mix(low[1], high[1]), mix(low[2], high[2])])
}

fn draw_disc(img: &mut RgbImage, cx: i32, cy: i32, radius: f32, color: Rgb<u8>) {
    let r2 = (radius * radius) as i32;
    let w = img.width() as i32;
    let h = img.height() as i32;
    let r = radius.ceil() as i32;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r2 {
                let x = cx + dx;
                let y = cy + dy;
                if x >= 0 && x < w && y >= 0 && y < h {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

// ============================================================================
// Extents
// ============================================================================

struct Extent {
    min_x: f64,
    min_y: f64,
    span_x: f64,
    span_y: f64,
}

impl Extent {
    fn over(points: impl Iterator<Item = Point<f64>>) -> Option<Self> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut any = false;
        for p in points {
            any = true;
            min_x = min_x.min(p.x());
            min_y = min_y.min(p.y());
            max_x = max_x.max(p.x());
            max_y = max_y.max(p.y());
        }
        if !any {
            return None;
        }
        // Degenerate spans (single point, collinear data) still project.
        Some(Self {
            min_x,
            min_y,
            span_x: (max_x - min_x).max(f64::EPSILON),
            span_y: (max_y - min_y).max(f64::EPSILON),
        })
    }

    /// Normalized [0, 1] position inside the extent.
    fn unit(&self, p: Point<f64>) -> (f64, f64) {
        (
            (p.x() - self.min_x) / self.span_x,
            (p.y() - self.min_y) / self.span_y,
        )
    }

    /// Pixel height preserving aspect ratio, clamped to something sane.
    fn height_for(&self, width: u32) -> u32 {
        let h = (width as f64 * self.span_y / self.span_x).round() as i64;
        h.clamp(16, 4096) as u32
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::building_accessibility;
    use crate::model::Feature;
    use crate::network::RoutableNetwork;
    use serde_json::{json, Map};

    fn point_feature(id: i64, x: f64, y: f64) -> Feature {
        let mut props = Map::new();
        props.insert("id".into(), json!(id));
        Feature::new(Point::new(x, y).into(), props)
    }

    #[test]
    fn test_renders_png() {
        let nodes = GeometryLayer::new(
            "nodes",
            vec![point_feature(1, 0.0, 0.0), point_feature(2, 100.0, 50.0)],
        );
        let mut edge_props = Map::new();
        edge_props.insert("from".into(), json!(1));
        edge_props.insert("to".into(), json!(2));
        edge_props.insert("length".into(), json!(111.8));
        let edges = GeometryLayer::new(
            "edges",
            vec![Feature::new(Point::new(0.0, 0.0).into(), edge_props)],
        );
        let mut net = RoutableNetwork::build(&nodes, &edges).unwrap();
        let pois = vec![Point::new(0.0, 0.0)];
        net.register_pois("parks", &pois, 500.0, 5).unwrap();

        let buildings = GeometryLayer::new(
            "buildings",
            vec![point_feature(10, 10.0, 10.0), point_feature(11, 90.0, 40.0)],
        );
        let access = building_accessibility(&net, "parks", 500.0, &buildings).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("city.png");
        render_access_map(&RenderOptions::default(), &buildings, &access, &pois, &out).unwrap();

        let meta = std::fs::metadata(&out).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn test_nothing_to_draw_is_render_error() {
        let buildings = GeometryLayer::new("buildings", vec![]);
        let net = {
            let nodes = GeometryLayer::new("nodes", vec![point_feature(1, 0.0, 0.0)]);
            let edges = GeometryLayer::new("edges", vec![]);
            let mut net = RoutableNetwork::build(&nodes, &edges).unwrap();
            net.register_pois("parks", &[Point::new(0.0, 0.0)], 100.0, 1).unwrap();
            net
        };
        let access = building_accessibility(&net, "parks", 100.0, &buildings).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.png");
        let err =
            render_access_map(&RenderOptions::default(), &buildings, &access, &[], &out).unwrap_err();
        assert!(matches!(err, Error::Render(_)), "{err}");
    }

    #[test]
    fn test_log_ramp_endpoints() {
        assert_eq!(log_unit(0.0, 10.0), 0.0);
        assert!((log_unit(10.0, 10.0) - 1.0).abs() < 1e-12);
        assert_eq!(log_unit(5.0, 0.0), 0.0);
    }
}
