//! Accessibility: POI counts per node, assigned to buildings by nearest-node
//! snap.
//!
//! A building's score is the count-aggregate of its nearest network node —
//! never of a more distant one. Individual buildings fail independently: a
//! building with no resolvable centroid or snap records an error row, the
//! rest of the batch proceeds.

use tracing::{debug, warn};

use crate::model::GeometryLayer;
use crate::network::RoutableNetwork;
use crate::{Error, Result};

/// One building's accessibility outcome.
#[derive(Debug)]
pub struct BuildingScore {
    /// Building `id` attribute when present, else the feature index.
    pub label: String,
    pub score: Result<f64>,
}

/// Per-building accessibility scores, one row per building feature.
#[derive(Debug)]
pub struct AccessibilityTable {
    scores: Vec<BuildingScore>,
}

impl AccessibilityTable {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn scores(&self) -> &[BuildingScore] {
        &self.scores
    }

    /// Successfully scored values, in building order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.scores.iter().filter_map(|s| s.score.as_ref().ok().copied())
    }

    pub fn failed_count(&self) -> usize {
        self.scores.iter().filter(|s| s.score.is_err()).count()
    }
}

/// Count of POIs within `distance` of every network node.
///
/// An aggregate, not a list; counts are capped by the category's
/// `max_items` registration bound.
pub fn poi_counts(net: &RoutableNetwork, category: &str, distance: f64) -> Result<Vec<f64>> {
    let cat = net.poi_category(category)?;
    let counts = (0..net.node_count())
        .map(|node| cat.distances(node).iter().take_while(|&&d| d <= distance).count() as f64)
        .collect();
    Ok(counts)
}

/// Assign each building the POI count of its nearest network node.
///
/// Returns one row per building feature. Per-building failures (no centroid,
/// no snap on an empty network) are recorded in the row and never abort the
/// batch.
pub fn building_accessibility(
    net: &RoutableNetwork,
    category: &str,
    distance: f64,
    buildings: &GeometryLayer,
) -> Result<AccessibilityTable> {
    let counts = poi_counts(net, category, distance)?;

    let scores = buildings
        .features()
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let label = feature
                .property_i64("id")
                .map(|id| id.to_string())
                .unwrap_or_else(|| i.to_string());
            let score = score_building(net, &counts, feature, i);
            if let Err(err) = &score {
                warn!(building = %label, %err, "building accessibility failed");
            }
            BuildingScore { label, score }
        })
        .collect::<Vec<_>>();

    debug!(
        category,
        distance,
        buildings = scores.len(),
        failed = scores.iter().filter(|s| s.score.is_err()).count(),
        "computed accessibility table"
    );
    Ok(AccessibilityTable { scores })
}

fn score_building(
    net: &RoutableNetwork,
    counts: &[f64],
    feature: &crate::model::Feature,
    index: usize,
) -> Result<f64> {
    let centroid = feature
        .centroid()
        .ok_or_else(|| Error::Lookup(format!("building feature {index} has no centroid")))?;
    let (node, _) = net.nearest_node(centroid.x(), centroid.y())?;
    Ok(counts[node])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Feature;
    use geo::{LineString, Point};
    use serde_json::{json, Map};

    fn network_with_parks() -> RoutableNetwork {
        let nodes = GeometryLayer::new(
            "nodes",
            [(1, 0.0), (2, 100.0), (3, 1000.0)]
                .iter()
                .map(|&(id, x)| {
                    let mut props = Map::new();
                    props.insert("id".into(), json!(id));
                    Feature::new(Point::new(x, 0.0).into(), props)
                })
                .collect(),
        );
        let edges = GeometryLayer::new(
            "edges",
            [(1, 2, 100.0), (2, 3, 900.0)]
                .iter()
                .map(|&(from, to, length)| {
                    let mut props = Map::new();
                    props.insert("from".into(), json!(from));
                    props.insert("to".into(), json!(to));
                    props.insert("length".into(), json!(length));
                    Feature::new(Point::new(0.0, 0.0).into(), props)
                })
                .collect(),
        );
        let mut net = RoutableNetwork::build(&nodes, &edges).unwrap();
        net.register_pois("parks", &[Point::new(0.0, 0.0)], 800.0, 10).unwrap();
        net
    }

    fn building(id: i64, x: f64, y: f64) -> Feature {
        let mut props = Map::new();
        props.insert("id".into(), json!(id));
        Feature::new(Point::new(x, y).into(), props)
    }

    #[test]
    fn test_counts_follow_threshold() {
        let net = network_with_parks();
        assert_eq!(poi_counts(&net, "parks", 800.0).unwrap(), vec![1.0, 1.0, 0.0]);
        assert_eq!(poi_counts(&net, "parks", 50.0).unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_counts_saturate_at_max_items() {
        let nodes = GeometryLayer::new(
            "nodes",
            vec![{
                let mut props = Map::new();
                props.insert("id".into(), json!(1));
                Feature::new(Point::new(0.0, 0.0).into(), props)
            }],
        );
        let edges = GeometryLayer::new("edges", vec![]);
        let mut net = RoutableNetwork::build(&nodes, &edges).unwrap();

        // Five parks all snap to the single node, but registration keeps two.
        let parks: Vec<Point<f64>> = (0..5).map(|i| Point::new(i as f64, 0.0)).collect();
        net.register_pois("parks", &parks, 800.0, 2).unwrap();
        assert_eq!(poi_counts(&net, "parks", 800.0).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_building_takes_nearest_node_count() {
        let net = network_with_parks();
        let buildings = GeometryLayer::new(
            "buildings",
            vec![building(10, 95.0, 5.0), building(11, 990.0, -3.0)],
        );
        let table = building_accessibility(&net, "parks", 800.0, &buildings).unwrap();
        assert_eq!(table.len(), 2);
        // Snaps to node 2 (count 1), not the closer-in-score node 3.
        assert_eq!(*table.scores()[0].score.as_ref().unwrap(), 1.0);
        assert_eq!(*table.scores()[1].score.as_ref().unwrap(), 0.0);
    }

    #[test]
    fn test_bad_building_fails_alone() {
        let net = network_with_parks();
        let empty_line: LineString<f64> = LineString::new(Vec::new());
        let buildings = GeometryLayer::new(
            "buildings",
            vec![
                building(10, 95.0, 5.0),
                Feature::new(empty_line.into(), Map::new()),
            ],
        );
        let table = building_accessibility(&net, "parks", 800.0, &buildings).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.scores()[0].score.is_ok());
        assert!(table.scores()[1].score.is_err());
        assert_eq!(table.failed_count(), 1);
        assert_eq!(table.scores()[1].label, "1");
    }
}
