//! Proximity: k-nearest-POI distances for every network node.

use tracing::debug;

use crate::network::{NodeKey, RoutableNetwork};
use crate::{Error, Result};

use super::UNREACHABLE;

/// Per-node nearest-POI distances: one row per network node, exactly `k`
/// columns, sorted ascending, padded with [`UNREACHABLE`].
///
/// [`UNREACHABLE`]: super::UNREACHABLE
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTable {
    node_keys: Vec<NodeKey>,
    k: usize,
    values: Vec<f64>,
}

impl DistanceTable {
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of rows (network nodes).
    pub fn len(&self) -> usize {
        self.node_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_keys.is_empty()
    }

    pub fn node_keys(&self) -> &[NodeKey] {
        &self.node_keys
    }

    /// Row for the node at this internal index, or `None` out of range.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.node_keys.len() {
            return None;
        }
        Some(&self.values[index * self.k..(index + 1) * self.k])
    }

    pub fn rows(&self) -> impl Iterator<Item = (NodeKey, &[f64])> {
        self.node_keys.iter().copied().zip(self.values.chunks(self.k))
    }
}

/// Distances from every network node to its up-to-`k` nearest POIs within
/// `distance`.
///
/// Slots with no POI in range hold [`UNREACHABLE`] — never a spurious
/// distance. Results are capped by the category's registration bounds: no
/// value can exceed its `max_distance`, and `k` may not exceed its
/// `max_items` (that would silently under-report). Ties between
/// equal-distance POIs resolve in registration order, which is stable for a
/// fixed network.
pub fn nearest_pois(
    net: &RoutableNetwork,
    category: &str,
    distance: f64,
    k: usize,
) -> Result<DistanceTable> {
    let cat = net.poi_category(category)?;
    if k == 0 || k > cat.max_items() {
        return Err(Error::Lookup(format!(
            "k={k} outside the answerable range 1..={} for category `{category}`",
            cat.max_items()
        )));
    }

    let node_keys = net.node_keys();
    let mut values = Vec::with_capacity(node_keys.len() * k);
    for node in 0..node_keys.len() {
        let row = cat.distances(node);
        let in_range = row.iter().take_while(|&&d| d <= distance).take(k);
        let mut written = 0;
        for &d in in_range {
            values.push(d);
            written += 1;
        }
        values.resize(values.len() + (k - written), UNREACHABLE);
    }

    debug!(category, distance, k, nodes = node_keys.len(), "computed proximity table");
    Ok(DistanceTable { node_keys, k, values })
}
