//! Routable street network: graph construction, snapping, bounded search.
//!
//! Built once per city from a node layer (unique integer id + Point geometry)
//! and an edge layer (`from`/`to` ids + traversal cost). Inputs are indexed
//! defensively and never mutated.
//!
//! ## Invariants
//!
//! * Every edge endpoint must reference a node id present in the node layer.
//! * Node ids are unique within a city.
//!
//! Both are checked at build time, before any analysis can run.

mod poi;

pub use poi::PoiCategory;

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use geo::{Distance, Euclidean, Geometry, Length, Point};
use hashbrown::HashMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use smallvec::SmallVec;
use tracing::debug;

use crate::model::GeometryLayer;
use crate::{Error, Result};

// ============================================================================
// Node identity
// ============================================================================

/// Node identifier as it appears in the source layer. Distinct from the
/// internal graph index, which is dense and build-order dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub i64);

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct NetNode {
    key: NodeKey,
    point: Point<f64>,
}

type SnapItem = GeomWithData<[f64; 2], usize>;

// ============================================================================
// RoutableNetwork
// ============================================================================

/// A weighted, undirected street network with registered POI categories.
#[derive(Debug)]
pub struct RoutableNetwork {
    graph: UnGraph<NetNode, f64>,
    by_key: HashMap<i64, NodeIndex>,
    snap_index: RTree<SnapItem>,
    pois: HashMap<String, PoiCategory>,
}

impl RoutableNetwork {
    /// Assemble the network from node and edge layers.
    ///
    /// Node features must carry Point geometry and an integer `id` attribute.
    /// Edge features must carry integer `from`/`to` attributes; traversal
    /// cost comes from a `length` attribute when present, else the edge
    /// geometry's length, else the straight-line distance between endpoints.
    pub fn build(nodes: &GeometryLayer, edges: &GeometryLayer) -> Result<Self> {
        let mut graph = UnGraph::with_capacity(nodes.len(), edges.len());
        let mut by_key: HashMap<i64, NodeIndex> = HashMap::with_capacity(nodes.len());
        let mut snap_items = Vec::with_capacity(nodes.len());

        for (i, feature) in nodes.features().iter().enumerate() {
            let point = match &feature.geometry {
                Geometry::Point(p) => *p,
                other => {
                    return Err(Error::Format {
                        path: nodes.name().to_string(),
                        message: format!(
                            "node feature {i} has {} geometry, expected Point",
                            geometry_name(other)
                        ),
                    });
                }
            };
            let id = feature.property_i64("id").ok_or_else(|| Error::Format {
                path: nodes.name().to_string(),
                message: format!("node feature {i} is missing an integer `id` attribute"),
            })?;

            let idx = graph.add_node(NetNode { key: NodeKey(id), point });
            if by_key.insert(id, idx).is_some() {
                return Err(Error::ReferentialIntegrity(format!(
                    "duplicate node id {id} in {}",
                    nodes.name()
                )));
            }
            snap_items.push(GeomWithData::new([point.x(), point.y()], idx.index()));
        }

        for (i, feature) in edges.features().iter().enumerate() {
            let from = feature.property_i64("from").ok_or_else(|| Error::Format {
                path: edges.name().to_string(),
                message: format!("edge feature {i} is missing an integer `from` attribute"),
            })?;
            let to = feature.property_i64("to").ok_or_else(|| Error::Format {
                path: edges.name().to_string(),
                message: format!("edge feature {i} is missing an integer `to` attribute"),
            })?;

            let from_idx = *by_key.get(&from).ok_or_else(|| {
                Error::ReferentialIntegrity(format!(
                    "edge feature {i} references unknown node id {from}"
                ))
            })?;
            let to_idx = *by_key.get(&to).ok_or_else(|| {
                Error::ReferentialIntegrity(format!(
                    "edge feature {i} references unknown node id {to}"
                ))
            })?;

            let weight = match feature.property_f64("length") {
                Some(len) => len,
                None => match &feature.geometry {
                    Geometry::LineString(line) => Euclidean.length(line),
                    _ => Euclidean.distance(graph[from_idx].point, graph[to_idx].point),
                },
            };
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Format {
                    path: edges.name().to_string(),
                    message: format!("edge feature {i} has invalid weight {weight}"),
                });
            }

            graph.add_edge(from_idx, to_idx, weight);
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built routable network"
        );

        Ok(Self {
            graph,
            by_key,
            snap_index: RTree::bulk_load(snap_items),
            pois: HashMap::new(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Source-layer node keys, ordered by internal node index.
    pub fn node_keys(&self) -> Vec<NodeKey> {
        self.graph.node_weights().map(|n| n.key).collect()
    }

    pub fn node_position(&self, index: usize) -> Option<Point<f64>> {
        self.graph.node_weight(NodeIndex::new(index)).map(|n| n.point)
    }

    /// Internal index of the node with this source-layer key.
    pub fn node_index(&self, key: NodeKey) -> Option<usize> {
        self.by_key.get(&key.0).map(|idx| idx.index())
    }

    /// Nearest network node to `(x, y)`: `(node index, snap distance)`.
    ///
    /// Fails with [`Error::Lookup`] on an empty network.
    pub fn nearest_node(&self, x: f64, y: f64) -> Result<(usize, f64)> {
        let item = self
            .snap_index
            .nearest_neighbor(&[x, y])
            .ok_or_else(|| Error::Lookup(format!("no node resolvable near ({x}, {y}): empty network")))?;
        let [nx, ny] = *item.geom();
        Ok((item.data, (nx - x).hypot(ny - y)))
    }

    /// The registered POI category with this name.
    pub fn poi_category(&self, name: &str) -> Result<&PoiCategory> {
        self.pois
            .get(name)
            .ok_or_else(|| Error::Lookup(format!("unknown POI category `{name}`")))
    }

    /// Register a POI category against this network.
    ///
    /// Each point is snapped to its nearest node, then a cost-bounded search
    /// records, for every node reached within `max_distance`, the network
    /// distance to that POI. Per-node lists are kept sorted ascending and
    /// truncated to `max_items`, which fixes the cost of later queries.
    /// Re-registering a name replaces the previous category.
    pub fn register_pois(
        &mut self,
        name: &str,
        points: &[Point<f64>],
        max_distance: f64,
        max_items: usize,
    ) -> Result<()> {
        if self.graph.node_count() == 0 {
            return Err(Error::Lookup(format!(
                "cannot register POI category `{name}` on an empty network"
            )));
        }

        let mut reach: Vec<SmallVec<[f64; 4]>> =
            vec![SmallVec::new(); self.graph.node_count()];
        for point in points {
            let (snap, _) = self.nearest_node(point.x(), point.y())?;
            for (node, dist) in self.bounded_dijkstra(NodeIndex::new(snap), max_distance) {
                let row = &mut reach[node];
                // `<=` keeps equal distances in registration order.
                let pos = row.partition_point(|&d| d <= dist);
                if pos < max_items {
                    row.insert(pos, dist);
                    row.truncate(max_items);
                }
            }
        }

        debug!(
            category = name,
            pois = points.len(),
            max_distance,
            max_items,
            "registered POI category"
        );
        self.pois.insert(
            name.to_string(),
            PoiCategory::new(max_distance, max_items, points.len(), reach),
        );
        Ok(())
    }

    /// Single-source shortest paths, pruned at `cutoff`. Returns every
    /// reached `(node index, distance)` including the source at zero.
    fn bounded_dijkstra(&self, source: NodeIndex, cutoff: f64) -> Vec<(usize, f64)> {
        let mut best = vec![f64::INFINITY; self.graph.node_count()];
        let mut heap = BinaryHeap::new();
        best[source.index()] = 0.0;
        heap.push(Reverse(HeapEntry { dist: 0.0, node: source }));

        while let Some(Reverse(HeapEntry { dist, node })) = heap.pop() {
            if dist > best[node.index()] {
                continue; // stale entry
            }
            for edge in self.graph.edges(node) {
                let next = edge.target();
                let cand = dist + *edge.weight();
                if cand <= cutoff && cand < best[next.index()] {
                    best[next.index()] = cand;
                    heap.push(Reverse(HeapEntry { dist: cand, node: next }));
                }
            }
        }

        best.into_iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .collect()
    }
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        _ => "unsupported",
    }
}

// ============================================================================
// Heap entry for bounded Dijkstra
// ============================================================================

#[derive(Clone, Copy)]
struct HeapEntry {
    dist: f64,
    node: NodeIndex,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.node.cmp(&other.node))
    }
}

// ============================================================================
// Tests
// ============================================================================
