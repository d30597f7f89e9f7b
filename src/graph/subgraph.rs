//! k-hop neighborhood extraction
//!
//! Breadth-first traversal over the undirected adjacency of a model, starting
//! at a focal node. Edges are followed in both directions; the result is the
//! subgraph induced by the visited nodes.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::debug;

use super::model::{GraphCatalog, GraphModel, GraphView};
use super::types::DetailLevel;

/// Neighborhood of a focal node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph<'a> {
    /// Focal node id, `None` when the focal id was unknown
    pub focal: Option<String>,
    pub hops: usize,
    pub view: GraphView<'a>,
    /// Hop distance from the focal node for every included node
    pub distances: BTreeMap<String, usize>,
}

impl Subgraph<'_> {
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn summary(&self) -> SubgraphSummary {
        SubgraphSummary {
            focal: self.focal.clone(),
            hops: self.hops,
            node_count: self.view.nodes.len(),
            edge_count: self.view.edges.len(),
        }
    }
}

/// Serializable counts for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphSummary {
    pub focal: Option<String>,
    pub hops: usize,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Extracts neighborhoods from either detail level of a catalog.
pub struct SubgraphExtractor<'c> {
    catalog: &'c GraphCatalog,
}

impl<'c> SubgraphExtractor<'c> {
    pub fn new(catalog: &'c GraphCatalog) -> Self {
        Self { catalog }
    }

    /// Extract the `hops`-hop neighborhood of `focal` at `level`.
    pub fn extract(&self, focal: &str, hops: usize, level: DetailLevel) -> Subgraph<'c> {
        extract_neighborhood(self.catalog.model(level), focal, hops)
    }
}

/// Extract the `hops`-hop neighborhood of `focal` from one model.
///
/// Unknown focal ids yield an empty subgraph. `hops == 0` yields the focal
/// node alone.
pub fn extract_neighborhood<'m>(model: &'m GraphModel, focal: &str, hops: usize) -> Subgraph<'m> {
    let Some(start) = model.node_index(focal) else {
        debug!(focal, "Focal node not in model, returning empty subgraph");
        return Subgraph {
            focal: None,
            hops,
            ..Default::default()
        };
    };

    let mut visited: HashSet<usize> = HashSet::new();
    let mut distance: Vec<(usize, usize)> = Vec::new();
    let mut queue = VecDeque::new();

    visited.insert(start);
    distance.push((start, 0));
    queue.push_back((start, 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= hops {
            continue;
        }
        for &next in model.neighbors(current) {
            if visited.insert(next) {
                distance.push((next, depth + 1));
                queue.push_back((next, depth + 1));
            }
        }
    }

    let view = model.induced_view(&visited);
    let distances = distance
        .into_iter()
        .map(|(idx, d)| (model.nodes()[idx].id.clone(), d))
        .collect();

    debug!(
        focal,
        hops,
        nodes = view.nodes.len(),
        edges = view.edges.len(),
        "Extracted neighborhood"
    );

    Subgraph {
        focal: Some(focal.to_string()),
        hops,
        view,
        distances,
    }
}
