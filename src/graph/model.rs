//! Immutable in-memory graph for one detail level
//!
//! A `GraphModel` is built once from an authored dataset and then shared by
//! reference with the filter engine, the subgraph extractor and the
//! orchestrator. Loading is forgiving: dangling edges and duplicate ids are
//! dropped and counted, never fatal.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

use super::types::{Category, CategoryInfo, DetailLevel, Edge, Node, Subcategory};
use crate::error::GraphError;

// =============================================================================
// DATASET
// =============================================================================

/// Raw authored dataset as read from the content store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDataset {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl GraphDataset {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GraphError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a dataset file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

/// Diagnostics collected while building a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Edges whose source or target is not a loaded node
    pub dropped_edges: usize,
    /// Nodes skipped because their id was already taken
    pub duplicate_nodes: usize,
    /// Edges skipped because their id was already taken
    pub duplicate_edges: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_edges == 0 && self.duplicate_nodes == 0 && self.duplicate_edges == 0
    }
}

// =============================================================================
// GRAPH MODEL
// =============================================================================

/// Read-only graph for one detail level.
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    categories: Vec<Category>,
    node_index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    report: LoadReport,
}

impl GraphModel {
    /// Build a model, dropping dangling edges and duplicate ids.
    pub fn from_dataset(dataset: GraphDataset) -> Self {
        let GraphDataset {
            nodes: raw_nodes,
            edges: raw_edges,
            categories,
        } = dataset;

        let mut report = LoadReport::default();

        let mut nodes = Vec::with_capacity(raw_nodes.len());
        let mut node_index = HashMap::with_capacity(raw_nodes.len());
        for node in raw_nodes {
            if node_index.contains_key(&node.id) {
                report.duplicate_nodes += 1;
                continue;
            }
            node_index.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        let mut edge_ids = HashSet::with_capacity(raw_edges.len());
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for edge in raw_edges {
            let (Some(&from), Some(&to)) =
                (node_index.get(&edge.source), node_index.get(&edge.target))
            else {
                report.dropped_edges += 1;
                continue;
            };
            if !edge_ids.insert(edge.id.clone()) {
                report.duplicate_edges += 1;
                continue;
            }

            adjacency[from].push(to);
            if from != to {
                adjacency[to].push(from);
            }
            edges.push(edge);
        }

        if !report.is_clean() {
            warn!(
                dropped_edges = report.dropped_edges,
                duplicate_nodes = report.duplicate_nodes,
                duplicate_edges = report.duplicate_edges,
                "Graph dataset contained unusable entries"
            );
        }

        let categories = resolve_categories(categories, &nodes);

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            categories = categories.len(),
            "Graph model loaded"
        );

        Self {
            nodes,
            edges,
            categories,
            node_index,
            adjacency,
            report,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, GraphError> {
        GraphDataset::from_yaml_str(yaml).map(Self::from_dataset)
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        GraphDataset::from_json_str(json).map(Self::from_dataset)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        GraphDataset::from_path(path).map(Self::from_dataset)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category rows for the filter panel.
    pub fn list_categories(&self) -> Vec<CategoryInfo> {
        self.categories.iter().map(CategoryInfo::from).collect()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Undirected neighbor indices of a node, in edge order.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// View over every node and edge.
    pub fn full_view(&self) -> GraphView<'_> {
        GraphView {
            nodes: self.nodes.iter().collect(),
            edges: self.edges.iter().collect(),
        }
    }

    /// View over the given node indices plus every edge between them.
    ///
    /// Output keeps model order regardless of the order of `indices`.
    pub fn induced_view(&self, indices: &HashSet<usize>) -> GraphView<'_> {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, n)| n)
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| {
                self.node_index(&e.source).is_some_and(|i| indices.contains(&i))
                    && self.node_index(&e.target).is_some_and(|i| indices.contains(&i))
            })
            .collect();
        GraphView { nodes, edges }
    }
}

/// Fill in node counts and derive categories when the dataset declares none.
fn resolve_categories(declared: Vec<Category>, nodes: &[Node]) -> Vec<Category> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for node in nodes {
        if let Some(category) = node.category.as_deref() {
            *counts.entry(category).or_default() += 1;
        }
    }

    if !declared.is_empty() {
        return declared
            .into_iter()
            .map(|mut category| {
                category.node_count = counts.get(category.id.as_str()).copied().unwrap_or(0);
                category
            })
            .collect();
    }

    let mut derived: Vec<Category> = Vec::new();
    for node in nodes {
        let Some(id) = node.category.as_deref() else {
            continue;
        };
        let pos = match derived.iter().position(|c| c.id == id) {
            Some(pos) => pos,
            None => {
                derived.push(Category {
                    id: id.to_string(),
                    label: id.to_string(),
                    kind: node.kind,
                    subgroup: node.subgroup.clone(),
                    node_count: counts.get(id).copied().unwrap_or(0),
                    subcategories: Vec::new(),
                });
                derived.len() - 1
            }
        };
        if let Some(sub) = node.subcategory.as_deref() {
            let category = &mut derived[pos];
            if !category.subcategories.iter().any(|s| s.id == sub) {
                category.subcategories.push(Subcategory {
                    id: sub.to_string(),
                    label: sub.to_string(),
                });
            }
        }
    }
    derived
}

// =============================================================================
// GRAPH VIEW
// =============================================================================

/// Borrowed node/edge subset handed to the layout stage.
///
/// Produced by the filter engine, the subgraph extractor, or
/// [`GraphModel::full_view`]. Nodes and edges keep model order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphView<'a> {
    pub nodes: Vec<&'a Node>,
    pub edges: Vec<&'a Edge>,
}

impl<'a> GraphView<'a> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> Vec<&'a str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn edge_ids(&self) -> Vec<&'a str> {
        self.edges.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// The two parallel models of one graph, one per detail level.
#[derive(Debug, Clone)]
pub struct GraphCatalog {
    overview: GraphModel,
    detailed: GraphModel,
}

impl GraphCatalog {
    pub fn new(overview: GraphModel, detailed: GraphModel) -> Self {
        Self { overview, detailed }
    }

    pub fn model(&self, level: DetailLevel) -> &GraphModel {
        match level {
            DetailLevel::Overview => &self.overview,
            DetailLevel::Detailed => &self.detailed,
        }
    }
}
