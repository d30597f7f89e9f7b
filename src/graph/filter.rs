//! Visibility filtering
//!
//! A node is visible when every toggle that applies to it is on. Toggles are
//! keyed by id in four dimensions (category, subgroup, kind, subcategory); a
//! node only participates in the dimensions for which it carries a value, and
//! an id missing from a toggle map counts as on.
//!
//! Edges additionally pass an importance cut. Each edge is ranked against
//! every edge of the model, so the cut for an edge never depends on which
//! other edges happen to be visible:
//!
//! ```text
//! visible(e) = visible(source) && visible(target)
//!           && (density == all || outranked(e) / total < fraction(density))
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use super::model::{GraphModel, GraphView};
use super::types::{CategoryInfo, Edge, Node, NodeKind};
use crate::config::LayoutConfig;

/// Number of distinct importance scores (`Edge::importance` is `0..=8`).
const IMPORTANCE_LEVELS: usize = 9;

// =============================================================================
// EDGE DENSITY
// =============================================================================

/// How much of the edge set to show, by importance percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDensity {
    Minimal,
    Low,
    #[default]
    Medium,
    High,
    All,
}

impl EdgeDensity {
    /// Sparsest first.
    pub const ALL_LEVELS: [EdgeDensity; 5] = [
        EdgeDensity::Minimal,
        EdgeDensity::Low,
        EdgeDensity::Medium,
        EdgeDensity::High,
        EdgeDensity::All,
    ];

    /// Share of the edge set, from the top of the importance ranking, kept at this level.
    pub fn fraction(&self) -> f64 {
        match self {
            EdgeDensity::Minimal => 0.10,
            EdgeDensity::Low => 0.25,
            EdgeDensity::Medium => 0.50,
            EdgeDensity::High => 0.75,
            EdgeDensity::All => 1.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "minimal" | "min" => Some(EdgeDensity::Minimal),
            "low" => Some(EdgeDensity::Low),
            "medium" | "med" => Some(EdgeDensity::Medium),
            "high" => Some(EdgeDensity::High),
            "all" | "full" => Some(EdgeDensity::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeDensity::Minimal => "minimal",
            EdgeDensity::Low => "low",
            EdgeDensity::Medium => "medium",
            EdgeDensity::High => "high",
            EdgeDensity::All => "all",
        }
    }
}

// =============================================================================
// FILTER STATE
// =============================================================================

/// Caller-owned filter state. Passed unchanged into every pipeline call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphFilters {
    pub categories: BTreeMap<String, bool>,
    pub subgroups: BTreeMap<String, bool>,
    /// Keyed by `NodeKind::as_str`
    pub kinds: BTreeMap<String, bool>,
    pub subcategories: BTreeMap<String, bool>,
    pub edge_density: EdgeDensity,
}

impl GraphFilters {
    pub fn new(edge_density: EdgeDensity) -> Self {
        Self {
            edge_density,
            ..Default::default()
        }
    }

    /// Empty toggle maps with the configured default density.
    pub fn with_defaults(config: &LayoutConfig) -> Self {
        Self::new(config.default_edge_density)
    }

    pub fn set_category(&mut self, id: impl Into<String>, visible: bool) {
        self.categories.insert(id.into(), visible);
    }

    pub fn set_subgroup(&mut self, id: impl Into<String>, visible: bool) {
        self.subgroups.insert(id.into(), visible);
    }

    pub fn set_kind(&mut self, kind: NodeKind, visible: bool) {
        self.kinds.insert(kind.as_str().to_string(), visible);
    }

    pub fn set_subcategory(&mut self, id: impl Into<String>, visible: bool) {
        self.subcategories.insert(id.into(), visible);
    }

    pub fn set_edge_density(&mut self, density: EdgeDensity) {
        self.edge_density = density;
    }
}

fn toggle_on(toggles: &BTreeMap<String, bool>, id: Option<&str>) -> bool {
    match id {
        Some(id) => toggles.get(id).copied().unwrap_or(true),
        None => true,
    }
}

/// Visible/total counts for the filter panel summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleCounts {
    pub visible_nodes: usize,
    pub total_nodes: usize,
    pub visible_edges: usize,
    pub total_edges: usize,
}

// =============================================================================
// FILTER ENGINE
// =============================================================================

/// Evaluates [`GraphFilters`] against one model.
#[derive(Debug, Clone)]
pub struct FilterEngine<'m> {
    model: &'m GraphModel,
    /// For each importance score, how many model edges score strictly higher
    outranked: [usize; IMPORTANCE_LEVELS],
}

impl<'m> FilterEngine<'m> {
    pub fn new(model: &'m GraphModel) -> Self {
        let mut histogram = [0usize; IMPORTANCE_LEVELS];
        for edge in model.edges() {
            histogram[importance_slot(edge)] += 1;
        }

        let mut outranked = [0usize; IMPORTANCE_LEVELS];
        let mut above = 0;
        for score in (0..IMPORTANCE_LEVELS).rev() {
            outranked[score] = above;
            above += histogram[score];
        }

        Self { model, outranked }
    }

    pub fn model(&self) -> &'m GraphModel {
        self.model
    }

    pub fn list_categories(&self) -> Vec<CategoryInfo> {
        self.model.list_categories()
    }

    /// Turn on every toggle the model knows about.
    pub fn show_all(&self, filters: &mut GraphFilters) {
        self.set_all(filters, true);
    }

    /// Turn off every toggle the model knows about. Edge density is kept.
    pub fn hide_all(&self, filters: &mut GraphFilters) {
        self.set_all(filters, false);
    }

    fn set_all(&self, filters: &mut GraphFilters, visible: bool) {
        for category in self.model.categories() {
            filters.set_category(category.id.clone(), visible);
            if let Some(subgroup) = &category.subgroup {
                filters.set_subgroup(subgroup.clone(), visible);
            }
            for sub in &category.subcategories {
                filters.set_subcategory(sub.id.clone(), visible);
            }
        }
        for node in self.model.nodes() {
            if let Some(category) = &node.category {
                filters.set_category(category.clone(), visible);
            }
            if let Some(subgroup) = &node.subgroup {
                filters.set_subgroup(subgroup.clone(), visible);
            }
            if let Some(sub) = &node.subcategory {
                filters.set_subcategory(sub.clone(), visible);
            }
        }
        for kind in NodeKind::ALL {
            filters.set_kind(kind, visible);
        }
    }

    pub fn is_node_visible(&self, filters: &GraphFilters, node: &Node) -> bool {
        toggle_on(&filters.kinds, Some(node.kind.as_str()))
            && toggle_on(&filters.categories, node.category.as_deref())
            && toggle_on(&filters.subgroups, node.subgroup.as_deref())
            && toggle_on(&filters.subcategories, node.subcategory.as_deref())
    }

    /// True when the edge clears the importance cut for `density`.
    ///
    /// An edge passes when the share of edges scoring strictly higher is
    /// below the level's fraction. Edges with equal scores always pass or
    /// fail together, so a dataset where every edge has the same score shows
    /// all of them at every level.
    pub fn passes_density(&self, edge: &Edge, density: EdgeDensity) -> bool {
        if density == EdgeDensity::All {
            return true;
        }
        let total = self.model.edge_count();
        if total == 0 {
            return true;
        }
        let outranked = self.outranked[importance_slot(edge)];
        (outranked as f64) < density.fraction() * total as f64
    }

    /// Edge visibility, resolving endpoints through the model.
    pub fn is_edge_visible(&self, filters: &GraphFilters, edge: &Edge) -> bool {
        let endpoint_visible = |id: &str| {
            self.model
                .node(id)
                .is_some_and(|node| self.is_node_visible(filters, node))
        };
        endpoint_visible(&edge.source)
            && endpoint_visible(&edge.target)
            && self.passes_density(edge, filters.edge_density)
    }

    /// Visible subset of the whole model.
    pub fn apply(&self, filters: &GraphFilters) -> GraphView<'m> {
        let view = self.restrict(&self.model.full_view(), filters);
        debug!(
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            density = filters.edge_density.as_str(),
            "Applied graph filters"
        );
        view
    }

    /// Visible subset of an already narrowed view, e.g. a neighborhood.
    pub fn restrict(&self, view: &GraphView<'m>, filters: &GraphFilters) -> GraphView<'m> {
        let nodes: Vec<&'m Node> = view
            .nodes
            .iter()
            .copied()
            .filter(|node| self.is_node_visible(filters, node))
            .collect();
        let visible_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = view
            .edges
            .iter()
            .copied()
            .filter(|edge| {
                visible_ids.contains(edge.source.as_str())
                    && visible_ids.contains(edge.target.as_str())
                    && self.passes_density(edge, filters.edge_density)
            })
            .collect();
        GraphView { nodes, edges }
    }

    pub fn visible_counts(&self, filters: &GraphFilters) -> VisibleCounts {
        let view = self.restrict(&self.model.full_view(), filters);
        VisibleCounts {
            visible_nodes: view.nodes.len(),
            total_nodes: self.model.node_count(),
            visible_edges: view.edges.len(),
            total_edges: self.model.edge_count(),
        }
    }
}

fn importance_slot(edge: &Edge) -> usize {
    usize::from(edge.importance()).min(IMPORTANCE_LEVELS - 1)
}
