//! Graph data types shared by the layout and query engines
//!
//! Input types (`Node`, `Edge`, `Category`) mirror the authored dataset and
//! deserialize from YAML/JSON with camelCase keys. Output types
//! (`PositionedNode`, `StyledEdge`, `GroupContainer`) are what the renderer
//! consumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// NODE KIND & VARIANT
// =============================================================================

/// Causal role of a node. Determines its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Cause,
    Intermediate,
    Effect,
}

impl NodeKind {
    /// All kinds in tier order (top to bottom).
    pub const ALL: [NodeKind; 3] = [NodeKind::Cause, NodeKind::Intermediate, NodeKind::Effect];

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cause" | "root" | "factor" => Some(NodeKind::Cause),
            "intermediate" | "scenario" => Some(NodeKind::Intermediate),
            "effect" | "outcome" => Some(NodeKind::Effect),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Cause => "cause",
            NodeKind::Intermediate => "intermediate",
            NodeKind::Effect => "effect",
        }
    }

    /// Zero-based tier index (cause = 0).
    pub fn tier_index(&self) -> usize {
        match self {
            NodeKind::Cause => 0,
            NodeKind::Intermediate => 1,
            NodeKind::Effect => 2,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render shape of a node.
///
/// Closed set: dimension estimation dispatches exhaustively over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum NodeVariant {
    /// Regular card: label plus optional sub-item list
    #[default]
    Standard,
    /// Collapsed cluster standing in for several member nodes
    Cluster { member_count: usize },
    /// Card that toggles between a compact header and the full sub-item list
    Expandable { expanded: bool },
    /// Container card summarising a set of child nodes
    Group { child_count: usize },
}

// =============================================================================
// NODE
// =============================================================================

/// Entry in a node's ordered sub-item list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings: Option<BTreeMap<String, f64>>,
}

/// A factor in the causal graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Key into the subgroup registry (only meaningful for causes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Filter category this node belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Explicit rank within its tier bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<SubItem>,
    #[serde(default)]
    pub variant: NodeVariant,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            subgroup: None,
            subcategory: None,
            category: None,
            order: None,
            description: None,
            sub_items: Vec::new(),
            variant: NodeVariant::Standard,
        }
    }

    pub fn with_subgroup(mut self, subgroup: impl Into<String>) -> Self {
        self.subgroup = Some(subgroup.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_sub_items<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_items = labels
            .into_iter()
            .map(|label| SubItem {
                label: label.into(),
                ..Default::default()
            })
            .collect();
        self
    }

    pub fn with_variant(mut self, variant: NodeVariant) -> Self {
        self.variant = variant;
        self
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// How strongly the source drives the target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStrength {
    Weak,
    #[default]
    Medium,
    Strong,
}

impl EdgeStrength {
    /// Ordinal rank, weak = 0.
    pub fn rank(&self) -> u8 {
        match self {
            EdgeStrength::Weak => 0,
            EdgeStrength::Medium => 1,
            EdgeStrength::Strong => 2,
        }
    }
}

/// How well-supported the causal link is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeConfidence {
    Low,
    #[default]
    Medium,
    High,
}

impl EdgeConfidence {
    /// Ordinal rank, low = 0.
    pub fn rank(&self) -> u8 {
        match self {
            EdgeConfidence::Low => 0,
            EdgeConfidence::Medium => 1,
            EdgeConfidence::High => 2,
        }
    }
}

/// Direction of influence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeEffect {
    #[default]
    Increases,
    Decreases,
    Mixed,
}

/// A directed causal link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub strength: EdgeStrength,
    #[serde(default)]
    pub confidence: EdgeConfidence,
    #[serde(default)]
    pub effect: EdgeEffect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            strength: EdgeStrength::default(),
            confidence: EdgeConfidence::default(),
            effect: EdgeEffect::default(),
            label: None,
        }
    }

    pub fn with_strength(mut self, strength: EdgeStrength) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_confidence(mut self, confidence: EdgeConfidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_effect(mut self, effect: EdgeEffect) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Combined ordinal importance: strength dominates, confidence breaks ties.
    /// Range `0..=8`.
    pub fn importance(&self) -> u8 {
        self.strength.rank() * 3 + self.confidence.rank()
    }
}

// =============================================================================
// CATEGORIES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// Filter metadata describing one node category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<String>,
    #[serde(default)]
    pub node_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<Subcategory>,
}

/// Summary row for building filter toggle controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub node_count: usize,
}

impl From<&Category> for CategoryInfo {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            label: category.label.clone(),
            kind: category.kind,
            node_count: category.node_count,
        }
    }
}

// =============================================================================
// DETAIL LEVEL
// =============================================================================

/// Which node table a view is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Coarse category nodes
    #[default]
    Overview,
    /// Full granular node set
    Detailed,
}

impl DetailLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "overview" => Some(DetailLevel::Overview),
            "detailed" | "detail" | "full" => Some(DetailLevel::Detailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Overview => "overview",
            DetailLevel::Detailed => "detailed",
        }
    }
}

// =============================================================================
// LAYOUT OUTPUT
// =============================================================================

/// Width/height estimate for a node card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

/// A node with its computed top-left position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PositionedNode {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Arrowhead drawn at the target end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    ArrowClosed,
}

/// Edge label rendered on a background chip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeLabel {
    pub text: String,
    pub background_token: String,
}

/// An edge decorated with its visual weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub stroke_width: f32,
    pub color_token: String,
    pub marker_kind: MarkerKind,
    pub opacity: f32,
    pub effect: EdgeEffect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<EdgeLabel>,
}

/// Non-interactive background box around a tier or subgroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupContainer {
    /// `tier:<kind>` or `subgroup:<id>`
    pub scope_id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}
