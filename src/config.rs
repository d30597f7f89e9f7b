//! Layout configuration
//!
//! Every option has a default and out-of-range values are clamped by
//! [`LayoutConfig::sanitized`] instead of being rejected. Config files use the
//! same camelCase keys as the renderer:
//!
//! ```yaml
//! layerGap: 140
//! nodeSpacing:
//!   cause: 32
//!   intermediate: 64
//!   effect: 48
//! layoutAlgorithm: barycenter-tiered
//! typeLabels:
//!   cause: Root Factors
//! subgroupRegistry:
//!   ai: { label: AI Factors, color: "#7c3aed" }
//!   society: { label: Societal Factors, color: "#0ea5e9" }
//! defaultEdgeDensity: medium
//! ```

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::GraphError;
use crate::graph::dimensions::MIN_NODE_WIDTH;
use crate::graph::filter::EdgeDensity;
use crate::graph::types::NodeKind;

/// Upper bound for the barycenter pass count.
pub const MAX_BARYCENTER_PASSES: usize = 16;

/// Default number of barycenter sweeps.
pub const DEFAULT_BARYCENTER_PASSES: usize = 4;

// =============================================================================
// LAYOUT ALGORITHM
// =============================================================================

/// Positioning strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutAlgorithm {
    /// Three fixed tiers ordered by the barycenter heuristic
    #[default]
    BarycenterTiered,
    /// Generic layered layout with depth taken from edge direction
    ExternalLayered,
}

impl LayoutAlgorithm {
    /// `None` for names that match no algorithm.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "barycenter-tiered" | "barycenter" | "tiered" => Some(LayoutAlgorithm::BarycenterTiered),
            "external-layered" | "layered" | "hierarchical" => Some(LayoutAlgorithm::ExternalLayered),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutAlgorithm::BarycenterTiered => "barycenter-tiered",
            LayoutAlgorithm::ExternalLayered => "external-layered",
        }
    }
}

// =============================================================================
// PER-TIER SETTINGS
// =============================================================================

/// Horizontal gap between neighboring cards, per tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierSpacing {
    pub cause: f32,
    pub intermediate: f32,
    pub effect: f32,
}

impl Default for TierSpacing {
    fn default() -> Self {
        Self {
            cause: 40.0,
            intermediate: 60.0,
            effect: 40.0,
        }
    }
}

impl TierSpacing {
    pub fn for_kind(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Cause => self.cause,
            NodeKind::Intermediate => self.intermediate,
            NodeKind::Effect => self.effect,
        }
    }
}

/// Display name for each tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeLabels {
    pub cause: String,
    pub intermediate: String,
    pub effect: String,
}

impl Default for TypeLabels {
    fn default() -> Self {
        Self {
            cause: "Causes".to_string(),
            intermediate: "Intermediate Factors".to_string(),
            effect: "Effects".to_string(),
        }
    }
}

impl TypeLabels {
    pub fn label_for(&self, kind: NodeKind) -> &str {
        match kind {
            NodeKind::Cause => &self.cause,
            NodeKind::Intermediate => &self.intermediate,
            NodeKind::Effect => &self.effect,
        }
    }
}

// =============================================================================
// SUBGROUP REGISTRY
// =============================================================================

/// Label used for the synthetic bucket of unregistered subgroups.
pub const DEFAULT_SUBGROUP_LABEL: &str = "Other";

/// One registered cause subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgroupDef {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Ordered subgroup registry. Declaration order is layout order.
///
/// Deserializes from either a list of `{id, label, color}` entries or a map
/// of `id -> {label, color}` (map order is preserved).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubgroupRegistry {
    entries: Vec<SubgroupDef>,
}

impl SubgroupRegistry {
    pub fn new(entries: Vec<SubgroupDef>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            registry.insert(entry);
        }
        registry
    }

    /// Append a subgroup; re-registering an id replaces it in place.
    pub fn insert(&mut self, entry: SubgroupDef) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, id: &str) -> Option<&SubgroupDef> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Declaration position of a subgroup.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubgroupDef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
struct SubgroupStyle {
    label: String,
    #[serde(default)]
    color: Option<String>,
}

impl<'de> Deserialize<'de> for SubgroupRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = SubgroupRegistry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of subgroups or a map of subgroup id to {label, color}")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut registry = SubgroupRegistry::default();
                while let Some(entry) = seq.next_element::<SubgroupDef>()? {
                    registry.insert(entry);
                }
                Ok(registry)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut registry = SubgroupRegistry::default();
                while let Some((id, style)) = map.next_entry::<String, SubgroupStyle>()? {
                    if id.is_empty() {
                        return Err(de::Error::custom("subgroup id must not be empty"));
                    }
                    registry.insert(SubgroupDef {
                        id,
                        label: style.label,
                        color: style.color,
                    });
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_any(RegistryVisitor)
    }
}

// =============================================================================
// LAYOUT CONFIG
// =============================================================================

/// Options recognised by the layout pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Vertical gap between consecutive tiers
    pub layer_gap: f32,
    /// Horizontal gap between cards, per tier
    pub node_spacing: TierSpacing,
    /// Extra horizontal gap between neighboring cause subgroups
    pub subgroup_gap: f32,
    /// Fixed card width replacing the content estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_width_override: Option<f32>,
    pub layout_algorithm: LayoutAlgorithm,
    pub type_labels: TypeLabels,
    pub subgroup_registry: SubgroupRegistry,
    pub default_edge_density: EdgeDensity,
    /// Number of barycenter sweeps
    pub barycenter_passes: usize,
    /// Time budget for asynchronous layout backends
    pub async_timeout_ms: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layer_gap: 120.0,
            node_spacing: TierSpacing::default(),
            subgroup_gap: 48.0,
            node_width_override: None,
            layout_algorithm: LayoutAlgorithm::default(),
            type_labels: TypeLabels::default(),
            subgroup_registry: SubgroupRegistry::default(),
            default_edge_density: EdgeDensity::default(),
            barycenter_passes: DEFAULT_BARYCENTER_PASSES,
            async_timeout_ms: 5_000,
        }
    }
}

impl LayoutConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GraphError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config.sanitized())
    }

    pub fn from_json_str(json: &str) -> Result<Self, GraphError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn with_subgroups(mut self, registry: SubgroupRegistry) -> Self {
        self.subgroup_registry = registry;
        self
    }

    pub fn with_algorithm(mut self, algorithm: LayoutAlgorithm) -> Self {
        self.layout_algorithm = algorithm;
        self
    }

    /// Clamp every numeric option into its valid range.
    ///
    /// Non-finite values fall back to the default for that option.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.layer_gap = non_negative(self.layer_gap, defaults.layer_gap);
        self.subgroup_gap = non_negative(self.subgroup_gap, defaults.subgroup_gap);
        self.node_spacing = TierSpacing {
            cause: non_negative(self.node_spacing.cause, defaults.node_spacing.cause),
            intermediate: non_negative(
                self.node_spacing.intermediate,
                defaults.node_spacing.intermediate,
            ),
            effect: non_negative(self.node_spacing.effect, defaults.node_spacing.effect),
        };
        self.node_width_override = self
            .node_width_override
            .filter(|w| w.is_finite())
            .map(|w| w.max(MIN_NODE_WIDTH));
        self.barycenter_passes = self.barycenter_passes.clamp(1, MAX_BARYCENTER_PASSES);
        self.async_timeout_ms = self.async_timeout_ms.max(1);
        self
    }
}

fn non_negative(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}
