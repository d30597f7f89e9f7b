//! Card size estimation
//!
//! Sizes are estimated from text length rather than measured, so the layout
//! can run without a rendering surface. The estimate is a pure function of
//! the node content and the optional width override.

use super::types::{Dimensions, Node, NodeVariant};

// =============================================================================
// SIZE CONSTANTS
// =============================================================================

/// Narrowest card the renderer can draw legibly
pub const MIN_NODE_WIDTH: f32 = 160.0;

/// Average glyph advance at the card font size
pub const CHAR_WIDTH: f32 = 7.0;

/// Horizontal padding inside a card (both sides)
pub const HORIZONTAL_PADDING: f32 = 32.0;

/// Height of a card with no sub-items
pub const BASE_HEIGHT: f32 = 48.0;

/// Height added per listed sub-item
pub const SUB_ITEM_HEIGHT: f32 = 22.0;

/// Cluster cards: fixed width, one extra row per `CLUSTER_MEMBERS_PER_ROW` members
pub const CLUSTER_WIDTH: f32 = 220.0;
const CLUSTER_MEMBERS_PER_ROW: usize = 4;
const CLUSTER_ROW_HEIGHT: f32 = 18.0;

/// Group cards are fixed size apart from a child counter strip
pub const GROUP_WIDTH: f32 = 260.0;
pub const GROUP_HEIGHT: f32 = 72.0;

/// Collapsed expandable cards show the label plus a disclosure row
const EXPANDABLE_COLLAPSED_HEIGHT: f32 = 56.0;

/// Estimate card dimensions for a node.
pub fn estimate_dimensions(node: &Node) -> Dimensions {
    match node.variant {
        NodeVariant::Standard => Dimensions {
            width: content_width(node),
            height: BASE_HEIGHT + node.sub_items.len() as f32 * SUB_ITEM_HEIGHT,
        },
        NodeVariant::Cluster { member_count } => {
            let rows = member_count.div_ceil(CLUSTER_MEMBERS_PER_ROW);
            Dimensions {
                width: CLUSTER_WIDTH.max(label_width(node)),
                height: BASE_HEIGHT + rows as f32 * CLUSTER_ROW_HEIGHT,
            }
        }
        NodeVariant::Expandable { expanded: true } => Dimensions {
            width: content_width(node),
            height: EXPANDABLE_COLLAPSED_HEIGHT + node.sub_items.len() as f32 * SUB_ITEM_HEIGHT,
        },
        NodeVariant::Expandable { expanded: false } => Dimensions {
            width: label_width(node),
            height: EXPANDABLE_COLLAPSED_HEIGHT,
        },
        NodeVariant::Group { .. } => Dimensions {
            width: GROUP_WIDTH,
            height: GROUP_HEIGHT,
        },
    }
}

/// Estimate dimensions, replacing the width when an override is configured.
///
/// The override is clamped to [`MIN_NODE_WIDTH`].
pub fn estimate_with_override(node: &Node, width_override: Option<f32>) -> Dimensions {
    let estimate = estimate_dimensions(node);
    match width_override {
        Some(width) if width.is_finite() => Dimensions {
            width: width.max(MIN_NODE_WIDTH),
            ..estimate
        },
        _ => estimate,
    }
}

/// Width driven by the longest of the label and sub-item labels.
fn content_width(node: &Node) -> f32 {
    let longest = node
        .sub_items
        .iter()
        .map(|item| item.label.chars().count())
        .chain(std::iter::once(node.label.chars().count()))
        .max()
        .unwrap_or(0);
    text_width(longest)
}

fn label_width(node: &Node) -> f32 {
    text_width(node.label.chars().count())
}

fn text_width(chars: usize) -> f32 {
    (CHAR_WIDTH * chars as f32 + HORIZONTAL_PADDING).max(MIN_NODE_WIDTH)
}
