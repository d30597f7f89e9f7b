//! Edge styling
//!
//! Maps edge metadata to stroke weight and opacity. All edges share one
//! neutral color token; strength is conveyed by width alone.

use super::types::{Edge, EdgeConfidence, EdgeLabel, EdgeStrength, MarkerKind, StyledEdge};

// =============================================================================
// STYLE TOKENS
// =============================================================================

/// Stroke color for every edge
pub const EDGE_COLOR_TOKEN: &str = "edge-neutral";

/// Background for edge label chips
pub const LABEL_BACKGROUND_TOKEN: &str = "edge-label-bg";

/// Stroke width for a strength level
pub fn stroke_width(strength: EdgeStrength) -> f32 {
    match strength {
        EdgeStrength::Weak => 1.0,
        EdgeStrength::Medium => 2.0,
        EdgeStrength::Strong => 3.5,
    }
}

/// Opacity for a confidence level
pub fn opacity(confidence: EdgeConfidence) -> f32 {
    match confidence {
        EdgeConfidence::Low => 0.5,
        EdgeConfidence::Medium => 0.75,
        EdgeConfidence::High => 1.0,
    }
}

/// Decorate an edge for rendering.
pub fn style_edge(edge: &Edge) -> StyledEdge {
    StyledEdge {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        stroke_width: stroke_width(edge.strength),
        color_token: EDGE_COLOR_TOKEN.to_string(),
        marker_kind: MarkerKind::ArrowClosed,
        opacity: opacity(edge.confidence),
        effect: edge.effect,
        label: edge.label.as_ref().map(|text| EdgeLabel {
            text: text.clone(),
            background_token: LABEL_BACKGROUND_TOKEN.to_string(),
        }),
    }
}

/// Style a set of edges, preserving order.
pub fn style_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Vec<StyledEdge> {
    edges.into_iter().map(style_edge).collect()
}
