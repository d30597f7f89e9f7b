//! Generic layered layout
//!
//! Alternative to the tiered engine that ignores node kinds and derives
//! layers from edge direction alone:
//!
//! 1. Roots are nodes with no incoming edge (self-loops don't count)
//! 2. BFS from the roots along edge direction; first visit sets the depth
//! 3. Edges pointing to the same or a shallower layer are back-edges and
//!    take no part in placement
//! 4. Nodes no root reaches go on one trailing layer
//! 5. Each layer is sorted by id and centered on `ROW_CENTER_X`

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use super::dimensions::estimate_with_override;
use super::layout::{NodeLayout, ROW_CENTER_X, TOP_MARGIN};
use super::model::GraphView;
use super::types::{Dimensions, PositionedNode};
use crate::config::LayoutConfig;

/// Layer index per view node plus the edges that point back up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerAssignment {
    /// Depth per view node, in view order
    pub depths: Vec<usize>,
    /// Ids of edges whose target is not deeper than their source
    pub back_edges: Vec<String>,
    /// Number of nodes placed on the trailing orphan layer
    pub orphans: usize,
}

impl LayerAssignment {
    pub fn layer_count(&self) -> usize {
        self.depths.iter().max().map_or(0, |d| d + 1)
    }
}

/// Assign every node of `view` to a layer.
pub fn assign_layers(view: &GraphView<'_>) -> LayerAssignment {
    let index: HashMap<&str, usize> = view
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); view.nodes.len()];
    let mut has_incoming = vec![false; view.nodes.len()];
    let mut links: Vec<(usize, usize, &str)> = Vec::new();
    for edge in &view.edges {
        let (Some(&from), Some(&to)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) else {
            continue;
        };
        links.push((from, to, edge.id.as_str()));
        if from != to {
            children[from].push(to);
            has_incoming[to] = true;
        }
    }

    let mut depth: Vec<Option<usize>> = vec![None; view.nodes.len()];
    let mut queue = VecDeque::new();
    for (i, incoming) in has_incoming.iter().enumerate() {
        if !incoming {
            depth[i] = Some(0);
            queue.push_back(i);
        }
    }

    while let Some(current) = queue.pop_front() {
        let next = depth[current].map_or(0, |d| d + 1);
        for &child in &children[current] {
            if depth[child].is_none() {
                depth[child] = Some(next);
                queue.push_back(child);
            }
        }
    }

    let trailing = depth.iter().flatten().max().map_or(0, |d| d + 1);
    let orphans = depth.iter().filter(|d| d.is_none()).count();
    let depths: Vec<usize> = depth.into_iter().map(|d| d.unwrap_or(trailing)).collect();

    let back_edges = links
        .into_iter()
        .filter(|&(from, to, _)| depths[to] <= depths[from])
        .map(|(_, _, id)| id.to_string())
        .collect();

    LayerAssignment {
        depths,
        back_edges,
        orphans,
    }
}

/// Layered layout keyed on edge direction rather than node kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayoutEngine;

impl LayeredLayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay out `view`. One positioned node per view node, in view order.
    /// Out-of-range config values are clamped first.
    pub fn layout(&self, view: &GraphView<'_>, config: &LayoutConfig) -> NodeLayout {
        if view.nodes.is_empty() {
            return NodeLayout::default();
        }

        let config = &config.clone().sanitized();
        let assignment = assign_layers(view);
        let dims: Vec<Dimensions> = view
            .nodes
            .iter()
            .map(|n| estimate_with_override(n, config.node_width_override))
            .collect();

        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); assignment.layer_count()];
        for (i, &d) in assignment.depths.iter().enumerate() {
            layers[d].push(i);
        }
        for layer in &mut layers {
            layer.sort_by(|&a, &b| view.nodes[a].id.cmp(&view.nodes[b].id));
        }

        let mut positions: Vec<(f32, f32)> = vec![(0.0, 0.0); view.nodes.len()];
        let mut y = TOP_MARGIN;
        for layer in layers.iter().filter(|l| !l.is_empty()) {
            let gaps: Vec<f32> = layer
                .windows(2)
                .map(|pair| {
                    let left = config.node_spacing.for_kind(view.nodes[pair[0]].kind);
                    let right = config.node_spacing.for_kind(view.nodes[pair[1]].kind);
                    left.max(right)
                })
                .collect();
            let width: f32 =
                layer.iter().map(|&i| dims[i].width).sum::<f32>() + gaps.iter().sum::<f32>();

            let mut x = ROW_CENTER_X - width / 2.0;
            for (slot, &i) in layer.iter().enumerate() {
                positions[i] = (x, y);
                x += dims[i].width + gaps.get(slot).copied().unwrap_or(0.0);
            }

            let tallest = layer.iter().map(|&i| dims[i].height).fold(0.0, f32::max);
            y += tallest + config.layer_gap;
        }

        debug!(
            nodes = view.nodes.len(),
            layers = assignment.layer_count(),
            back_edges = assignment.back_edges.len(),
            orphans = assignment.orphans,
            "Layered layout complete"
        );

        let nodes = view
            .nodes
            .iter()
            .zip(dims)
            .zip(positions)
            .map(|((node, dims), (x, y))| PositionedNode {
                id: node.id.clone(),
                x,
                y,
                width: dims.width,
                height: dims.height,
            })
            .collect();

        NodeLayout {
            nodes,
            containers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierSpacing;
    use crate::graph::model::{GraphDataset, GraphModel};
    use crate::graph::types::{Edge, Node, NodeKind};
    use pretty_assertions::assert_eq;

    fn model(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        GraphModel::from_dataset(GraphDataset {
            nodes: nodes
                .iter()
                .map(|id| Node::new(*id, id.to_uppercase(), NodeKind::Intermediate))
                .collect(),
            edges: edges
                .iter()
                .map(|(s, t)| Edge::new(format!("{s}-{t}"), *s, *t))
                .collect(),
            categories: Vec::new(),
        })
    }

    #[test]
    fn test_depth_follows_edge_direction() {
        let model = model(&["c", "b", "a"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let assignment = assign_layers(&model.full_view());
        // view order is c, b, a
        assert_eq!(assignment.depths, vec![1, 1, 0]);
        assert!(assignment.back_edges.contains(&"b-c".to_string()));
        assert_eq!(assignment.orphans, 0);
    }

    #[test]
    fn test_cycle_edges_are_back_edges() {
        let model = model(&["root", "x", "y"], &[("root", "x"), ("x", "y"), ("y", "x")]);
        let assignment = assign_layers(&model.full_view());
        assert_eq!(assignment.depths, vec![0, 1, 2]);
        assert_eq!(assignment.back_edges, vec!["y-x".to_string()]);
    }

    #[test]
    fn test_unreachable_cycle_lands_on_trailing_layer() {
        let model = model(&["a", "b", "p", "q"], &[("a", "b"), ("p", "q"), ("q", "p")]);
        let assignment = assign_layers(&model.full_view());
        assert_eq!(assignment.depths, vec![0, 1, 2, 2]);
        assert_eq!(assignment.orphans, 2);
    }

    #[test]
    fn test_layers_stack_and_rows_do_not_overlap() {
        let model = model(&["a", "c", "b", "d"], &[("a", "b"), ("a", "c"), ("a", "d")]);
        let config = LayoutConfig::default();
        let layout = LayeredLayoutEngine::new().layout(&model.full_view(), &config);

        let ids: Vec<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b", "d"]);

        let a = &layout.nodes[0];
        let mut row: Vec<_> = layout.nodes[1..].iter().collect();
        row.sort_by(|l, r| l.x.total_cmp(&r.x));
        let order: Vec<&str> = row.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "d"]);
        assert!(row.windows(2).all(|w| w[0].right() <= w[1].x));
        assert!(row.iter().all(|n| n.y == a.bottom() + config.layer_gap));
        assert_eq!(a.center_x(), ROW_CENTER_X);
        assert!(layout.containers.is_empty());
    }

    #[test]
    fn test_negative_spacing_is_clamped() {
        let model = model(&["root", "left", "right"], &[("root", "left"), ("root", "right")]);
        let config = LayoutConfig {
            node_spacing: TierSpacing {
                cause: -40.0,
                intermediate: -100.0,
                effect: -40.0,
            },
            ..Default::default()
        };
        let layout = LayeredLayoutEngine::new().layout(&model.full_view(), &config);

        let (left, right) = (&layout.nodes[1], &layout.nodes[2]);
        assert_eq!(left.y, right.y);
        assert!(left.right() <= right.x);
    }

    #[test]
    fn test_empty_view() {
        let layout = LayeredLayoutEngine::new().layout(&GraphView::default(), &LayoutConfig::default());
        assert!(layout.nodes.is_empty());
    }
}
