//! Tiered barycenter layout engine
//!
//! Positions nodes in three horizontal tiers (causes on top, effects at the
//! bottom) and orders each tier to reduce edge crossings.
//!
//! ## Algorithm
//!
//! 1. Partition nodes into tiers (cause tier split into subgroups)
//! 2. Stack tiers vertically: each tier starts one layer gap below the
//!    tallest card of the tier above
//! 3. Place every row in partition order, centered on `ROW_CENTER_X`
//! 4. Sweep a fixed number of passes over the non-anchor tiers, re-sorting
//!    each by the mean X of its neighbors in the adjacent tiers
//! 5. Emit tier and subgroup background containers around the final rows
//!
//! The first non-empty tier is the anchor and keeps its partition order, so
//! the cause subgroups stay in registry order. The pass count is fixed, so
//! the layout terminates for any input including cyclic graphs.

use std::collections::HashMap;
use tracing::debug;

use super::dimensions::estimate_with_override;
use super::model::GraphView;
use super::tiers::{BucketScope, TierPartitioner};
use super::types::{Dimensions, GroupContainer, Node, NodeKind, PositionedNode};
use crate::config::{LayoutConfig, DEFAULT_SUBGROUP_LABEL};

// =============================================================================
// LAYOUT CONSTANTS
// =============================================================================

/// Every row is centered on this X
pub const ROW_CENTER_X: f32 = 0.0;

/// Y of the first tier
pub const TOP_MARGIN: f32 = 0.0;

/// Padding between a tier's cards and its background box
pub const TIER_PADDING: f32 = 16.0;

/// Space above a tier's cards reserved for the tier title
pub const TIER_HEADER_HEIGHT: f32 = 28.0;

/// Padding between a subgroup's cards and its background box
pub const SUBGROUP_PADDING: f32 = 10.0;

/// Space above a subgroup's cards reserved for the subgroup title
pub const SUBGROUP_HEADER_HEIGHT: f32 = 22.0;

/// Positions plus background boxes produced by a layout strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLayout {
    pub nodes: Vec<PositionedNode>,
    pub containers: Vec<GroupContainer>,
}

// =============================================================================
// INTERNAL STATE
// =============================================================================

/// A node being placed.
#[derive(Debug, Clone)]
struct Card<'a> {
    node: &'a Node,
    dims: Dimensions,
    /// Left edge
    x: f32,
    y: f32,
    row: usize,
}

impl Card<'_> {
    fn center_x(&self) -> f32 {
        self.x + self.dims.width / 2.0
    }
}

/// Cards of one scope, in current left-to-right order.
#[derive(Debug, Clone)]
struct Segment {
    scope: BucketScope,
    cards: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Row {
    kind: NodeKind,
    segments: Vec<Segment>,
}

/// Axis-aligned box used for container bounds.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    fn of_cards<'c, 'n: 'c>(cards: impl IntoIterator<Item = &'c Card<'n>>) -> Option<Self> {
        cards.into_iter().fold(None, |acc, card| {
            let card_bounds = Bounds {
                min_x: card.x,
                min_y: card.y,
                max_x: card.x + card.dims.width,
                max_y: card.y + card.dims.height,
            };
            Some(match acc {
                Some(b) => b.union(card_bounds),
                None => card_bounds,
            })
        })
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow by `padding` on every side plus `header` above.
    fn expand(self, padding: f32, header: f32) -> Bounds {
        Bounds {
            min_x: self.min_x - padding,
            min_y: self.min_y - padding - header,
            max_x: self.max_x + padding,
            max_y: self.max_y + padding,
        }
    }

    fn into_container(self, scope_id: String, label: String, color: Option<String>) -> GroupContainer {
        GroupContainer {
            scope_id,
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x,
            height: self.max_y - self.min_y,
            label,
            color,
        }
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Barycenter tiered layout. Stateless: every call starts from scratch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarycenterLayoutEngine;

impl BarycenterLayoutEngine {
    pub fn new() -> Self {
        Self
    }

    /// Lay out `view`. Returns one positioned node per view node, in view order.
    /// Out-of-range config values are clamped first.
    pub fn layout(&self, view: &GraphView<'_>, config: &LayoutConfig) -> NodeLayout {
        if view.nodes.is_empty() {
            return NodeLayout::default();
        }

        let config = &config.clone().sanitized();
        let tiers = TierPartitioner::new(&config.subgroup_registry).partition(&view.nodes);

        let mut cards: Vec<Card<'_>> = view
            .nodes
            .iter()
            .map(|&node| Card {
                node,
                dims: estimate_with_override(node, config.node_width_override),
                x: 0.0,
                y: 0.0,
                row: 0,
            })
            .collect();
        let card_index: HashMap<&str, usize> = view
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut rows: Vec<Row> = tiers
            .iter()
            .map(|tier| Row {
                kind: tier.kind,
                segments: tier
                    .buckets
                    .iter()
                    .map(|bucket| Segment {
                        scope: bucket.scope.clone(),
                        cards: bucket
                            .nodes
                            .iter()
                            .filter_map(|n| card_index.get(n.id.as_str()).copied())
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        // Vertical placement: single cumulative pass
        let mut y = TOP_MARGIN;
        for (r, row) in rows.iter().enumerate() {
            let mut row_height: f32 = 0.0;
            for &c in row.segments.iter().flat_map(|s| s.cards.iter()) {
                cards[c].y = y;
                cards[c].row = r;
                row_height = row_height.max(cards[c].dims.height);
            }
            y += row_height + config.layer_gap;
        }

        let neighbors = build_neighbors(view, &card_index);

        for row in &rows {
            place_row(row, &mut cards, config);
        }

        let passes = config.barycenter_passes;
        for pass in 0..passes {
            let sweep: Vec<usize> = if pass % 2 == 0 {
                (1..rows.len()).collect()
            } else {
                (1..rows.len()).rev().collect()
            };
            for r in sweep {
                reorder_row(&mut rows[r], r, &cards, &neighbors);
                place_row(&rows[r], &mut cards, config);
            }
        }

        let containers = build_containers(&rows, &cards, config);

        debug!(
            tiers = rows.len(),
            nodes = cards.len(),
            passes,
            containers = containers.len(),
            "Barycenter layout complete"
        );

        NodeLayout {
            nodes: cards
                .iter()
                .map(|card| PositionedNode {
                    id: card.node.id.clone(),
                    x: card.x,
                    y: card.y,
                    width: card.dims.width,
                    height: card.dims.height,
                })
                .collect(),
            containers,
        }
    }
}

/// Undirected card adjacency from the view's edges; self-loops ignored.
fn build_neighbors(view: &GraphView<'_>, card_index: &HashMap<&str, usize>) -> Vec<Vec<usize>> {
    let mut neighbors = vec![Vec::new(); card_index.len()];
    for edge in &view.edges {
        let (Some(&from), Some(&to)) = (
            card_index.get(edge.source.as_str()),
            card_index.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if from != to {
            neighbors[from].push(to);
            neighbors[to].push(from);
        }
    }
    neighbors
}

/// Re-sort each segment of `row` by barycenter, ties broken by prior X.
fn reorder_row(row: &mut Row, row_idx: usize, cards: &[Card<'_>], neighbors: &[Vec<usize>]) {
    for segment in &mut row.segments {
        let mut keyed: Vec<(usize, f32, f32)> = segment
            .cards
            .iter()
            .map(|&c| {
                let prior = cards[c].center_x();
                let adjacent: Vec<f32> = neighbors[c]
                    .iter()
                    .filter(|&&n| cards[n].row + 1 == row_idx || cards[n].row == row_idx + 1)
                    .map(|&n| cards[n].center_x())
                    .collect();
                let barycenter = if adjacent.is_empty() {
                    prior
                } else {
                    adjacent.iter().sum::<f32>() / adjacent.len() as f32
                };
                (c, barycenter, prior)
            })
            .collect();

        keyed.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));
        segment.cards = keyed.into_iter().map(|(c, _, _)| c).collect();
    }
}

/// Lay a row out left to right, centered on `ROW_CENTER_X`.
fn place_row(row: &Row, cards: &mut [Card<'_>], config: &LayoutConfig) {
    let gap = config.node_spacing.for_kind(row.kind);
    let occupied: Vec<&Segment> = row.segments.iter().filter(|s| !s.cards.is_empty()).collect();

    let mut total = 0.0;
    for (i, segment) in occupied.iter().enumerate() {
        if i > 0 {
            total += gap + config.subgroup_gap;
        }
        for (j, &c) in segment.cards.iter().enumerate() {
            if j > 0 {
                total += gap;
            }
            total += cards[c].dims.width;
        }
    }

    let mut x = ROW_CENTER_X - total / 2.0;
    for (i, segment) in occupied.iter().enumerate() {
        if i > 0 {
            x += gap + config.subgroup_gap;
        }
        for (j, &c) in segment.cards.iter().enumerate() {
            if j > 0 {
                x += gap;
            }
            cards[c].x = x;
            x += cards[c].dims.width;
        }
    }
}

fn build_containers(rows: &[Row], cards: &[Card<'_>], config: &LayoutConfig) -> Vec<GroupContainer> {
    let mut containers = Vec::new();

    for row in rows {
        let Some(node_bounds) =
            Bounds::of_cards(row.segments.iter().flat_map(|s| s.cards.iter().map(move |&c| &cards[c])))
        else {
            continue;
        };

        let split = row
            .segments
            .iter()
            .any(|s| matches!(s.scope, BucketScope::Subgroup(_)));

        let mut subgroup_boxes = Vec::new();
        let mut tier_bounds = node_bounds;
        if split {
            for segment in &row.segments {
                let Some(bounds) = Bounds::of_cards(segment.cards.iter().map(|&c| &cards[c]))
                else {
                    continue;
                };
                let bounds = bounds.expand(SUBGROUP_PADDING, SUBGROUP_HEADER_HEIGHT);
                tier_bounds = tier_bounds.union(bounds);

                let (scope_id, label, color) = match &segment.scope {
                    BucketScope::Subgroup(id) => {
                        let def = config.subgroup_registry.get(id);
                        (
                            format!("subgroup:{}", id),
                            def.map(|d| d.label.clone()).unwrap_or_else(|| id.clone()),
                            def.and_then(|d| d.color.clone()),
                        )
                    }
                    BucketScope::DefaultSubgroup | BucketScope::Tier => (
                        "subgroup:default".to_string(),
                        DEFAULT_SUBGROUP_LABEL.to_string(),
                        None,
                    ),
                };
                subgroup_boxes.push(bounds.into_container(scope_id, label, color));
            }
        }

        containers.push(tier_bounds.expand(TIER_PADDING, TIER_HEADER_HEIGHT).into_container(
            format!("tier:{}", row.kind),
            config.type_labels.label_for(row.kind).to_string(),
            None,
        ));
        containers.extend(subgroup_boxes);
    }

    containers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SubgroupDef, SubgroupRegistry, TierSpacing, MAX_BARYCENTER_PASSES};
    use crate::graph::model::{GraphDataset, GraphModel};
    use crate::graph::types::{Edge, EdgeStrength};

    fn model(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphModel {
        GraphModel::from_dataset(GraphDataset {
            nodes,
            edges,
            categories: Vec::new(),
        })
    }

    fn position<'a>(layout: &'a NodeLayout, id: &str) -> &'a PositionedNode {
        layout.nodes.iter().find(|n| n.id == id).unwrap()
    }

    fn row_order(layout: &NodeLayout, ids: &[&str]) -> Vec<String> {
        let mut row: Vec<&PositionedNode> = layout
            .nodes
            .iter()
            .filter(|n| ids.contains(&n.id.as_str()))
            .collect();
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
        row.into_iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn test_empty_view() {
        let layout = BarycenterLayoutEngine::new().layout(&GraphView::default(), &LayoutConfig::default());
        assert!(layout.nodes.is_empty());
        assert!(layout.containers.is_empty());
    }

    #[test]
    fn test_chain_aligns_vertically() {
        let model = model(
            vec![
                Node::new("a", "A", NodeKind::Cause),
                Node::new("b", "B", NodeKind::Intermediate),
                Node::new("c", "C", NodeKind::Effect),
            ],
            vec![
                Edge::new("ab", "a", "b").with_strength(EdgeStrength::Strong),
                Edge::new("bc", "b", "c").with_strength(EdgeStrength::Weak),
            ],
        );
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &LayoutConfig::default());

        let (a, b, c) = (position(&layout, "a"), position(&layout, "b"), position(&layout, "c"));
        assert!(a.y < b.y, "cause tier should be above intermediate tier");
        assert!(b.y < c.y, "intermediate tier should be above effect tier");
        assert_eq!(b.x, a.x);
        assert_eq!(b.center_x(), ROW_CENTER_X);
    }

    #[test]
    fn test_tier_y_accumulates_heights_and_gap() {
        let model = model(
            vec![
                Node::new("a", "A", NodeKind::Cause).with_sub_items(["one", "two"]),
                Node::new("b", "B", NodeKind::Cause),
                Node::new("c", "C", NodeKind::Effect),
            ],
            Vec::new(),
        );
        let config = LayoutConfig::default();
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &config);

        let tallest = position(&layout, "a").height;
        assert_eq!(position(&layout, "c").y, TOP_MARGIN + tallest + config.layer_gap);
    }

    #[test]
    fn test_barycenter_uncrosses_edges() {
        // Causes a1, a2 in that order; effects listed crossed
        let model = model(
            vec![
                Node::new("a1", "A1", NodeKind::Cause),
                Node::new("a2", "A2", NodeKind::Cause),
                Node::new("e2", "E2", NodeKind::Effect),
                Node::new("e1", "E1", NodeKind::Effect),
            ],
            vec![Edge::new("x1", "a1", "e1"), Edge::new("x2", "a2", "e2")],
        );
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &LayoutConfig::default());

        assert_eq!(row_order(&layout, &["a1", "a2"]), vec!["a1", "a2"]);
        assert_eq!(row_order(&layout, &["e1", "e2"]), vec!["e1", "e2"]);
    }

    #[test]
    fn test_disconnected_nodes_keep_relative_order() {
        let model = model(
            vec![
                Node::new("a", "A", NodeKind::Cause),
                Node::new("i1", "I1", NodeKind::Intermediate),
                Node::new("i2", "I2", NodeKind::Intermediate),
                Node::new("i3", "I3", NodeKind::Intermediate),
            ],
            Vec::new(),
        );
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &LayoutConfig::default());
        assert_eq!(row_order(&layout, &["i1", "i2", "i3"]), vec!["i1", "i2", "i3"]);
    }

    #[test]
    fn test_rows_do_not_overlap() {
        let model = model(
            (0..6)
                .map(|i| Node::new(format!("n{}", i), "x".repeat(i * 7), NodeKind::Intermediate))
                .collect(),
            Vec::new(),
        );
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &LayoutConfig::default());

        let mut row: Vec<&PositionedNode> = layout.nodes.iter().collect();
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
        for pair in row.windows(2) {
            assert!(pair[0].right() <= pair[1].x, "{} overlaps {}", pair[0].id, pair[1].id);
        }
    }

    #[test]
    fn test_equal_barycenters_keep_partition_order() {
        // Both intermediates hang off the same cause only
        let model = model(
            vec![
                Node::new("a", "A", NodeKind::Cause),
                Node::new("i2", "I2", NodeKind::Intermediate),
                Node::new("i1", "I1", NodeKind::Intermediate),
            ],
            vec![Edge::new("a-i2", "a", "i2"), Edge::new("a-i1", "a", "i1")],
        );
        let config = LayoutConfig {
            barycenter_passes: MAX_BARYCENTER_PASSES,
            ..Default::default()
        };
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &config);
        assert_eq!(row_order(&layout, &["i1", "i2"]), vec!["i2", "i1"]);
    }

    #[test]
    fn test_negative_spacing_is_clamped() {
        let model = model(
            vec![
                Node::new("a", "x".repeat(30), NodeKind::Intermediate),
                Node::new("b", "B", NodeKind::Intermediate),
            ],
            Vec::new(),
        );
        let config = LayoutConfig {
            node_spacing: TierSpacing {
                intermediate: -100.0,
                ..Default::default()
            },
            layer_gap: -50.0,
            ..Default::default()
        };
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &config);

        let (a, b) = (position(&layout, "a"), position(&layout, "b"));
        assert!(a.right() <= b.x, "a ends at {} but b starts at {}", a.right(), b.x);
    }

    #[test]
    fn test_pass_count_is_clamped() {
        let model = model(
            vec![
                Node::new("a1", "A1", NodeKind::Cause),
                Node::new("a2", "A2", NodeKind::Cause),
                Node::new("e2", "E2", NodeKind::Effect),
                Node::new("e1", "E1", NodeKind::Effect),
            ],
            vec![Edge::new("x1", "a1", "e1"), Edge::new("x2", "a2", "e2")],
        );
        let view = model.full_view();
        let engine = BarycenterLayoutEngine::new();

        // Zero passes still runs one sweep
        let none = LayoutConfig {
            barycenter_passes: 0,
            ..Default::default()
        };
        assert_eq!(row_order(&engine.layout(&view, &none), &["e1", "e2"]), vec!["e1", "e2"]);

        let unbounded = LayoutConfig {
            barycenter_passes: usize::MAX,
            ..Default::default()
        };
        let capped = LayoutConfig {
            barycenter_passes: MAX_BARYCENTER_PASSES,
            ..Default::default()
        };
        assert_eq!(engine.layout(&view, &unbounded), engine.layout(&view, &capped));
    }

    #[test]
    fn test_cyclic_graph_terminates() {
        let model = model(
            vec![
                Node::new("a", "A", NodeKind::Cause),
                Node::new("b", "B", NodeKind::Intermediate),
                Node::new("c", "C", NodeKind::Intermediate),
                Node::new("d", "D", NodeKind::Effect),
            ],
            vec![
                Edge::new("e1", "a", "b"),
                Edge::new("e2", "b", "c"),
                Edge::new("e3", "c", "a"),
                Edge::new("e4", "c", "d"),
                Edge::new("e5", "d", "b"),
                Edge::new("e6", "b", "b"),
            ],
        );
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &LayoutConfig::default());
        assert_eq!(layout.nodes.len(), 4);
    }

    #[test]
    fn test_containers_for_tiers_and_subgroups() {
        let model = model(
            vec![
                Node::new("a", "A", NodeKind::Cause).with_subgroup("ai"),
                Node::new("s", "S", NodeKind::Cause).with_subgroup("society"),
                Node::new("o", "O", NodeKind::Cause),
                Node::new("e", "E", NodeKind::Effect),
            ],
            Vec::new(),
        );
        let config = LayoutConfig::default().with_subgroups(SubgroupRegistry::new(vec![
            SubgroupDef {
                id: "ai".to_string(),
                label: "AI Factors".to_string(),
                color: Some("#7c3aed".to_string()),
            },
            SubgroupDef {
                id: "society".to_string(),
                label: "Societal Factors".to_string(),
                color: None,
            },
        ]));
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &config);

        let scopes: Vec<&str> = layout.containers.iter().map(|c| c.scope_id.as_str()).collect();
        assert_eq!(
            scopes,
            vec![
                "tier:cause",
                "subgroup:ai",
                "subgroup:society",
                "subgroup:default",
                "tier:effect"
            ]
        );

        let tier = &layout.containers[0];
        let ai = &layout.containers[1];
        assert_eq!(tier.label, "Causes");
        assert_eq!(ai.label, "AI Factors");
        assert_eq!(ai.color.as_deref(), Some("#7c3aed"));
        assert_eq!(layout.containers[3].label, DEFAULT_SUBGROUP_LABEL);

        // Tier box encloses subgroup boxes, subgroup box encloses its card
        assert!(tier.x < ai.x && tier.y < ai.y);
        let a = position(&layout, "a");
        assert!(ai.x < a.x && ai.y < a.y);
        assert!(ai.x + ai.width > a.right());

        // Subgroups keep registry order left to right
        assert_eq!(row_order(&layout, &["a", "s", "o"]), vec!["a", "s", "o"]);
        let s = position(&layout, "s");
        assert!(s.x - a.right() >= config.node_spacing.cause + config.subgroup_gap);
    }

    #[test]
    fn test_width_override_applies_to_all_cards() {
        let model = model(
            vec![
                Node::new("a", "x".repeat(50), NodeKind::Cause),
                Node::new("b", "B", NodeKind::Effect),
            ],
            Vec::new(),
        );
        let config = LayoutConfig {
            node_width_override: Some(200.0),
            ..Default::default()
        };
        let layout = BarycenterLayoutEngine::new().layout(&model.full_view(), &config);
        assert!(layout.nodes.iter().all(|n| n.width == 200.0));
    }
}
