//! Tier partitioning
//!
//! Splits a node set into the three ordered tiers and, inside the cause tier,
//! into registry-ordered subgroup buckets:
//!
//! ```text
//! Tier 0: causes        [ subgroup A | subgroup B | ... | default ]
//! Tier 1: intermediates [ single bucket ]
//! Tier 2: effects       [ single bucket ]
//! ```
//!
//! Empty tiers and empty buckets are omitted.

use std::cmp::Ordering;

use super::types::{Node, NodeKind};
use crate::config::SubgroupRegistry;

/// Which slice of a tier a bucket represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketScope {
    /// The whole tier (intermediate and effect tiers)
    Tier,
    /// A registered cause subgroup
    Subgroup(String),
    /// Causes with a missing or unregistered subgroup
    DefaultSubgroup,
}

/// Ordered run of nodes sharing a scope.
#[derive(Debug, Clone)]
pub struct TierBucket<'a> {
    pub scope: BucketScope,
    pub nodes: Vec<&'a Node>,
}

/// One non-empty tier.
#[derive(Debug, Clone)]
pub struct Tier<'a> {
    pub kind: NodeKind,
    pub buckets: Vec<TierBucket<'a>>,
}

impl<'a> Tier<'a> {
    /// Nodes in bucket order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.buckets.iter().flat_map(|b| b.nodes.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.nodes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the tier is split into registered subgroups.
    pub fn has_subgroups(&self) -> bool {
        self.buckets
            .iter()
            .any(|b| matches!(b.scope, BucketScope::Subgroup(_)))
    }
}

/// Groups nodes into tiers according to a subgroup registry.
pub struct TierPartitioner<'r> {
    registry: &'r SubgroupRegistry,
}

impl<'r> TierPartitioner<'r> {
    pub fn new(registry: &'r SubgroupRegistry) -> Self {
        Self { registry }
    }

    /// Partition `nodes` into non-empty tiers in cause → intermediate → effect order.
    pub fn partition<'a>(&self, nodes: &[&'a Node]) -> Vec<Tier<'a>> {
        NodeKind::ALL
            .iter()
            .filter_map(|&kind| {
                let members: Vec<&'a Node> =
                    nodes.iter().copied().filter(|n| n.kind == kind).collect();
                if members.is_empty() {
                    return None;
                }
                let buckets = match kind {
                    NodeKind::Cause => self.subgroup_buckets(members),
                    NodeKind::Intermediate | NodeKind::Effect => vec![TierBucket {
                        scope: BucketScope::Tier,
                        nodes: sorted_by_order(members),
                    }],
                };
                Some(Tier { kind, buckets })
            })
            .collect()
    }

    fn subgroup_buckets<'a>(&self, causes: Vec<&'a Node>) -> Vec<TierBucket<'a>> {
        let mut registered: Vec<Vec<&'a Node>> = vec![Vec::new(); self.registry.len()];
        let mut fallback: Vec<&'a Node> = Vec::new();

        for node in causes {
            match node
                .subgroup
                .as_deref()
                .and_then(|id| self.registry.position(id))
            {
                Some(pos) => registered[pos].push(node),
                None => fallback.push(node),
            }
        }

        let mut buckets: Vec<TierBucket<'a>> = self
            .registry
            .iter()
            .zip(registered)
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(def, nodes)| TierBucket {
                scope: BucketScope::Subgroup(def.id.clone()),
                nodes: sorted_by_order(nodes),
            })
            .collect();

        if !fallback.is_empty() {
            buckets.push(TierBucket {
                scope: BucketScope::DefaultSubgroup,
                nodes: sorted_by_order(fallback),
            });
        }
        buckets
    }
}

/// Stable sort by explicit `order`; unordered nodes go last in input order.
fn sorted_by_order(mut nodes: Vec<&Node>) -> Vec<&Node> {
    nodes.sort_by(|a, b| match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    nodes
}
