//! Layout pipeline
//!
//! `filters → visible view → strategy → validated positions + styled edges`.
//!
//! The orchestrator owns no graph state between calls: the caller keeps its
//! [`GraphFilters`] and re-runs the pipeline when they change. Strategies are
//! pluggable behind [`LayoutStrategy`] (synchronous) or
//! [`AsyncLayoutStrategy`] (asynchronous). A strategy that errors, times out
//! or leaves a node unpositioned is replaced by the barycenter engine and the
//! failure is reported as a [`LayoutWarning`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::edge_style::style_edges;
use super::filter::{FilterEngine, GraphFilters};
use super::layout::{BarycenterLayoutEngine, NodeLayout};
use super::layout_layered::LayeredLayoutEngine;
use super::model::{GraphModel, GraphView};
use super::types::{GroupContainer, PositionedNode, StyledEdge};
use crate::config::{LayoutAlgorithm, LayoutConfig};
use crate::error::LayoutError;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Synchronous positioning backend.
pub trait LayoutStrategy: Send + Sync {
    /// Identifier reported in outputs and warnings
    fn id(&self) -> &str;

    fn layout(&self, view: &GraphView<'_>, config: &LayoutConfig)
        -> Result<NodeLayout, LayoutError>;
}

/// Asynchronous positioning backend, e.g. an external layout service.
#[async_trait::async_trait]
pub trait AsyncLayoutStrategy: Send + Sync {
    fn id(&self) -> &str;

    async fn layout(
        &self,
        view: &GraphView<'_>,
        config: &LayoutConfig,
    ) -> Result<NodeLayout, LayoutError>;
}

impl LayoutStrategy for BarycenterLayoutEngine {
    fn id(&self) -> &str {
        LayoutAlgorithm::BarycenterTiered.as_str()
    }

    fn layout(
        &self,
        view: &GraphView<'_>,
        config: &LayoutConfig,
    ) -> Result<NodeLayout, LayoutError> {
        Ok(BarycenterLayoutEngine::layout(self, view, config))
    }
}

impl LayoutStrategy for LayeredLayoutEngine {
    fn id(&self) -> &str {
        LayoutAlgorithm::ExternalLayered.as_str()
    }

    fn layout(
        &self,
        view: &GraphView<'_>,
        config: &LayoutConfig,
    ) -> Result<NodeLayout, LayoutError> {
        Ok(LayeredLayoutEngine::layout(self, view, config))
    }
}

/// Runs a synchronous strategy behind the async contract.
pub struct BlockingStrategy<S> {
    inner: S,
}

impl<S: LayoutStrategy> BlockingStrategy<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl<S: LayoutStrategy> AsyncLayoutStrategy for BlockingStrategy<S> {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn layout(
        &self,
        view: &GraphView<'_>,
        config: &LayoutConfig,
    ) -> Result<NodeLayout, LayoutError> {
        self.inner.layout(view, config)
    }
}

/// Built-in strategy for an algorithm id.
pub fn builtin_strategy(algorithm: LayoutAlgorithm) -> &'static dyn LayoutStrategy {
    match algorithm {
        LayoutAlgorithm::BarycenterTiered => &BarycenterLayoutEngine,
        LayoutAlgorithm::ExternalLayered => &LayeredLayoutEngine,
    }
}

// =============================================================================
// INPUT / OUTPUT
// =============================================================================

/// What to lay out.
#[derive(Debug, Clone)]
pub enum LayoutInput<'a> {
    /// Run the filter engine over the whole model first
    Filters(&'a GraphFilters),
    /// Use this view as is (already filtered or extracted)
    Prepared(GraphView<'a>),
}

/// Non-fatal problem encountered while producing a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutWarning {
    pub code: String,
    pub message: String,
    /// Strategy that was replaced
    pub strategy: String,
}

impl LayoutWarning {
    pub fn from_error(strategy: &str, error: &LayoutError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            strategy: strategy.to_string(),
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutput {
    pub positioned_nodes: Vec<PositionedNode>,
    pub styled_edges: Vec<StyledEdge>,
    pub group_containers: Vec<GroupContainer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<LayoutWarning>,
    /// Strategy that produced the positions
    pub strategy: String,
}

impl LayoutOutput {
    pub fn position(&self, id: &str) -> Option<&PositionedNode> {
        self.positioned_nodes.iter().find(|n| n.id == id)
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Stateless pipeline over one model.
pub struct LayoutOrchestrator<'m> {
    model: &'m GraphModel,
    filter: FilterEngine<'m>,
}

impl<'m> LayoutOrchestrator<'m> {
    pub fn new(model: &'m GraphModel) -> Self {
        Self {
            model,
            filter: FilterEngine::new(model),
        }
    }

    pub fn model(&self) -> &'m GraphModel {
        self.model
    }

    pub fn filter_engine(&self) -> &FilterEngine<'m> {
        &self.filter
    }

    /// Resolve the input into the view to position.
    pub fn prepare<'a>(&'a self, input: LayoutInput<'a>) -> GraphView<'a> {
        match input {
            LayoutInput::Filters(filters) => self.filter.apply(filters),
            LayoutInput::Prepared(view) => view,
        }
    }

    /// Lay out with the algorithm selected in `config`.
    pub fn layout(&self, input: LayoutInput<'_>, config: &LayoutConfig) -> LayoutOutput {
        self.layout_with(input, builtin_strategy(config.layout_algorithm), config)
    }

    /// Lay out with an explicit strategy.
    pub fn layout_with(
        &self,
        input: LayoutInput<'_>,
        strategy: &dyn LayoutStrategy,
        config: &LayoutConfig,
    ) -> LayoutOutput {
        let config = config.clone().sanitized();
        let view = self.prepare(input);
        let result = strategy
            .layout(&view, &config)
            .and_then(|layout| cover_view(&view, layout, strategy.id()));
        finish(&view, result, strategy.id(), &config)
    }
}

/// Reorder positions into view order, failing if any view node is missing.
fn cover_view(
    view: &GraphView<'_>,
    layout: NodeLayout,
    strategy: &str,
) -> Result<NodeLayout, LayoutError> {
    let NodeLayout { nodes, containers } = layout;
    let mut by_id: HashMap<String, PositionedNode> =
        nodes.into_iter().map(|n| (n.id.clone(), n)).collect();

    let nodes = view
        .nodes
        .iter()
        .map(|node| {
            by_id
                .remove(&node.id)
                .ok_or_else(|| LayoutError::MissingPosition {
                    strategy: strategy.to_string(),
                    node_id: node.id.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodeLayout { nodes, containers })
}

/// Build the output, falling back to the barycenter engine on failure.
fn finish(
    view: &GraphView<'_>,
    result: Result<NodeLayout, LayoutError>,
    strategy: &str,
    config: &LayoutConfig,
) -> LayoutOutput {
    let (layout, used, warnings) = match result {
        Ok(layout) => (layout, strategy.to_string(), Vec::new()),
        Err(error) => {
            warn!(
                strategy,
                code = error.code(),
                error = %error,
                "Layout strategy failed, falling back to barycenter"
            );
            let fallback = BarycenterLayoutEngine::new().layout(view, config);
            (
                fallback,
                LayoutAlgorithm::BarycenterTiered.as_str().to_string(),
                vec![LayoutWarning::from_error(strategy, &error)],
            )
        }
    };

    debug!(
        strategy = used.as_str(),
        nodes = layout.nodes.len(),
        edges = view.edges.len(),
        containers = layout.containers.len(),
        "Layout pipeline complete"
    );

    LayoutOutput {
        positioned_nodes: layout.nodes,
        styled_edges: style_edges(view.edges.iter().copied()),
        group_containers: layout.containers,
        warnings,
        strategy: used,
    }
}

// =============================================================================
// ASYNC ORCHESTRATOR
// =============================================================================

/// Result of an async layout request.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    /// The request is still the latest one issued
    Fresh(LayoutOutput),
    /// A newer request was issued while this one ran; discard the result
    Stale { token: u64, latest: u64 },
}

impl LayoutOutcome {
    pub fn into_fresh(self) -> Option<LayoutOutput> {
        match self {
            LayoutOutcome::Fresh(output) => Some(output),
            LayoutOutcome::Stale { .. } => None,
        }
    }
}

/// Pipeline around an async strategy with stale-result detection.
///
/// Every request is tagged with a token from [`issue_token`](Self::issue_token);
/// results for anything but the most recent token come back as
/// [`LayoutOutcome::Stale`]. Nothing is cancelled.
pub struct AsyncLayoutOrchestrator<'m> {
    sync: LayoutOrchestrator<'m>,
    strategy: Arc<dyn AsyncLayoutStrategy>,
    latest: AtomicU64,
}

impl<'m> AsyncLayoutOrchestrator<'m> {
    pub fn new(model: &'m GraphModel, strategy: Arc<dyn AsyncLayoutStrategy>) -> Self {
        Self {
            sync: LayoutOrchestrator::new(model),
            strategy,
            latest: AtomicU64::new(0),
        }
    }

    /// Tag a new request. Supersedes every earlier token.
    pub fn issue_token(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_token(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub async fn run(
        &self,
        token: u64,
        input: LayoutInput<'_>,
        config: &LayoutConfig,
    ) -> LayoutOutcome {
        let config = config.clone().sanitized();
        let view = self.sync.prepare(input);
        let strategy_id = self.strategy.id().to_string();

        let timeout_ms = config.async_timeout_ms;
        let result = match tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.strategy.layout(&view, &config),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LayoutError::Timeout {
                strategy: strategy_id.clone(),
                timeout_ms,
            }),
        }
        .and_then(|layout| cover_view(&view, layout, &strategy_id));

        let latest = self.latest_token();
        if token < latest {
            debug!(token, latest, "Discarding stale layout result");
            return LayoutOutcome::Stale { token, latest };
        }

        LayoutOutcome::Fresh(finish(&view, result, &strategy_id, &config))
    }
}
