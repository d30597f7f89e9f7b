//! Causal factor graph: model, layout and query
//!
//! Data flows one way through the module:
//!
//! ```text
//! GraphDataset -> GraphModel -> FilterEngine / SubgraphExtractor -> GraphView
//!              -> LayoutOrchestrator (strategy + edge styling) -> LayoutOutput
//! ```

pub mod dimensions;
pub mod edge_style;
pub mod filter;
pub mod layout;
pub mod layout_layered;
pub mod model;
pub mod orchestrator;
pub mod subgraph;
pub mod tiers;
pub mod types;

pub use dimensions::{estimate_dimensions, estimate_with_override};
pub use edge_style::{style_edge, style_edges};
pub use filter::{EdgeDensity, FilterEngine, GraphFilters, VisibleCounts};
pub use layout::{BarycenterLayoutEngine, NodeLayout};
pub use layout_layered::{assign_layers, LayerAssignment, LayeredLayoutEngine};
pub use model::{GraphCatalog, GraphDataset, GraphModel, GraphView, LoadReport};
pub use orchestrator::{
    builtin_strategy, AsyncLayoutOrchestrator, AsyncLayoutStrategy, BlockingStrategy,
    LayoutInput, LayoutOrchestrator, LayoutOutcome, LayoutOutput, LayoutStrategy,
    LayoutWarning,
};
pub use subgraph::{extract_neighborhood, Subgraph, SubgraphExtractor, SubgraphSummary};
pub use tiers::{BucketScope, Tier, TierBucket, TierPartitioner};
pub use types::*;
