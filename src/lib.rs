//! Factor Graph - tiered layout and query engine for causal factor graphs
//!
//! Turns an authored set of causes, intermediate factors and effects into
//! positioned cards, styled edges and background containers that a renderer
//! can draw directly.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use factor_graph::config::LayoutConfig;
//! use factor_graph::graph::{GraphFilters, GraphModel, LayoutInput, LayoutOrchestrator};
//!
//! let model = GraphModel::from_path("data/overview.yaml").unwrap();
//! let config = LayoutConfig::default();
//! let filters = GraphFilters::with_defaults(&config);
//! let output = LayoutOrchestrator::new(&model).layout(LayoutInput::Filters(&filters), &config);
//! println!("{} nodes placed", output.positioned_nodes.len());
//! ```

// Core error handling
pub mod error;

// Layout options
pub mod config;

// Model, filtering, extraction and layout
pub mod graph;

pub use config::{LayoutAlgorithm, LayoutConfig, SubgroupDef, SubgroupRegistry};
pub use error::{GraphError, LayoutError};
