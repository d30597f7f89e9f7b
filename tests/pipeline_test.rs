//! End-to-end pipeline tests over the YAML fixture.
//!
//! Covers loading, filtering, neighborhood extraction and both layout
//! strategies without any renderer in the loop.

use std::path::PathBuf;

use pretty_assertions::assert_eq;

use factor_graph::config::LayoutConfig;
use factor_graph::graph::{
    extract_neighborhood, DetailLevel, Edge, EdgeDensity, EdgeStrength, FilterEngine,
    GraphCatalog, GraphDataset, GraphFilters, GraphModel, LayoutInput, LayoutOrchestrator,
    LayoutOutput, Node, NodeKind, SubgraphExtractor,
};
use factor_graph::LayoutAlgorithm;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_model() -> GraphModel {
    GraphModel::from_path(fixture_dir().join("factor_graph.yaml")).expect("load fixture graph")
}

fn load_config() -> LayoutConfig {
    let content = std::fs::read_to_string(fixture_dir().join("layout_config.yaml"))
        .expect("read fixture config");
    LayoutConfig::from_yaml_str(&content).expect("parse fixture config")
}

fn all_visible() -> GraphFilters {
    GraphFilters::new(EdgeDensity::All)
}

fn ids_at_y(output: &LayoutOutput, y: f32) -> Vec<String> {
    let mut row: Vec<_> = output
        .positioned_nodes
        .iter()
        .filter(|n| n.y == y)
        .collect();
    row.sort_by(|a, b| a.x.total_cmp(&b.x));
    row.into_iter().map(|n| n.id.clone()).collect()
}

#[test]
fn test_fixture_loads_with_report() {
    let model = load_model();

    assert_eq!(model.node_count(), 10);
    assert_eq!(model.edge_count(), 11);
    assert_eq!(model.report().dropped_edges, 1);
    assert!(!model.has_node("retired-node"));

    let categories: Vec<(String, usize)> = model
        .list_categories()
        .into_iter()
        .map(|c| (c.id, c.node_count))
        .collect();
    assert_eq!(
        categories,
        vec![
            ("capabilities".to_string(), 2),
            ("governance".to_string(), 2),
            ("dynamics".to_string(), 3),
            ("outcomes".to_string(), 3),
        ]
    );
}

#[test]
fn test_fixture_config() {
    let config = load_config();
    assert_eq!(config.layer_gap, 100.0);
    assert_eq!(config.default_edge_density, EdgeDensity::High);
    assert_eq!(config.type_labels.cause, "Root Factors");
    assert_eq!(config.subgroup_registry.len(), 2);
}

#[test]
fn test_full_layout_tiers_and_subgroups() {
    let model = load_model();
    let config = load_config();
    let output = LayoutOrchestrator::new(&model).layout(LayoutInput::Filters(&all_visible()), &config);

    assert_eq!(output.positioned_nodes.len(), model.node_count());
    assert_eq!(output.styled_edges.len(), model.edge_count());

    let y_of = |id: &str| output.position(id).map(|n| n.y).unwrap();
    let cause_y = y_of("compute-scaling");
    let intermediate_y = y_of("competitive-race");
    let effect_y = y_of("accidents");
    assert!(cause_y < intermediate_y && intermediate_y < effect_y);

    // registry order, then the default bucket
    assert_eq!(
        ids_at_y(&output, cause_y),
        vec![
            "compute-scaling",
            "algorithmic-progress",
            "weak-regulation",
            "market-pressure",
        ]
    );
    assert_eq!(ids_at_y(&output, intermediate_y).len(), 3);
    assert_eq!(ids_at_y(&output, effect_y).len(), 3);

    let scopes: Vec<&str> = output
        .group_containers
        .iter()
        .map(|c| c.scope_id.as_str())
        .collect();
    assert_eq!(
        scopes,
        vec![
            "tier:cause",
            "subgroup:ai",
            "subgroup:society",
            "subgroup:default",
            "tier:intermediate",
            "tier:effect",
        ]
    );
    assert_eq!(output.group_containers[0].label, "Root Factors");
    assert_eq!(output.group_containers[1].color.as_deref(), Some("#7c3aed"));
}

#[test]
fn test_layout_is_deterministic() {
    let model = load_model();
    let config = load_config();
    let filters = GraphFilters::with_defaults(&config);
    let orchestrator = LayoutOrchestrator::new(&model);

    let first = orchestrator.layout(LayoutInput::Filters(&filters), &config);
    let second = orchestrator.layout(LayoutInput::Filters(&filters), &config);
    assert_eq!(first, second);

    let reloaded = load_model();
    let third = LayoutOrchestrator::new(&reloaded).layout(LayoutInput::Filters(&filters), &config);
    assert_eq!(first, third);
}

#[test]
fn test_chain_scenario() {
    let model = GraphModel::from_dataset(GraphDataset {
        nodes: vec![
            Node::new("A", "A", NodeKind::Cause),
            Node::new("B", "B", NodeKind::Intermediate),
            Node::new("C", "C", NodeKind::Effect),
        ],
        edges: vec![
            Edge::new("A-B", "A", "B").with_strength(EdgeStrength::Strong),
            Edge::new("B-C", "B", "C").with_strength(EdgeStrength::Weak),
        ],
        categories: Vec::new(),
    });
    let config = LayoutConfig::default();
    let orchestrator = LayoutOrchestrator::new(&model);
    let output = orchestrator.layout(LayoutInput::Filters(&all_visible()), &config);

    let a = output.position("A").unwrap();
    let b = output.position("B").unwrap();
    let c = output.position("C").unwrap();
    assert!(a.y < b.y && b.y < c.y);
    assert_eq!(a.x, b.x);

    let widths: Vec<f32> = output.styled_edges.iter().map(|e| e.stroke_width).collect();
    assert!(widths[0] > widths[1]);

    let again = orchestrator.layout(LayoutInput::Filters(&all_visible()), &config);
    assert_eq!(output, again);
}

#[test]
fn test_density_levels_on_fixture() {
    let model = load_model();
    let engine = FilterEngine::new(&model);

    let counts: Vec<usize> = EdgeDensity::ALL_LEVELS
        .iter()
        .map(|&density| engine.apply(&GraphFilters::new(density)).edges.len())
        .collect();
    assert_eq!(counts, vec![2, 4, 6, 9, 11]);
}

#[test]
fn test_disabling_category_only_removes_its_nodes() {
    let model = load_model();
    let engine = FilterEngine::new(&model);
    let mut filters = GraphFilters::new(EdgeDensity::High);
    let before = engine.apply(&filters);

    filters.set_category("dynamics", false);
    let after = engine.apply(&filters);

    let hidden = ["competitive-race", "safety-shortcuts", "misuse"];
    for node in &before.nodes {
        assert_eq!(
            after.contains_node(&node.id),
            !hidden.contains(&node.id.as_str()),
            "node {}",
            node.id
        );
    }
    for edge in &before.edges {
        let incident =
            hidden.contains(&edge.source.as_str()) || hidden.contains(&edge.target.as_str());
        assert_eq!(after.edges.contains(edge), !incident, "edge {}", edge.id);
    }
    assert!(after.edges.iter().all(|e| before.edges.contains(e)));
}

#[test]
fn test_hide_all_show_all_on_fixture() {
    let model = load_model();
    let engine = FilterEngine::new(&model);
    let mut filters = all_visible();

    engine.hide_all(&mut filters);
    assert_eq!(engine.visible_counts(&filters).visible_nodes, 0);
    assert_eq!(filters.subgroups.get("economy"), Some(&false));

    engine.show_all(&mut filters);
    assert_eq!(engine.apply(&filters), model.full_view());
}

#[test]
fn test_focus_neighborhood_layout() {
    let overview = load_model();
    let detailed = load_model();
    let catalog = GraphCatalog::new(overview, detailed);
    let extractor = SubgraphExtractor::new(&catalog);

    let focus = extractor.extract("safety-shortcuts", 1, DetailLevel::Detailed);
    assert_eq!(
        focus.view.node_ids(),
        vec![
            "weak-regulation",
            "competitive-race",
            "safety-shortcuts",
            "accidents",
            "loss-of-control",
        ]
    );

    let model = catalog.model(DetailLevel::Detailed);
    let wider = extract_neighborhood(model, "safety-shortcuts", 2);
    assert!(focus.view.nodes.iter().all(|n| wider.view.contains_node(&n.id)));

    let output = LayoutOrchestrator::new(model)
        .layout(LayoutInput::Prepared(focus.view.clone()), &LayoutConfig::default());
    assert_eq!(output.positioned_nodes.len(), 5);
    assert_eq!(output.styled_edges.len(), focus.view.edges.len());
}

#[test]
fn test_layered_strategy_on_fixture() {
    let model = load_model();
    let config = load_config().with_algorithm(LayoutAlgorithm::ExternalLayered);
    let output = LayoutOrchestrator::new(&model).layout(LayoutInput::Filters(&all_visible()), &config);

    assert_eq!(output.strategy, "external-layered");
    assert!(output.warnings.is_empty());
    let y_of = |id: &str| output.position(id).map(|n| n.y).unwrap();
    // causes are the roots; shortcuts is one hop from weak-regulation
    assert!(y_of("compute-scaling") < y_of("competitive-race"));
    assert_eq!(y_of("competitive-race"), y_of("safety-shortcuts"));
    assert_eq!(y_of("competitive-race"), y_of("power-concentration"));
    assert!(y_of("safety-shortcuts") < y_of("loss-of-control"));
    assert!(output.group_containers.is_empty());
}

#[test]
fn test_output_serializes_camel_case() {
    let model = load_model();
    let output = LayoutOrchestrator::new(&model)
        .layout(LayoutInput::Filters(&all_visible()), &LayoutConfig::default());
    let json = serde_json::to_value(&output).unwrap();

    assert!(json.get("positionedNodes").is_some());
    assert!(json.get("groupContainers").is_some());
    assert!(json.get("warnings").is_none());
    let edge = &json["styledEdges"][0];
    assert_eq!(edge["markerKind"], "arrow-closed");
    assert_eq!(edge["colorToken"], "edge-neutral");
    assert!(edge.get("strokeWidth").is_some());
}

#[test]
fn test_json_dataset_round_trips_through_disk() {
    let model = load_model();
    let dataset = GraphDataset {
        nodes: model.nodes().to_vec(),
        edges: model.edges().to_vec(),
        categories: model.categories().to_vec(),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("factor_graph.json");
    std::fs::write(&path, serde_json::to_string_pretty(&dataset).unwrap()).unwrap();

    let reloaded = GraphModel::from_path(&path).unwrap();
    assert!(reloaded.report().is_clean());
    assert_eq!(reloaded.full_view(), model.full_view());
    assert_eq!(reloaded.list_categories(), model.list_categories());
}

#[test]
fn test_missing_dataset_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GraphModel::from_path(dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(err.code(), "DATASET_IO");
}
