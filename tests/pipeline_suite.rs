use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lineage_graph::classify::compute_layer_map;
use lineage_graph::config::Config;
use lineage_graph::ir::{
    ArchitectureLayer, ImpactResult, ImpactRole, ImpactedNode, NodeKind, RankDir, RawGraph,
    RiskLevel, TraversalDirection, VisualNode,
};
use lineage_graph::layout::{LayoutOptions, layout};
use lineage_graph::source::{FileSource, LineageSource};
use lineage_graph::theme::Theme;
use lineage_graph::transform::transform;
use lineage_graph::view::{FetchOutcome, GraphView, LayoutPhase, ViewStatus};
use lineage_graph::{PrepareOptions, prepare};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> RawGraph {
    let text = std::fs::read_to_string(fixture_path(name)).expect("fixture read failed");
    RawGraph::from_json(&text).expect("fixture parse failed")
}

fn find<'a>(nodes: &'a [VisualNode], id: &str) -> &'a VisualNode {
    nodes
        .iter()
        .find(|node| node.id == id)
        .unwrap_or_else(|| panic!("node {id} missing"))
}

fn main_axis(node: &VisualNode, rankdir: RankDir) -> f32 {
    let position = node.position.expect("node positioned");
    if rankdir.is_horizontal() {
        position.x
    } else {
        position.y
    }
}

#[test]
fn scenario_a_columns_fold_and_tables_promote() {
    let graph = transform(&load_fixture("scenario_a.json"));

    assert!(graph.node("C1").is_none());
    assert!(graph.node("C2").is_none());
    let table = graph.node("T1").expect("T1");
    let columns = table.embedded_columns.as_ref().expect("embedded columns");
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["C1", "C2"]);
    assert_eq!(columns[0].data_type.as_deref(), Some("bigint"));
    assert_eq!(columns[1].nullable, Some(true));
    assert_eq!(
        table.canonical_key.as_deref(),
        Some("warehouse://analytics/orders")
    );

    let layers = compute_layer_map(&graph.nodes, &graph.edges);
    assert_eq!(layers.get("M1"), Some(&ArchitectureLayer::Staging));
    assert_eq!(layers.get("T1"), Some(&ArchitectureLayer::Staging));
}

#[test]
fn scenario_b_consumption_edges_point_downstream() {
    let raw = RawGraph::from_json(
        r#"{"nodes":[
            {"id":"T1","type":"warehouse.table","label":"orders"},
            {"id":"card1","type":"metabase.card","label":"Orders"}
        ],"edges":[
            {"id":"r","source":"card1","target":"T1","type":"card_reads_table"}
        ]}"#,
    )
    .expect("parse");
    let graph = transform(&raw);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].source, "T1");
    assert_eq!(graph.edges[0].target, "card1");
    assert_eq!(graph.edges[0].edge_type, "card_reads_table");
}

#[test]
fn scenario_c_upstream_filter_hides_downstream_nodes() {
    let raw = RawGraph::from_json(
        r#"{"nodes":[
            {"id":"A","type":"warehouse.table","label":"a"},
            {"id":"B","type":"warehouse.table","label":"b"},
            {"id":"C","type":"warehouse.table","label":"c"},
            {"id":"D","type":"warehouse.table","label":"d"}
        ],"edges":[
            {"source":"A","target":"B","type":"table_feeds_table"},
            {"source":"B","target":"C","type":"table_feeds_table"},
            {"source":"C","target":"D","type":"table_feeds_table"}
        ]}"#,
    )
    .expect("parse");

    let mut view = GraphView::default();
    let token = view.begin_fetch();
    view.complete_fetch(token, Ok(raw));
    view.run_layout_with_defaults();
    let before: Vec<_> = view.nodes().iter().map(|n| n.position).collect();

    view.set_direction_filter(Some("C"), TraversalDirection::Upstream);
    let snapshot = view.snapshot();
    assert_eq!(snapshot.visible_node_ids(), vec!["A", "B", "C"]);
    assert!(view.node("D").expect("D").visibility.hidden_by_direction());
    let hidden_edges: Vec<&str> = view
        .edges()
        .iter()
        .filter(|e| e.hidden)
        .map(|e| e.target.as_str())
        .collect();
    assert_eq!(hidden_edges, vec!["D"]);

    let after: Vec<_> = view.nodes().iter().map(|n| n.position).collect();
    assert_eq!(before, after);
}

#[test]
fn scenario_d_impact_styles_root_impacted_and_unaffected() {
    let raw = RawGraph::from_json(
        r#"{"nodes":[
            {"id":"R","type":"dbt.model","label":"fct_orders"},
            {"id":"X","type":"metabase.card","label":"Revenue"},
            {"id":"Y","type":"warehouse.table","label":"customers"}
        ],"edges":[
            {"source":"X","target":"R","type":"card_reads_model"}
        ]}"#,
    )
    .expect("parse");
    let impact = ImpactResult {
        root_node_id: "R".to_string(),
        root_label: "fct_orders".to_string(),
        total_affected: 1,
        by_risk: BTreeMap::from([(RiskLevel::High, 1)]),
        max_depth: 1,
        impacted_nodes: vec![ImpactedNode {
            node_id: "X".to_string(),
            label: "Revenue".to_string(),
            node_type: "metabase.card".to_string(),
            depth: 1,
            risk_level: RiskLevel::High,
            risk_reason: "direct reader".to_string(),
        }],
    };
    let options = PrepareOptions {
        impact: Some(impact),
        dim_unaffected: true,
        hide_unaffected: false,
        ..PrepareOptions::default()
    };
    let snapshot = prepare(raw, Config::default(), &options);
    let theme = Theme::standard();

    let root = find(&snapshot.nodes, "R");
    assert_eq!(root.style.opacity, 1.0);
    assert_eq!(root.style.impact, Some(ImpactRole::Root));
    assert_eq!(
        root.style.border_color.as_deref(),
        Some(theme.root_border_color.as_str())
    );

    let x = find(&snapshot.nodes, "X");
    assert_eq!(x.style.opacity, 1.0);
    assert_eq!(x.style.border_color.as_deref(), Some(theme.high_color.as_str()));

    let y = find(&snapshot.nodes, "Y");
    assert!(y.style.opacity < 1.0);
    assert!(!y.visibility.is_hidden());
}

#[test]
fn scenario_e_stale_response_is_discarded() {
    let mut view = GraphView::default();
    let first = view.begin_fetch();
    let second = view.begin_fetch();

    let outcome = view.complete_fetch(second, Ok(load_fixture("scenario_a.json")));
    assert_eq!(outcome, FetchOutcome::Applied);
    let outcome = view.complete_fetch(first, Ok(load_fixture("warehouse.json")));
    assert_eq!(outcome, FetchOutcome::Stale);

    let mut ids: Vec<&str> = view.nodes().iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["M1", "T1"]);
    assert_eq!(view.status(), &ViewStatus::Ready);
}

#[test]
fn warehouse_layers_follow_zone_order() {
    let graph = transform(&load_fixture("warehouse.json"));
    let layers = compute_layer_map(&graph.nodes, &graph.edges);
    let expected = [
        ("raw_orders_tbl", ArchitectureLayer::Sources),
        ("src_orders", ArchitectureLayer::Sources),
        ("stg_orders", ArchitectureLayer::Staging),
        ("stg_orders_tbl", ArchitectureLayer::Staging),
        ("fct_orders", ArchitectureLayer::Marts),
        ("fct_orders_tbl", ArchitectureLayer::Marts),
        ("card_rev", ArchitectureLayer::Consumption),
        ("card_raw", ArchitectureLayer::Consumption),
        ("dash", ArchitectureLayer::Consumption),
        ("kpi", ArchitectureLayer::Consumption),
    ];
    for (id, layer) in expected {
        assert_eq!(layers.get(id), Some(&layer), "layer of {id}");
    }
    assert_eq!(layers.len(), expected.len());
    assert!(graph.edges.iter().all(|e| e.source != "ghost" && e.target != "ghost"));
}

#[test]
fn consumption_nodes_rank_after_everything_in_every_direction() {
    let graph = transform(&load_fixture("warehouse.json"));
    let layers = compute_layer_map(&graph.nodes, &graph.edges);
    for rankdir in [
        RankDir::LeftRight,
        RankDir::RightLeft,
        RankDir::TopBottom,
        RankDir::BottomTop,
    ] {
        let options = LayoutOptions {
            rankdir,
            ..LayoutOptions::default()
        };
        let positioned = layout(&graph.nodes, &graph.edges, &options);
        assert_eq!(positioned.len(), graph.nodes.len());

        let (consumption, others): (Vec<&VisualNode>, Vec<&VisualNode>) = positioned
            .iter()
            .partition(|node| layers.get(&node.id) == Some(&ArchitectureLayer::Consumption));
        for late in &consumption {
            for early in &others {
                let (late_pos, early_pos) = (main_axis(late, rankdir), main_axis(early, rankdir));
                if rankdir.is_reversed() {
                    assert!(late_pos < early_pos, "{rankdir:?}: {} vs {}", late.id, early.id);
                } else {
                    assert!(late_pos > early_pos, "{rankdir:?}: {} vs {}", late.id, early.id);
                }
            }
        }

        let src = main_axis(find(&positioned, "src_orders"), rankdir);
        let stg = main_axis(find(&positioned, "stg_orders"), rankdir);
        let fct = main_axis(find(&positioned, "fct_orders"), rankdir);
        if rankdir.is_reversed() {
            assert!(src > stg && stg > fct, "{rankdir:?}");
        } else {
            assert!(src < stg && stg < fct, "{rankdir:?}");
        }
    }
}

#[test]
fn layout_is_deterministic() {
    let options = PrepareOptions {
        show_zones: true,
        ..PrepareOptions::default()
    };
    let first = prepare(load_fixture("warehouse.json"), Config::default(), &options);
    let second = prepare(load_fixture("warehouse.json"), Config::default(), &options);
    assert_eq!(first, second);
}

#[test]
fn zone_overlays_come_first_and_cover_each_layer() {
    let options = PrepareOptions {
        show_zones: true,
        ..PrepareOptions::default()
    };
    let snapshot = prepare(load_fixture("warehouse.json"), Config::default(), &options);

    let zones: Vec<&VisualNode> = snapshot.nodes.iter().take_while(|n| !n.is_data()).collect();
    let ids: Vec<&str> = zones.iter().map(|z| z.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "__zone_sources__",
            "__zone_staging__",
            "__zone_marts__",
            "__zone_consumption__"
        ]
    );
    assert!(snapshot.nodes[zones.len()..].iter().all(VisualNode::is_data));

    let size = Config::default().layout.default_node_size();
    for zone in zones {
        let NodeKind::Zone(layer) = zone.kind else {
            panic!("{} is not a zone", zone.id);
        };
        let origin = zone.position.expect("zone positioned");
        let extent = zone.measured_size.expect("zone sized");
        for node in snapshot.nodes.iter().filter(|n| n.is_data()) {
            if snapshot.layers.get(&node.id) != Some(&layer) {
                continue;
            }
            let position = node.position.expect("positioned");
            let node_size = node.size_or(size);
            assert!(position.x >= origin.x && position.y >= origin.y);
            assert!(position.x + node_size.width <= origin.x + extent.width + 1e-3);
            assert!(position.y + node_size.height <= origin.y + extent.height + 1e-3);
        }
    }
}

#[test]
fn file_source_drives_fetch_and_impact() {
    let source = FileSource::new(fixture_path("warehouse.json"))
        .with_impact(fixture_path("impact_fct_orders.json"));

    let mut view = GraphView::default();
    let outcome = view.fetch_with(&source, Some("fct_orders"), TraversalDirection::Downstream);
    assert_eq!(outcome, FetchOutcome::Applied);
    assert_eq!(view.phase(), LayoutPhase::Measuring);
    assert!(view.run_layout_with_defaults());

    view.set_direction_filter(Some("fct_orders"), TraversalDirection::Downstream);
    view.fetch_impact_with(&source, "fct_orders", false, true)
        .expect("impact loads");

    let visible = view.snapshot().visible_node_ids().len();
    assert_eq!(visible, 4);
    let card = view.node("card_rev").expect("card_rev");
    assert_eq!(
        card.style.impact,
        Some(ImpactRole::Impacted(RiskLevel::Critical))
    );
    let dash = view.node("dash").expect("dash");
    assert!(dash.visibility.hidden_by_impact());
    assert!(!dash.visibility.hidden_by_direction());
    let staging = view.node("stg_orders").expect("stg_orders");
    assert!(staging.visibility.hidden_by_direction() && staging.visibility.hidden_by_impact());

    assert!(source.impact_analysis("dash").is_err());
}

#[test]
fn fetch_failure_and_empty_result_are_distinct() {
    let mut view = GraphView::default();
    view.fetch_with(
        &FileSource::new(fixture_path("missing.json")),
        None,
        TraversalDirection::Both,
    );
    assert!(matches!(view.status(), ViewStatus::Error(_)));
    assert!(view.nodes().is_empty());

    let token = view.begin_fetch();
    view.complete_fetch(token, RawGraph::from_json(r#"{"nodes":[],"edges":[]}"#));
    assert_eq!(view.status(), &ViewStatus::Empty);
    assert_eq!(view.phase(), LayoutPhase::Unpositioned);
}
