use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lineage_graph::config::Config;
use lineage_graph::ir::{Entity, RawGraph, Relationship};
use lineage_graph::layout::{LayoutOptions, layout};
use lineage_graph::transform::transform;
use lineage_graph::{PrepareOptions, prepare};
use std::hint::black_box;

/// Synthetic warehouse: `width` parallel lineage lanes, each a source table
/// with columns feeding a staging model, a marts model and a card, plus
/// cross-lane joins every few lanes and one dashboard over every card.
fn synthetic_lineage(width: usize, columns: usize) -> RawGraph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for lane in 0..width {
        let raw = format!("raw_{lane}");
        let stg = format!("stg_{lane}");
        let fct = format!("fct_{lane}");
        let stg_tbl = format!("stg_tbl_{lane}");
        let card = format!("card_{lane}");
        nodes.push(Entity::new(&raw, "warehouse.table", &format!("orders_{lane}")).with_prop("schema", "raw"));
        nodes.push(Entity::new(&stg, "dbt.model", &format!("stg_orders_{lane}")));
        nodes.push(Entity::new(&stg_tbl, "warehouse.table", &format!("orders_{lane}")));
        nodes.push(Entity::new(&fct, "dbt.model", &format!("fct_orders_{lane}")).with_prop("schema", "marts"));
        nodes.push(Entity::new(&card, "metabase.card", &format!("Orders {lane}")));
        for col in 0..columns {
            let id = format!("{raw}_c{col}");
            nodes.push(Entity::new(&id, "warehouse.column", &format!("col_{col}")).with_prop("data_type", "text"));
            edges.push(Relationship::new(&raw, &id, "table_has_column"));
        }
        edges.push(Relationship::new(&stg, &raw, "dbt_model_depends_on_source"));
        edges.push(Relationship::new(&stg, &stg_tbl, "dbt_model_materializes_table"));
        edges.push(Relationship::new(&fct, &stg, "dbt_model_depends_on_model"));
        edges.push(Relationship::new(&card, &fct, "card_reads_model"));
        if lane >= 3 && lane % 3 == 0 {
            edges.push(Relationship::new(&fct, &format!("stg_{}", lane - 3), "dbt_model_depends_on_model"));
        }
    }
    nodes.push(Entity::new("dash", "metabase.dashboard", "Everything"));
    for lane in 0..width {
        edges.push(Relationship::new("dash", &format!("card_{lane}"), "dashboard_contains_card"));
    }
    RawGraph { nodes, edges }
}

const SIZES: [(&str, usize, usize); 4] = [
    ("lanes_4", 4, 3),
    ("lanes_16", 16, 6),
    ("lanes_64", 64, 8),
    ("lanes_160", 160, 10),
];

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    for (name, width, columns) in SIZES {
        let raw = synthetic_lineage(width, columns);
        group.bench_with_input(BenchmarkId::from_parameter(name), &raw, |b, data| {
            b.iter(|| {
                let graph = transform(black_box(data));
                black_box(graph.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let options = LayoutOptions::default();
    for (name, width, columns) in SIZES {
        let graph = transform(&synthetic_lineage(width, columns));
        group.bench_with_input(BenchmarkId::from_parameter(name), &graph, |b, data| {
            b.iter(|| {
                let positioned = layout(black_box(&data.nodes), black_box(&data.edges), &options);
                black_box(positioned.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let options = PrepareOptions {
        root: Some("stg_0".to_string()),
        show_zones: true,
        ..PrepareOptions::default()
    };
    for (name, width, columns) in SIZES {
        let raw = synthetic_lineage(width, columns);
        group.bench_with_input(BenchmarkId::from_parameter(name), &raw, |b, data| {
            b.iter(|| {
                let snapshot = prepare(black_box(data.clone()), Config::default(), &options);
                black_box(snapshot.nodes.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transform, bench_layout, bench_end_to_end);
criterion_main!(benches);
