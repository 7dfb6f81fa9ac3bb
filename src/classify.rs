//! Architecture-zone classification.
//!
//! Pass 1 labels each node from its category and, for ambiguous tables and
//! models, from naming markers in its label and schema. Pass 2 promotes a
//! table materialized by a staging or marts model into that model's zone.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{ArchitectureLayer, NodeCategory, VisualEdge, VisualNode};

static STAGING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"staging|\bstg_").unwrap());
static MARTS_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"marts|\bint_").unwrap());

pub type LayerMap = BTreeMap<String, ArchitectureLayer>;

pub fn classify_one(node: &VisualNode) -> ArchitectureLayer {
    match node.category {
        NodeCategory::Card | NodeCategory::Dashboard | NodeCategory::Metric => {
            ArchitectureLayer::Consumption
        }
        NodeCategory::Source | NodeCategory::Column | NodeCategory::Zone => {
            ArchitectureLayer::Sources
        }
        NodeCategory::Model => name_marker(node).unwrap_or(ArchitectureLayer::Marts),
        NodeCategory::Table => name_marker(node).unwrap_or(ArchitectureLayer::Sources),
    }
}

fn name_marker(node: &VisualNode) -> Option<ArchitectureLayer> {
    let haystack = format!("{} {}", node.label, node.schema().unwrap_or_default()).to_lowercase();
    if STAGING_MARKER.is_match(&haystack) {
        Some(ArchitectureLayer::Staging)
    } else if MARTS_MARKER.is_match(&haystack) {
        Some(ArchitectureLayer::Marts)
    } else {
        None
    }
}

/// Zone of every data node in `nodes`. Overlay nodes are not classified.
pub fn compute_layer_map(nodes: &[VisualNode], edges: &[VisualEdge]) -> LayerMap {
    let mut layers: LayerMap = nodes
        .iter()
        .filter(|node| node.is_data())
        .map(|node| (node.id.clone(), classify_one(node)))
        .collect();
    promote_tables(&mut layers, nodes, edges);
    layers
}

/// Tables written by a non-sources model take that model's zone.
pub fn promote_tables(layers: &mut LayerMap, nodes: &[VisualNode], edges: &[VisualEdge]) {
    let categories: HashMap<&str, NodeCategory> = nodes
        .iter()
        .filter(|node| node.is_data())
        .map(|node| (node.id.as_str(), node.category))
        .collect();

    for edge in edges {
        let (Some(source_cat), Some(target_cat)) = (
            categories.get(edge.source.as_str()),
            categories.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if !source_cat.is_model() || !target_cat.is_table_like() {
            continue;
        }
        let Some(model_layer) = layers.get(&edge.source).copied() else {
            continue;
        };
        if model_layer == ArchitectureLayer::Sources {
            continue;
        }
        if let Some(table_layer) = layers.get_mut(&edge.target) {
            if *table_layer != model_layer {
                tracing::trace!(
                    table = %edge.target,
                    from = table_layer.as_str(),
                    to = model_layer.as_str(),
                    "promoted table zone"
                );
                *table_layer = model_layer;
            }
        }
    }
}

/// Occupied zones in canonical order.
pub fn occupied_layers(layers: &LayerMap) -> Vec<ArchitectureLayer> {
    ArchitectureLayer::ALL
        .into_iter()
        .filter(|layer| layers.values().any(|assigned| assigned == layer))
        .collect()
}
