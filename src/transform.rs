use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::ir::{
    ColumnInfo, Entity, NodeKind, NodeStyle, RawGraph, Relationship, VisualEdge, VisualNode,
    Visibility,
};

const HAS_COLUMN_TYPES: [&str; 2] = ["table_has_column", "view_has_column"];

// Relationships stored as "consumer reads producer"; flipped so visual edges
// follow the data.
const REVERSED_TYPES: [&str; 8] = [
    "card_reads_table",
    "card_reads_model",
    "card_reads_card",
    "dashboard_contains_card",
    "dbt_model_depends_on_model",
    "dbt_model_depends_on_source",
    "metric_reads_card",
    "metric_reads_table",
];

pub fn is_has_column(relationship_type: &str) -> bool {
    HAS_COLUMN_TYPES.contains(&relationship_type)
}

pub fn is_reversed(relationship_type: &str) -> bool {
    REVERSED_TYPES.contains(&relationship_type)
}

/// Render-ready node and edge sets produced from one backend response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

impl VisualGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

pub fn transform(raw: &RawGraph) -> VisualGraph {
    let columns: HashMap<&str, ColumnInfo> = raw
        .nodes
        .iter()
        .filter(|entity| entity.category().is_column())
        .map(|entity| (entity.id.as_str(), column_info(entity)))
        .collect();

    let mut table_columns: HashMap<&str, Vec<ColumnInfo>> = HashMap::new();
    for rel in &raw.edges {
        if !is_has_column(&rel.relationship_type) {
            continue;
        }
        let Some(info) = columns.get(rel.target.as_str()) else {
            continue;
        };
        table_columns
            .entry(rel.source.as_str())
            .or_default()
            .push(info.clone());
    }

    let mut node_ids: HashSet<&str> = HashSet::new();
    let mut nodes = Vec::with_capacity(raw.nodes.len().saturating_sub(columns.len()));
    for entity in &raw.nodes {
        if entity.category().is_column() {
            continue;
        }
        if !node_ids.insert(entity.id.as_str()) {
            tracing::debug!(id = %entity.id, "duplicate entity id; keeping first");
            continue;
        }
        let embedded = table_columns
            .get(entity.id.as_str())
            .filter(|cols| !cols.is_empty())
            .cloned();
        nodes.push(visual_node(entity, embedded));
    }

    let mut edges = Vec::with_capacity(raw.edges.len());
    let mut dropped = 0usize;
    for rel in &raw.edges {
        if is_has_column(&rel.relationship_type) && columns.contains_key(rel.target.as_str()) {
            continue;
        }
        if !node_ids.contains(rel.source.as_str()) || !node_ids.contains(rel.target.as_str()) {
            dropped += 1;
            continue;
        }
        edges.push(visual_edge(rel));
    }
    if dropped > 0 {
        tracing::debug!(dropped, "dropped relationships with unknown or column endpoints");
    }
    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        columns = columns.len(),
        "transformed lineage graph"
    );

    VisualGraph { nodes, edges }
}

fn visual_node(entity: &Entity, embedded_columns: Option<Vec<ColumnInfo>>) -> VisualNode {
    VisualNode {
        id: entity.id.clone(),
        kind: NodeKind::Data,
        category: entity.category(),
        entity_type: entity.entity_type.clone(),
        label: entity.display_label().to_string(),
        canonical_key: entity
            .canonical_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string),
        props: entity.props.clone(),
        embedded_columns,
        position: None,
        measured_size: None,
        visibility: Visibility::Visible,
        style: NodeStyle::default(),
    }
}

fn visual_edge(rel: &Relationship) -> VisualEdge {
    let (source, target) = if is_reversed(&rel.relationship_type) {
        (&rel.target, &rel.source)
    } else {
        (&rel.source, &rel.target)
    };
    let id = if rel.id.is_empty() {
        format!("{}:{}:{}", rel.source, rel.relationship_type, rel.target)
    } else {
        rel.id.clone()
    };
    VisualEdge {
        id,
        source: source.clone(),
        target: target.clone(),
        edge_type: rel.relationship_type.clone(),
        props: rel.props.clone(),
        hidden: false,
    }
}

fn column_info(entity: &Entity) -> ColumnInfo {
    let prop_str = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| entity.props.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    };
    let nullable = ["nullable", "is_nullable"]
        .iter()
        .find_map(|key| match entity.props.get(*key) {
            Some(Value::Bool(flag)) => Some(*flag),
            Some(Value::String(text)) => match text.to_ascii_lowercase().as_str() {
                "yes" | "true" => Some(true),
                "no" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        });
    ColumnInfo {
        name: prop_str(&["name", "column_name"])
            .unwrap_or_else(|| entity.display_label().to_string()),
        data_type: prop_str(&["data_type", "dataType"]),
        nullable,
    }
}
