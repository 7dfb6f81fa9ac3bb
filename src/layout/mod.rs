//! Layered layout for lineage graphs.
//!
//! Ranks are assigned by longest path over the data edges plus synthetic
//! constraint edges derived from the architecture zones: one edge per pair of
//! adjacent occupied zones and a barrier node that keeps every consumption node
//! after every other node. Synthetic nodes live in their own index space and
//! never reach the output.

mod placement;
mod ranking;
pub mod zones;

pub use zones::{is_zone_id, zone_id, zone_overlays};

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::classify::{compute_layer_map, occupied_layers};
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::ir::{ArchitectureLayer, Position, RankDir, Size, VisualEdge, VisualNode};

use placement::{PlacementParams, assign_coordinates};
use ranking::{assign_ranks, order_rank_nodes};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub rankdir: RankDir,
    pub node_separation: f32,
    pub rank_separation: f32,
    pub margin: f32,
    pub default_node_size: Size,
    pub order_passes: usize,
}

impl From<&LayoutConfig> for LayoutOptions {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            rankdir: config.rankdir,
            node_separation: config.node_spacing,
            rank_separation: config.rank_spacing,
            margin: config.margin,
            default_node_size: config.default_node_size(),
            order_passes: config.order_passes,
        }
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn center(&self) -> Position {
        Position {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayoutKey {
    /// Index into the caller's node slice.
    Data(usize),
    Barrier,
    Dummy,
}

#[derive(Debug, Clone)]
pub(crate) struct LayoutNode {
    pub key: LayoutKey,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub(crate) struct LayoutEdge {
    pub from: usize,
    pub to: usize,
    pub minlen: usize,
    /// Zero for constraint edges; those shape ranks but not ordering.
    pub weight: f32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    fn add_node(&mut self, key: LayoutKey, size: Size) -> usize {
        self.nodes.push(LayoutNode {
            key,
            width: size.width,
            height: size.height,
        });
        self.nodes.len() - 1
    }

    pub(crate) fn add_edge(&mut self, from: usize, to: usize, minlen: usize, weight: f32) {
        self.edges.push(LayoutEdge {
            from,
            to,
            minlen,
            weight,
        });
    }
}

/// Positions every data node; overlay nodes are passed through unchanged and
/// placed first. On failure the input is returned as is.
pub fn layout(nodes: &[VisualNode], edges: &[VisualEdge], options: &LayoutOptions) -> Vec<VisualNode> {
    match try_layout(nodes, edges, options) {
        Ok(positioned) => positioned,
        Err(err) => {
            tracing::warn!(%err, "layout failed; keeping previous positions");
            nodes.to_vec()
        }
    }
}

pub fn try_layout(
    nodes: &[VisualNode],
    edges: &[VisualEdge],
    options: &LayoutOptions,
) -> Result<Vec<VisualNode>, LayoutError> {
    let data_indices: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_data())
        .map(|(idx, _)| idx)
        .collect();
    if data_indices.is_empty() {
        return Ok(nodes.to_vec());
    }

    let mut graph = build_layout_graph(nodes, &data_indices, edges, options);
    let mut ranks = assign_ranks(&graph)?;
    let weighted = expand_long_edges(&mut graph, &mut ranks);

    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let mut rank_nodes: Vec<Vec<usize>> = vec![Vec::new(); max_rank + 1];
    for (idx, rank) in ranks.iter().enumerate() {
        rank_nodes[*rank].push(idx);
    }
    order_rank_nodes(
        &mut rank_nodes,
        &weighted,
        graph.nodes.len(),
        options.order_passes,
    );

    let params = PlacementParams {
        horizontal: options.rankdir.is_horizontal(),
        node_separation: options.node_separation,
        rank_separation: options.rank_separation,
        passes: options.order_passes,
    };
    let centers = assign_coordinates(&graph, &rank_nodes, &weighted, &params);

    let mut top_left: HashMap<usize, Position> = HashMap::new();
    for (layout_idx, node) in graph.nodes.iter().enumerate() {
        let LayoutKey::Data(input_idx) = node.key else {
            continue;
        };
        let (main, cross) = centers[layout_idx];
        let (cx, cy) = if params.horizontal {
            (main, cross)
        } else {
            (cross, main)
        };
        top_left.insert(
            input_idx,
            Position {
                x: cx - node.width / 2.0,
                y: cy - node.height / 2.0,
            },
        );
    }
    normalize_positions(&mut top_left, nodes, options);

    tracing::debug!(
        data_nodes = data_indices.len(),
        ranks = rank_nodes.len(),
        layout_nodes = graph.nodes.len(),
        "layout complete"
    );

    let mut output: Vec<VisualNode> = nodes.iter().filter(|node| !node.is_data()).cloned().collect();
    for idx in data_indices {
        let mut node = nodes[idx].clone();
        if let Some(position) = top_left.get(&idx) {
            node.position = Some(*position);
        }
        output.push(node);
    }
    Ok(output)
}

fn build_layout_graph(
    nodes: &[VisualNode],
    data_indices: &[usize],
    edges: &[VisualEdge],
    options: &LayoutOptions,
) -> LayoutGraph {
    let mut graph = LayoutGraph::default();
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for &idx in data_indices {
        let node = &nodes[idx];
        if by_id.contains_key(node.id.as_str()) {
            continue;
        }
        let layout_idx = graph.add_node(LayoutKey::Data(idx), node.size_or(options.default_node_size));
        by_id.insert(node.id.as_str(), layout_idx);
    }

    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    for edge in edges {
        let (Some(&from), Some(&to)) = (by_id.get(edge.source.as_str()), by_id.get(edge.target.as_str()))
        else {
            continue;
        };
        if from == to || !seen.insert((from, to)) {
            continue;
        }
        graph.add_edge(from, to, 1, 1.0);
    }

    let layers = compute_layer_map(nodes, edges);
    let layer_of = |id: &str| layers.get(id).copied().unwrap_or(ArchitectureLayer::Sources);

    // Representative of each zone is its first data node in input order.
    let mut representatives: HashMap<ArchitectureLayer, usize> = HashMap::new();
    for node in &graph.nodes {
        let LayoutKey::Data(input_idx) = node.key else {
            continue;
        };
        let id = nodes[input_idx].id.as_str();
        if let Some(&layout_idx) = by_id.get(id) {
            representatives.entry(layer_of(id)).or_insert(layout_idx);
        }
    }
    let occupied = occupied_layers(&layers);
    for pair in occupied.windows(2) {
        if let (Some(&from), Some(&to)) = (representatives.get(&pair[0]), representatives.get(&pair[1])) {
            graph.add_edge(from, to, 2, 0.0);
        }
    }

    let mut consumption: Vec<usize> = Vec::new();
    let mut others: Vec<usize> = Vec::new();
    for (id, &layout_idx) in &by_id {
        if layer_of(id) == ArchitectureLayer::Consumption {
            consumption.push(layout_idx);
        } else {
            others.push(layout_idx);
        }
    }
    if !consumption.is_empty() && !others.is_empty() {
        consumption.sort_unstable();
        others.sort_unstable();
        let barrier = graph.add_node(
            LayoutKey::Barrier,
            Size {
                width: 0.0,
                height: 0.0,
            },
        );
        for idx in others {
            graph.add_edge(idx, barrier, 0, 0.0);
        }
        for idx in consumption {
            graph.add_edge(barrier, idx, 1, 0.0);
        }
    }

    graph
}

/// Splits weighted edges spanning more than one rank with zero-size dummy
/// nodes and returns the weighted adjacency used for ordering and placement.
fn expand_long_edges(graph: &mut LayoutGraph, ranks: &mut Vec<usize>) -> Vec<(usize, usize)> {
    let mut expanded = Vec::new();
    let original: Vec<(usize, usize)> = graph
        .edges
        .iter()
        .filter(|edge| edge.weight > 0.0 && edge.from != edge.to)
        .map(|edge| (edge.from, edge.to))
        .collect();
    for (from, to) in original {
        let (from_rank, to_rank) = (ranks[from], ranks[to]);
        if to_rank <= from_rank {
            continue;
        }
        let mut prev = from;
        for step in 1..(to_rank - from_rank) {
            let dummy = graph.add_node(
                LayoutKey::Dummy,
                Size {
                    width: 0.0,
                    height: 0.0,
                },
            );
            ranks.push(from_rank + step);
            expanded.push((prev, dummy));
            prev = dummy;
        }
        expanded.push((prev, to));
    }
    expanded
}

fn normalize_positions(
    positions: &mut HashMap<usize, Position>,
    nodes: &[VisualNode],
    options: &LayoutOptions,
) {
    if positions.is_empty() {
        return;
    }
    let size_of = |idx: usize| nodes[idx].size_or(options.default_node_size);
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    for position in positions.values() {
        min_x = min_x.min(position.x);
        min_y = min_y.min(position.y);
    }
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (idx, position) in positions.iter_mut() {
        position.x += options.margin - min_x;
        position.y += options.margin - min_y;
        let size = size_of(*idx);
        max_x = max_x.max(position.x + size.width);
        max_y = max_y.max(position.y + size.height);
    }

    match options.rankdir {
        RankDir::RightLeft => {
            for (idx, position) in positions.iter_mut() {
                position.x = max_x + options.margin - position.x - size_of(*idx).width;
            }
        }
        RankDir::BottomTop => {
            for (idx, position) in positions.iter_mut() {
                position.y = max_y + options.margin - position.y - size_of(*idx).height;
            }
        }
        RankDir::LeftRight | RankDir::TopBottom => {}
    }
}

/// Bounding box of the positioned data nodes.
pub fn bounding_box(nodes: &[VisualNode], default_size: Size) -> Option<Bounds> {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    let mut any = false;
    for node in nodes.iter().filter(|node| node.is_data()) {
        let Some(position) = node.position else {
            continue;
        };
        let size = node.size_or(default_size);
        min_x = min_x.min(position.x);
        min_y = min_y.min(position.y);
        max_x = max_x.max(position.x + size.width);
        max_y = max_y.max(position.y + size.height);
        any = true;
    }
    any.then(|| Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}
