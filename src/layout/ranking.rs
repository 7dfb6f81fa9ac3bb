use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::LayoutError;

use super::LayoutGraph;

/// Longest-path ranks honoring each edge's minimum length.
///
/// Ranking runs over an acyclic subset of the edges (see [`acyclic_edges`]).
/// Nodes are visited in topological order with ties broken by index (input
/// order).
pub(super) fn assign_ranks(graph: &LayoutGraph) -> Result<Vec<usize>, LayoutError> {
    let n = graph.nodes.len();
    for edge in &graph.edges {
        if edge.from >= n {
            return Err(LayoutError::UnknownNode(edge.from));
        }
        if edge.to >= n {
            return Err(LayoutError::UnknownNode(edge.to));
        }
    }

    let mut outgoing: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut indeg = vec![0usize; n];
    for idx in acyclic_edges(graph) {
        let edge = &graph.edges[idx];
        outgoing[edge.from].push((edge.to, edge.minlen));
        indeg[edge.to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> =
        (0..n).filter(|idx| indeg[*idx] == 0).map(Reverse).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for &(next, _) in &outgoing[idx] {
            indeg[next] -= 1;
            if indeg[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    if order.len() < n {
        return Err(LayoutError::UnrankedNodes(n - order.len()));
    }

    let mut ranks = vec![0usize; n];
    for &idx in &order {
        for &(next, minlen) in &outgoing[idx] {
            ranks[next] = ranks[next].max(ranks[idx] + minlen);
        }
    }
    Ok(ranks)
}

/// Indices of the edges kept for ranking.
///
/// Constraint edges (zero weight) are taken first, then data edges in input
/// order. An edge is left out when its target already reaches its source
/// through kept edges, so only edges that close a cycle are lost and the zone
/// and consumption constraints win over data edges. Self-loops are skipped.
fn acyclic_edges(graph: &LayoutGraph) -> Vec<usize> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); graph.nodes.len()];
    let mut kept = Vec::with_capacity(graph.edges.len());
    let constraints = (0..graph.edges.len()).filter(|idx| graph.edges[*idx].weight <= 0.0);
    let data = (0..graph.edges.len()).filter(|idx| graph.edges[*idx].weight > 0.0);
    for idx in constraints.chain(data) {
        let edge = &graph.edges[idx];
        if edge.from == edge.to {
            continue;
        }
        if reaches(&adjacency, edge.to, edge.from) {
            tracing::debug!(from = edge.from, to = edge.to, "ignoring cycle-closing edge during rank assignment");
            continue;
        }
        adjacency[edge.from].push(edge.to);
        kept.push(idx);
    }
    kept
}

fn reaches(adjacency: &[Vec<usize>], start: usize, goal: usize) -> bool {
    let mut seen = vec![false; adjacency.len()];
    let mut stack = vec![start];
    while let Some(idx) = stack.pop() {
        if idx == goal {
            return true;
        }
        if seen[idx] {
            continue;
        }
        seen[idx] = true;
        stack.extend(adjacency[idx].iter().copied().filter(|next| !seen[*next]));
    }
    false
}

/// Median-heuristic crossing reduction, sweeping down then up `passes` times.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<usize>],
    edges: &[(usize, usize)],
    node_count: usize,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(from, to) in edges {
        outgoing[from].push(to);
        incoming[to].push(from);
    }

    let mut positions = vec![0usize; node_count];
    update_positions(rank_nodes, &mut positions);

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
    }
}

fn update_positions(rank_nodes: &[Vec<usize>], positions: &mut [usize]) {
    for bucket in rank_nodes {
        for (pos, idx) in bucket.iter().enumerate() {
            positions[*idx] = pos;
        }
    }
}

fn sort_bucket(bucket: &mut Vec<usize>, neighbors: &[Vec<usize>], positions: &[usize]) {
    let mut scored: Vec<(f32, usize, usize)> = bucket
        .iter()
        .enumerate()
        .map(|(current, idx)| {
            let score = median_position(&neighbors[*idx], positions).unwrap_or(current as f32);
            (score, current, *idx)
        })
        .collect();
    scored.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    *bucket = scored.into_iter().map(|(_, _, idx)| idx).collect();
}

fn median_position(neighbors: &[usize], positions: &[usize]) -> Option<f32> {
    if neighbors.is_empty() {
        return None;
    }
    let mut values: Vec<f32> = neighbors.iter().map(|idx| positions[*idx] as f32).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) * 0.5)
    }
}
