use std::cmp::Ordering;

use super::LayoutGraph;

pub(super) struct PlacementParams {
    pub horizontal: bool,
    pub node_separation: f32,
    pub rank_separation: f32,
    pub passes: usize,
}

/// Center of every layout node as `(main, cross)`, where the main axis runs
/// along the ranks.
pub(super) fn assign_coordinates(
    graph: &LayoutGraph,
    rank_nodes: &[Vec<usize>],
    edges: &[(usize, usize)],
    params: &PlacementParams,
) -> Vec<(f32, f32)> {
    let n = graph.nodes.len();
    let main_dim = |idx: usize| {
        let node = &graph.nodes[idx];
        if params.horizontal { node.width } else { node.height }
    };
    let cross_half = |idx: usize| {
        let node = &graph.nodes[idx];
        if params.horizontal { node.height / 2.0 } else { node.width / 2.0 }
    };

    let mut main = vec![0.0f32; n];
    let mut main_cursor = 0.0;
    for bucket in rank_nodes {
        let max_main = bucket.iter().map(|idx| main_dim(*idx)).fold(0.0, f32::max);
        for idx in bucket {
            main[*idx] = main_cursor + max_main / 2.0;
        }
        if max_main > 0.0 {
            main_cursor += max_main + params.rank_separation;
        }
    }

    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(from, to) in edges {
        outgoing[from].push(to);
        incoming[to].push(from);
    }

    let mut cross = vec![0.0f32; n];
    for bucket in rank_nodes {
        let mut cursor = 0.0;
        for idx in bucket {
            let half = cross_half(*idx);
            cross[*idx] = cursor + half;
            cursor += half * 2.0 + params.node_separation;
        }
        let shift = (cursor - params.node_separation).max(0.0) / 2.0;
        for idx in bucket {
            cross[*idx] -= shift;
        }
    }

    let place_rank = |bucket: &[usize], neighbors: &[Vec<usize>], cross: &mut [f32]| {
        if bucket.is_empty() {
            return;
        }
        let mut desired: Vec<f32> = Vec::with_capacity(bucket.len());
        for idx in bucket {
            let current = cross[*idx];
            let mut centers: Vec<f32> = neighbors[*idx].iter().map(|n| cross[*n]).collect();
            if centers.is_empty() {
                desired.push(current);
                continue;
            }
            centers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = centers.len() / 2;
            let median = if centers.len() % 2 == 1 {
                centers[mid]
            } else {
                (centers[mid - 1] + centers[mid]) * 0.5
            };
            desired.push(median * 0.85 + current * 0.15);
        }
        let desired_mean = desired.iter().sum::<f32>() / desired.len() as f32;

        let mut assigned: Vec<f32> = Vec::with_capacity(bucket.len());
        let mut prev: Option<(f32, f32)> = None;
        for (pos, idx) in bucket.iter().enumerate() {
            let half = cross_half(*idx);
            let center = match prev {
                Some((prev_center, prev_half)) => {
                    desired[pos].max(prev_center + prev_half + half + params.node_separation)
                }
                None => desired[pos],
            };
            assigned.push(center);
            prev = Some((center, half));
        }
        let actual_mean = assigned.iter().sum::<f32>() / assigned.len() as f32;
        let delta = desired_mean - actual_mean;
        for (idx, center) in bucket.iter().zip(assigned) {
            cross[*idx] = center + delta;
        }
    };

    for _ in 0..params.passes.max(1) {
        for bucket in rank_nodes {
            place_rank(bucket, &incoming, &mut cross);
        }
        for bucket in rank_nodes.iter().rev() {
            place_rank(bucket, &outgoing, &mut cross);
        }
    }

    main.into_iter().zip(cross).collect()
}
