use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::ir::{TraversalDirection, VisualEdge, VisualNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    All,
    Only(BTreeSet<String>),
}

impl Reachability {
    pub fn contains(&self, id: &str) -> bool {
        match self {
            Reachability::All => true,
            Reachability::Only(ids) => ids.contains(id),
        }
    }
}

/// Nodes reachable from `root` walking against (`Upstream`) or along
/// (`Downstream`) edge direction. `Both` or no root shows everything.
pub fn filter_by_direction(
    edges: &[VisualEdge],
    root: Option<&str>,
    direction: TraversalDirection,
) -> Reachability {
    let Some(root) = root else {
        return Reachability::All;
    };
    if direction == TraversalDirection::Both {
        return Reachability::All;
    }

    let mut next: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        let (from, to) = match direction {
            TraversalDirection::Upstream => (edge.target.as_str(), edge.source.as_str()),
            _ => (edge.source.as_str(), edge.target.as_str()),
        };
        next.entry(from).or_default().push(to);
    }

    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visited.insert(root.to_string());
    queue.push_back(root);
    while let Some(current) = queue.pop_front() {
        let Some(neighbors) = next.get(current) else {
            continue;
        };
        for neighbor in neighbors {
            if visited.insert((*neighbor).to_string()) {
                queue.push_back(*neighbor);
            }
        }
    }
    Reachability::Only(visited)
}

/// Sets the direction flag on every data node. Positions are untouched.
pub fn apply_direction_filter(
    nodes: &mut [VisualNode],
    edges: &mut [VisualEdge],
    reachable: &Reachability,
) {
    for node in nodes.iter_mut().filter(|node| node.is_data()) {
        let hidden = !reachable.contains(&node.id);
        node.visibility = node.visibility.with_direction(hidden);
    }
    sync_edge_visibility(nodes, edges);
}

/// An edge is hidden when either endpoint is hidden.
pub fn sync_edge_visibility(nodes: &[VisualNode], edges: &mut [VisualEdge]) {
    let hidden: HashSet<&str> = nodes
        .iter()
        .filter(|node| node.visibility.is_hidden())
        .map(|node| node.id.as_str())
        .collect();
    for edge in edges {
        edge.hidden =
            hidden.contains(edge.source.as_str()) || hidden.contains(edge.target.as_str());
    }
}
