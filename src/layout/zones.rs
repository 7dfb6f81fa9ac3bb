use crate::classify::{compute_layer_map, occupied_layers};
use crate::ir::{
    ArchitectureLayer, NodeCategory, NodeKind, Position, Size, VisualEdge, VisualNode,
};

const ZONE_PREFIX: &str = "__zone_";

pub fn zone_id(layer: ArchitectureLayer) -> String {
    format!("{ZONE_PREFIX}{}__", layer.as_str())
}

pub fn is_zone_id(id: &str) -> bool {
    id.starts_with(ZONE_PREFIX) && id.ends_with("__")
}

fn zone_label(layer: ArchitectureLayer) -> &'static str {
    match layer {
        ArchitectureLayer::Sources => "Sources",
        ArchitectureLayer::Staging => "Staging",
        ArchitectureLayer::Marts => "Marts",
        ArchitectureLayer::Consumption => "Consumption",
    }
}

/// One background node per occupied zone, enclosing that zone's positioned
/// data nodes with `padding` on every side.
pub fn zone_overlays(
    nodes: &[VisualNode],
    edges: &[VisualEdge],
    padding: f32,
    default_size: Size,
) -> Vec<VisualNode> {
    let layers = compute_layer_map(nodes, edges);
    let mut overlays = Vec::new();
    for layer in occupied_layers(&layers) {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        let mut members = 0usize;
        for node in nodes.iter().filter(|node| node.is_data()) {
            if layers.get(&node.id) != Some(&layer) {
                continue;
            }
            let Some(position) = node.position else {
                continue;
            };
            let size = node.size_or(default_size);
            min_x = min_x.min(position.x);
            min_y = min_y.min(position.y);
            max_x = max_x.max(position.x + size.width);
            max_y = max_y.max(position.y + size.height);
            members += 1;
        }
        if members == 0 {
            continue;
        }

        let mut overlay = VisualNode::data(&zone_id(layer), NodeCategory::Zone, zone_label(layer));
        overlay.kind = NodeKind::Zone(layer);
        overlay.entity_type = "zone".to_string();
        overlay.position = Some(Position {
            x: min_x - padding,
            y: min_y - padding,
        });
        overlay.measured_size = Some(Size {
            width: max_x - min_x + padding * 2.0,
            height: max_y - min_y + padding * 2.0,
        });
        overlays.push(overlay);
    }
    overlays
}
