use std::collections::HashMap;

use crate::ir::{ImpactResult, ImpactRole, NodeStyle, RiskLevel, VisualNode};
use crate::theme::Theme;

/// Styles every data node for an impact result, or clears the overlay when
/// `impact` is `None`. The root and impacted nodes are never dimmed or hidden.
pub fn apply_impact_style(
    nodes: &mut [VisualNode],
    impact: Option<&ImpactResult>,
    dim_unaffected: bool,
    hide_unaffected: bool,
    theme: &Theme,
) {
    let Some(impact) = impact else {
        for node in nodes.iter_mut().filter(|node| node.is_data()) {
            node.style = NodeStyle::default();
            node.visibility = node.visibility.with_impact(false);
        }
        return;
    };

    let mut risks: HashMap<&str, RiskLevel> = HashMap::new();
    for impacted in &impact.impacted_nodes {
        risks
            .entry(impacted.node_id.as_str())
            .and_modify(|level| *level = (*level).max(impacted.risk_level))
            .or_insert(impacted.risk_level);
    }

    for node in nodes.iter_mut().filter(|node| node.is_data()) {
        if node.id == impact.root_node_id {
            node.style = NodeStyle {
                opacity: 1.0,
                border_color: Some(theme.root_border_color.clone()),
                impact: Some(ImpactRole::Root),
            };
            node.visibility = node.visibility.with_impact(false);
        } else if let Some(level) = risks.get(node.id.as_str()) {
            node.style = NodeStyle {
                opacity: 1.0,
                border_color: Some(theme.risk_color(*level).to_string()),
                impact: Some(ImpactRole::Impacted(*level)),
            };
            node.visibility = node.visibility.with_impact(false);
        } else {
            let opacity = if !hide_unaffected && dim_unaffected {
                theme.dimmed_opacity
            } else {
                1.0
            };
            node.style = NodeStyle {
                opacity,
                border_color: None,
                impact: None,
            };
            node.visibility = node.visibility.with_impact(hide_unaffected);
        }
    }
}
