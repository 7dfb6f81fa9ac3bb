use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::classify::LayerMap;
use crate::ir::{VisualEdge, VisualNode};
use crate::view::{FitRequest, GraphView, LayoutPhase, ViewStatus};

/// Everything the rendering surface needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub status: ViewStatus,
    pub generation: u64,
    pub phase: LayoutPhase,
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
    pub layers: LayerMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<FitRequest>,
}

impl GraphSnapshot {
    pub fn from_view(view: &GraphView) -> Self {
        Self {
            status: view.status().clone(),
            generation: view.generation(),
            phase: view.phase(),
            nodes: view.rendered_nodes(),
            edges: view.edges().to_vec(),
            layers: view.layer_map(),
            fit: view.pending_fit().copied(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn visible_node_ids(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| node.is_data() && !node.visibility.is_hidden())
            .map(|node| node.id.as_str())
            .collect()
    }
}

/// Writes the snapshot as pretty JSON to `path`, or to stdout.
pub fn write_snapshot(snapshot: &GraphSnapshot, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
