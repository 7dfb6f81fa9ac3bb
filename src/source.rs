use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ir::{ImpactResult, RawGraph, TraversalDirection};

/// The lineage backend as seen by the pipeline.
pub trait LineageSource {
    fn lineage_graph(&self, root: Option<&str>, direction: TraversalDirection) -> Result<RawGraph>;

    fn impact_analysis(&self, node_id: &str) -> Result<ImpactResult>;
}

/// Serves pre-fetched backend responses from JSON files.
#[derive(Debug, Clone)]
pub struct FileSource {
    graph_path: PathBuf,
    impact_path: Option<PathBuf>,
}

impl FileSource {
    pub fn new(graph_path: impl Into<PathBuf>) -> Self {
        Self {
            graph_path: graph_path.into(),
            impact_path: None,
        }
    }

    pub fn with_impact(mut self, impact_path: impl Into<PathBuf>) -> Self {
        self.impact_path = Some(impact_path.into());
        self
    }

    pub fn graph_path(&self) -> &Path {
        &self.graph_path
    }
}

impl LineageSource for FileSource {
    fn lineage_graph(&self, root: Option<&str>, direction: TraversalDirection) -> Result<RawGraph> {
        tracing::debug!(
            path = %self.graph_path.display(),
            root = root.unwrap_or("-"),
            direction = direction.as_str(),
            "reading lineage graph"
        );
        let text = std::fs::read_to_string(&self.graph_path)?;
        RawGraph::from_json(&text)
    }

    fn impact_analysis(&self, node_id: &str) -> Result<ImpactResult> {
        let Some(path) = &self.impact_path else {
            return Err(Error::Fetch(format!("no impact analysis available for {node_id}")));
        };
        let text = std::fs::read_to_string(path)?;
        let result: ImpactResult = serde_json::from_str(&text)?;
        if result.root_node_id != node_id {
            return Err(Error::Fetch(format!(
                "impact analysis is rooted at {} not {node_id}",
                result.root_node_id
            )));
        }
        Ok(result)
    }
}

/// Serves a graph already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub graph: RawGraph,
    pub impact: Option<ImpactResult>,
}

impl StaticSource {
    pub fn new(graph: RawGraph) -> Self {
        Self {
            graph,
            impact: None,
        }
    }
}

impl LineageSource for StaticSource {
    fn lineage_graph(&self, _root: Option<&str>, _direction: TraversalDirection) -> Result<RawGraph> {
        Ok(self.graph.clone())
    }

    fn impact_analysis(&self, node_id: &str) -> Result<ImpactResult> {
        match &self.impact {
            Some(result) if result.root_node_id == node_id => Ok(result.clone()),
            _ => Err(Error::Fetch(format!("no impact analysis available for {node_id}"))),
        }
    }
}
