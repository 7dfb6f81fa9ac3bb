//! Stateful shell around the pure pipeline.
//!
//! A [`GraphView`] owns the node set of the latest fetch and everything that
//! is derived from it: the layout phase of the current generation, the
//! direction and impact overlays, and the optional zone backgrounds. Every
//! fetch is tagged with a [`RequestToken`]; only the most recently issued
//! token may replace the graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classify::{LayerMap, compute_layer_map};
use crate::config::Config;
use crate::error::Result;
use crate::filter::{Reachability, apply_direction_filter, filter_by_direction, sync_edge_visibility};
use crate::impact::apply_impact_style;
use crate::ir::{ImpactResult, Position, RawGraph, Size, TraversalDirection, VisualEdge, VisualNode};
use crate::layout::{Bounds, LayoutOptions, bounding_box, try_layout, zone_overlays};
use crate::snapshot::GraphSnapshot;
use crate::source::LineageSource;
use crate::transform::transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestToken(u64);

/// Issues monotonically increasing tokens; only the newest is current.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: u64,
}

impl RequestGate {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum ViewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The backend answered with zero nodes.
    Empty,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPhase {
    #[default]
    Unpositioned,
    /// Waiting for the rendering surface to report node sizes.
    Measuring,
    Positioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
}

/// Deferred viewport recentering, consumed by the host on its next frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitRequest {
    pub generation: u64,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayoutKey {
    generation: u64,
    data_nodes: usize,
}

#[derive(Debug, Clone, Default)]
struct DirectionOverlay {
    root: Option<String>,
    direction: TraversalDirection,
}

#[derive(Debug, Clone, Default)]
struct ImpactOverlay {
    result: Option<ImpactResult>,
    dim_unaffected: bool,
    hide_unaffected: bool,
}

#[derive(Debug, Default)]
pub struct GraphView {
    config: Config,
    gate: RequestGate,
    status: ViewStatus,
    generation: u64,
    phase: LayoutPhase,
    positioned: Option<LayoutKey>,
    nodes: Vec<VisualNode>,
    edges: Vec<VisualEdge>,
    zones: Vec<VisualNode>,
    show_zones: bool,
    last_positions: HashMap<String, Position>,
    pending_fit: Option<FitRequest>,
    direction: DirectionOverlay,
    impact: ImpactOverlay,
}

impl GraphView {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Data nodes of the current generation.
    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VisualEdge] {
        &self.edges
    }

    pub fn zones(&self) -> &[VisualNode] {
        &self.zones
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Overlay nodes first, then data nodes, as handed to the renderer.
    pub fn rendered_nodes(&self) -> Vec<VisualNode> {
        let mut out = Vec::with_capacity(self.zones.len() + self.nodes.len());
        out.extend(self.zones.iter().cloned());
        out.extend(self.nodes.iter().cloned());
        out
    }

    pub fn layer_map(&self) -> LayerMap {
        compute_layer_map(&self.nodes, &self.edges)
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::from_view(self)
    }

    pub fn pending_fit(&self) -> Option<&FitRequest> {
        self.pending_fit.as_ref()
    }

    pub fn take_fit_request(&mut self) -> Option<FitRequest> {
        self.pending_fit.take()
    }

    /// Starts a fetch. Any token issued earlier becomes stale.
    pub fn begin_fetch(&mut self) -> RequestToken {
        self.status = ViewStatus::Loading;
        self.gate.issue()
    }

    pub fn complete_fetch(&mut self, token: RequestToken, result: Result<RawGraph>) -> FetchOutcome {
        if !self.gate.is_current(token) {
            tracing::debug!(?token, "discarding stale lineage response");
            return FetchOutcome::Stale;
        }

        self.generation += 1;
        self.positioned = None;
        self.pending_fit = None;
        self.zones.clear();

        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%err, "lineage fetch failed");
                self.nodes.clear();
                self.edges.clear();
                self.phase = LayoutPhase::Unpositioned;
                self.status = ViewStatus::Error(err.to_string());
                return FetchOutcome::Applied;
            }
        };

        let graph = transform(&raw);
        self.nodes = graph.nodes;
        self.edges = graph.edges;
        if self.nodes.is_empty() {
            self.phase = LayoutPhase::Unpositioned;
            self.status = ViewStatus::Empty;
        } else {
            self.phase = LayoutPhase::Measuring;
            self.status = ViewStatus::Ready;
        }
        tracing::debug!(
            generation = self.generation,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "applied lineage response"
        );
        self.apply_overlays();
        FetchOutcome::Applied
    }

    /// Fetches synchronously through `source`.
    pub fn fetch_with<S: LineageSource + ?Sized>(
        &mut self,
        source: &S,
        root: Option<&str>,
        direction: TraversalDirection,
    ) -> FetchOutcome {
        let token = self.begin_fetch();
        let result = source.lineage_graph(root, direction);
        self.complete_fetch(token, result)
    }

    /// Fetches an impact analysis and applies it. A failure leaves the
    /// current overlay untouched.
    pub fn fetch_impact_with<S: LineageSource + ?Sized>(
        &mut self,
        source: &S,
        node_id: &str,
        dim_unaffected: bool,
        hide_unaffected: bool,
    ) -> Result<()> {
        let result = source.impact_analysis(node_id)?;
        self.set_impact(Some(result), dim_unaffected, hide_unaffected);
        Ok(())
    }

    /// Records sizes reported by the rendering surface. Returns `true` when
    /// this report completed the measurement and layout ran.
    pub fn report_measurements<'a, I>(&mut self, sizes: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, Size)>,
    {
        let sizes: HashMap<&str, Size> = sizes.into_iter().collect();
        for node in &mut self.nodes {
            if let Some(size) = sizes.get(node.id.as_str()) {
                node.measured_size = Some(*size);
            }
        }
        self.maybe_layout()
    }

    /// Measures every unmeasured node with the configured default size and
    /// lays out. Used by hosts that never paint.
    pub fn run_layout_with_defaults(&mut self) -> bool {
        let fallback = self.config.layout.default_node_size();
        for node in &mut self.nodes {
            node.measured_size.get_or_insert(fallback);
        }
        self.maybe_layout()
    }

    fn maybe_layout(&mut self) -> bool {
        if self.nodes.is_empty() || self.nodes.iter().any(|node| node.measured_size.is_none()) {
            return false;
        }
        let key = LayoutKey {
            generation: self.generation,
            data_nodes: self.nodes.len(),
        };
        if self.positioned == Some(key) {
            return false;
        }
        self.run_layout();
        self.positioned = Some(key);
        true
    }

    fn run_layout(&mut self) {
        let options = LayoutOptions::from(&self.config.layout);
        match try_layout(&self.nodes, &self.edges, &options) {
            Ok(positioned) => {
                self.nodes = positioned;
            }
            Err(err) => {
                tracing::warn!(%err, "layout failed; using last known positions");
                fallback_positions(&mut self.nodes, &self.last_positions, &options);
            }
        }
        self.last_positions = self
            .nodes
            .iter()
            .filter_map(|node| node.position.map(|position| (node.id.clone(), position)))
            .collect();
        self.phase = LayoutPhase::Positioned;
        self.pending_fit = bounding_box(&self.nodes, options.default_node_size).map(|bounds| {
            FitRequest {
                generation: self.generation,
                bounds,
            }
        });
        self.rebuild_zones();
    }

    fn rebuild_zones(&mut self) {
        if self.show_zones && self.phase == LayoutPhase::Positioned {
            let layout = &self.config.layout;
            self.zones = zone_overlays(
                &self.nodes,
                &self.edges,
                layout.zone_padding,
                layout.default_node_size(),
            );
        } else {
            self.zones.clear();
        }
    }

    /// Toggles the zone backgrounds. Never reruns layout.
    pub fn set_show_zones(&mut self, show: bool) {
        self.show_zones = show;
        self.rebuild_zones();
    }

    pub fn set_direction_filter(&mut self, root: Option<&str>, direction: TraversalDirection) {
        self.direction = DirectionOverlay {
            root: root.map(str::to_string),
            direction,
        };
        self.apply_overlays();
    }

    pub fn clear_direction_filter(&mut self) {
        self.set_direction_filter(None, TraversalDirection::Both);
    }

    pub fn set_impact(
        &mut self,
        result: Option<ImpactResult>,
        dim_unaffected: bool,
        hide_unaffected: bool,
    ) {
        self.impact = ImpactOverlay {
            result,
            dim_unaffected,
            hide_unaffected,
        };
        self.apply_overlays();
    }

    pub fn impact(&self) -> Option<&ImpactResult> {
        self.impact.result.as_ref()
    }

    fn apply_overlays(&mut self) {
        let reach = match &self.direction.root {
            Some(root) => {
                filter_by_direction(&self.edges, Some(root.as_str()), self.direction.direction)
            }
            None => Reachability::All,
        };
        apply_direction_filter(&mut self.nodes, &mut self.edges, &reach);
        apply_impact_style(
            &mut self.nodes,
            self.impact.result.as_ref(),
            self.impact.dim_unaffected,
            self.impact.hide_unaffected,
            &self.config.theme,
        );
        sync_edge_visibility(&self.nodes, &mut self.edges);
    }
}

/// One-shot inputs for [`prepare`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrepareOptions {
    pub root: Option<String>,
    pub direction: TraversalDirection,
    pub impact: Option<ImpactResult>,
    pub dim_unaffected: bool,
    pub hide_unaffected: bool,
    pub show_zones: bool,
}

/// Runs the whole pipeline once with default node sizes.
pub fn prepare(raw: RawGraph, config: Config, options: &PrepareOptions) -> GraphSnapshot {
    let mut view = GraphView::new(config);
    let token = view.begin_fetch();
    view.complete_fetch(token, Ok(raw));
    view.run_layout_with_defaults();
    view.set_show_zones(options.show_zones);
    view.set_direction_filter(options.root.as_deref(), options.direction);
    view.set_impact(
        options.impact.clone(),
        options.dim_unaffected,
        options.hide_unaffected,
    );
    view.snapshot()
}

/// Restores last known positions and lays the remaining nodes out on a grid
/// below them.
fn fallback_positions(
    nodes: &mut [VisualNode],
    last: &HashMap<String, Position>,
    options: &LayoutOptions,
) {
    let mut floor = options.margin;
    for node in nodes.iter_mut() {
        if let Some(position) = last.get(&node.id) {
            node.position = Some(*position);
            let height = node.size_or(options.default_node_size).height;
            floor = floor.max(position.y + height + options.rank_separation);
        }
    }

    let pending: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.position.is_none())
        .map(|(idx, _)| idx)
        .collect();
    if pending.is_empty() {
        return;
    }
    let columns = (pending.len() as f32).sqrt().ceil().max(1.0) as usize;
    let cell = options.default_node_size;
    for (slot, idx) in pending.into_iter().enumerate() {
        let col = slot % columns;
        let row = slot / columns;
        nodes[idx].position = Some(Position {
            x: options.margin + col as f32 * (cell.width + options.node_separation),
            y: floor + row as f32 * (cell.height + options.node_separation),
        });
    }
}
