use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

pub type Props = Map<String, Value>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub entity_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default)]
    pub canonical_key: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub props: Props,
}

impl Entity {
    pub fn new(id: &str, entity_type: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            entity_type: entity_type.to_string(),
            label: label.to_string(),
            canonical_key: None,
            props: Props::new(),
        }
    }

    pub fn with_prop(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn category(&self) -> NodeCategory {
        NodeCategory::from_entity_type(&self.entity_type)
    }

    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Backend graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub relationship_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub props: Props,
}

impl Relationship {
    pub fn new(source: &str, target: &str, relationship_type: &str) -> Self {
        Self {
            id: format!("{source}:{relationship_type}:{target}"),
            source: source.to_string(),
            target: target.to_string(),
            relationship_type: relationship_type.to_string(),
            props: Props::new(),
        }
    }
}

/// Raw lineage graph as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<Entity>,
    #[serde(default)]
    pub edges: Vec<Relationship>,
}

impl RawGraph {
    /// Parses a backend response. Entries that fail to deserialize are skipped
    /// individually; only a document that is not JSON at all is an error.
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let mut graph = Self::default();
        let Value::Object(mut root) = value else {
            tracing::warn!("lineage response is not an object; treating as empty");
            return graph;
        };
        if let Some(Value::Array(items)) = root.remove("nodes") {
            for item in items {
                match serde_json::from_value::<Entity>(item) {
                    Ok(entity) => graph.nodes.push(entity),
                    Err(err) => tracing::warn!(%err, "skipping malformed entity"),
                }
            }
        }
        if let Some(Value::Array(items)) = root.remove("edges") {
            for item in items {
                match serde_json::from_value::<Relationship>(item) {
                    Ok(rel) => graph.edges.push(rel),
                    Err(err) => tracing::warn!(%err, "skipping malformed relationship"),
                }
            }
        }
        graph
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Rendering category resolved from the dotted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Table,
    Column,
    Model,
    Source,
    Card,
    Dashboard,
    Metric,
    /// Decorative zone background; never produced from an entity type.
    Zone,
}

static CATEGORY_BY_TYPE: Lazy<HashMap<&'static str, NodeCategory>> = Lazy::new(|| {
    HashMap::from([
        ("warehouse.table", NodeCategory::Table),
        ("warehouse.view", NodeCategory::Table),
        ("warehouse.column", NodeCategory::Column),
        ("dbt.model", NodeCategory::Model),
        ("dbt.snapshot", NodeCategory::Model),
        ("dbt.source", NodeCategory::Source),
        ("dbt.seed", NodeCategory::Source),
        ("metabase.card", NodeCategory::Card),
        ("metabase.question", NodeCategory::Card),
        ("metabase.dashboard", NodeCategory::Dashboard),
        ("metric.kpi", NodeCategory::Metric),
        ("metric.definition", NodeCategory::Metric),
    ])
});

impl NodeCategory {
    /// Unknown types fall back to the table-like category.
    pub fn from_entity_type(entity_type: &str) -> Self {
        CATEGORY_BY_TYPE
            .get(entity_type.trim())
            .copied()
            .unwrap_or(NodeCategory::Table)
    }

    pub fn is_column(self) -> bool {
        self == NodeCategory::Column
    }

    pub fn is_table_like(self) -> bool {
        self == NodeCategory::Table
    }

    pub fn is_model(self) -> bool {
        self == NodeCategory::Model
    }

    pub fn is_consumption(self) -> bool {
        matches!(
            self,
            NodeCategory::Card | NodeCategory::Dashboard | NodeCategory::Metric
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: Option<String>,
    pub nullable: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Architecture zone, ordered left to right.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureLayer {
    Sources,
    Staging,
    Marts,
    Consumption,
}

impl ArchitectureLayer {
    pub const ALL: [ArchitectureLayer; 4] = [
        ArchitectureLayer::Sources,
        ArchitectureLayer::Staging,
        ArchitectureLayer::Marts,
        ArchitectureLayer::Consumption,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArchitectureLayer::Sources => "sources",
            ArchitectureLayer::Staging => "staging",
            ArchitectureLayer::Marts => "marts",
            ArchitectureLayer::Consumption => "consumption",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Data,
    /// Decorative background spanning one architecture zone.
    Zone(ArchitectureLayer),
}

/// Per-node visibility. The direction filter and impact overlay each own one
/// flag; a node is hidden when either of them hides it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    HiddenByDirection,
    HiddenByImpact,
    HiddenByBoth,
}

impl Visibility {
    fn from_flags(by_direction: bool, by_impact: bool) -> Self {
        match (by_direction, by_impact) {
            (false, false) => Visibility::Visible,
            (true, false) => Visibility::HiddenByDirection,
            (false, true) => Visibility::HiddenByImpact,
            (true, true) => Visibility::HiddenByBoth,
        }
    }

    pub fn is_hidden(self) -> bool {
        self != Visibility::Visible
    }

    pub fn hidden_by_direction(self) -> bool {
        matches!(self, Visibility::HiddenByDirection | Visibility::HiddenByBoth)
    }

    pub fn hidden_by_impact(self) -> bool {
        matches!(self, Visibility::HiddenByImpact | Visibility::HiddenByBoth)
    }

    pub fn with_direction(self, hidden: bool) -> Self {
        Self::from_flags(hidden, self.hidden_by_impact())
    }

    pub fn with_impact(self, hidden: bool) -> Self {
        Self::from_flags(self.hidden_by_direction(), hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "risk")]
pub enum ImpactRole {
    Root,
    Impacted(RiskLevel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub opacity: f32,
    pub border_color: Option<String>,
    pub impact: Option<ImpactRole>,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            border_color: None,
            impact: None,
        }
    }
}

/// Render-ready node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    pub id: String,
    pub kind: NodeKind,
    pub category: NodeCategory,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub label: String,
    pub canonical_key: Option<String>,
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedded_columns: Option<Vec<ColumnInfo>>,
    pub position: Option<Position>,
    pub measured_size: Option<Size>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub style: NodeStyle,
}

impl VisualNode {
    pub fn data(id: &str, category: NodeCategory, label: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: NodeKind::Data,
            category,
            entity_type: String::new(),
            label: label.to_string(),
            canonical_key: None,
            props: Props::new(),
            embedded_columns: None,
            position: None,
            measured_size: None,
            visibility: Visibility::Visible,
            style: NodeStyle::default(),
        }
    }

    pub fn is_data(&self) -> bool {
        self.kind == NodeKind::Data
    }

    pub fn schema(&self) -> Option<&str> {
        self.props.get("schema").and_then(Value::as_str)
    }

    pub fn size_or(&self, fallback: Size) -> Size {
        self.measured_size.unwrap_or(fallback)
    }
}

/// Render-ready edge, always pointing producer to consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub edge_type: String,
    pub props: Props,
    #[serde(default)]
    pub hidden: bool,
}

impl VisualEdge {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            id: format!("{source}->{target}"),
            source: source.to_string(),
            target: target.to_string(),
            edge_type: String::new(),
            props: Props::new(),
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactedNode {
    pub node_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub depth: u32,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub root_node_id: String,
    #[serde(default)]
    pub root_label: String,
    #[serde(default)]
    pub total_affected: usize,
    #[serde(default)]
    pub by_risk: BTreeMap<RiskLevel, usize>,
    #[serde(default)]
    pub max_depth: u32,
    #[serde(default)]
    pub impacted_nodes: Vec<ImpactedNode>,
}

impl ImpactResult {
    pub fn risk_of(&self, node_id: &str) -> Option<RiskLevel> {
        self.impacted_nodes
            .iter()
            .find(|node| node.node_id == node_id)
            .map(|node| node.risk_level)
    }
}

/// Primary layout axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
    #[serde(rename = "TB")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
}

impl RankDir {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            "TB" | "TD" => Some(Self::TopBottom),
            "BT" => Some(Self::BottomTop),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LeftRight | RankDir::RightLeft)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, RankDir::RightLeft | RankDir::BottomTop)
    }
}

/// Traversal direction for lineage fetches and the direction filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDirection {
    #[default]
    Both,
    Upstream,
    Downstream,
}

impl TraversalDirection {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "both" => Some(Self::Both),
            "upstream" | "up" => Some(Self::Upstream),
            "downstream" | "down" => Some(Self::Downstream),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
        }
    }
}
