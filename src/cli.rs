use crate::config::load_config;
use crate::ir::{RankDir, RawGraph, TraversalDirection};
use crate::snapshot::write_snapshot;
use crate::source::{FileSource, LineageSource, StaticSource};
use crate::view::{GraphView, ViewStatus};
use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lgraph",
    version,
    about = "Prepare a data-lineage graph for rendering: transform, classify, lay out and style"
)]
pub struct Args {
    /// Lineage graph JSON ({nodes, edges}) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the snapshot JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Root node for the direction filter and impact analysis
    #[arg(short = 'r', long = "root")]
    pub root: Option<String>,

    /// Traversal direction from the root
    #[arg(short = 'd', long = "direction", value_enum, default_value = "both")]
    pub direction: DirectionArg,

    /// Rank direction, overriding the config file
    #[arg(long = "rankdir", value_enum)]
    pub rankdir: Option<RankDirArg>,

    /// Impact analysis JSON rooted at --root
    #[arg(long = "impact", requires = "root")]
    pub impact: Option<PathBuf>,

    /// Dim nodes the impact analysis does not reach
    #[arg(long = "dim")]
    pub dim: bool,

    /// Hide nodes the impact analysis does not reach
    #[arg(long = "hide")]
    pub hide: bool,

    /// Emit zone background nodes
    #[arg(long = "zones")]
    pub zones: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    Both,
    Upstream,
    Downstream,
}

impl From<DirectionArg> for TraversalDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Both => TraversalDirection::Both,
            DirectionArg::Upstream => TraversalDirection::Upstream,
            DirectionArg::Downstream => TraversalDirection::Downstream,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirArg {
    #[value(name = "LR", alias = "lr")]
    Lr,
    #[value(name = "RL", alias = "rl")]
    Rl,
    #[value(name = "TB", alias = "tb")]
    Tb,
    #[value(name = "BT", alias = "bt")]
    Bt,
}

impl From<RankDirArg> for RankDir {
    fn from(arg: RankDirArg) -> Self {
        match arg {
            RankDirArg::Lr => RankDir::LeftRight,
            RankDirArg::Rl => RankDir::RightLeft,
            RankDirArg::Tb => RankDir::TopBottom,
            RankDirArg::Bt => RankDir::BottomTop,
        }
    }
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    execute(&args)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

pub fn execute(args: &Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(rankdir) = args.rankdir {
        config.layout.rankdir = rankdir.into();
    }

    let source = open_source(args)?;
    let direction = TraversalDirection::from(args.direction);
    let root = args.root.as_deref();

    let mut view = GraphView::new(config);
    view.set_direction_filter(root, direction);
    view.fetch_with(source.as_ref(), root, direction);
    if let ViewStatus::Error(message) = view.status() {
        bail!("{message}");
    }

    view.run_layout_with_defaults();
    view.set_show_zones(args.zones);
    if let (Some(root), Some(_)) = (root, args.impact.as_ref()) {
        view.fetch_impact_with(source.as_ref(), root, args.dim, args.hide)?;
    }

    tracing::info!(
        nodes = view.nodes().len(),
        edges = view.edges().len(),
        status = ?view.status(),
        "lineage graph prepared"
    );
    write_snapshot(&view.snapshot(), args.output.as_deref())
}

fn open_source(args: &Args) -> Result<Box<dyn LineageSource>> {
    match args.input.as_deref() {
        Some(path) if path != Path::new("-") => {
            let mut source = FileSource::new(path);
            if let Some(impact) = &args.impact {
                source = source.with_impact(impact);
            }
            Ok(Box::new(source))
        }
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            let mut source = StaticSource::new(RawGraph::from_json(&buf)?);
            if let Some(impact) = &args.impact {
                let text = std::fs::read_to_string(impact)?;
                source.impact = Some(serde_json::from_str(&text)?);
            }
            Ok(Box::new(source))
        }
    }
}
