use lineage_graph::config::Config;
use lineage_graph::ir::{RankDir, RawGraph};
use lineage_graph::theme::Theme;
use lineage_graph::{PrepareOptions, prepare};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineageGraphOptions {
    theme: Option<String>,
    rankdir: Option<String>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    #[serde(flatten)]
    prepare: PrepareOptions,
}

fn build_config(options: &LineageGraphOptions) -> Result<Config, String> {
    let mut config = Config::default();
    if let Some(name) = options.theme.as_deref() {
        config.theme = Theme::by_name(name).ok_or_else(|| format!("unknown theme {name:?}"))?;
    }
    if let Some(token) = options.rankdir.as_deref() {
        config.layout.rankdir =
            RankDir::from_token(token).ok_or_else(|| format!("unknown rankdir {token:?}"))?;
    }
    if let Some(width) = options.node_width {
        config.layout.default_node_width = width.max(1.0);
    }
    if let Some(height) = options.node_height {
        config.layout.default_node_height = height.max(1.0);
    }
    Ok(config)
}

fn prepare_json(raw_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let options = match options_json {
        Some(text) => serde_json::from_str::<LineageGraphOptions>(text).map_err(|e| e.to_string())?,
        None => LineageGraphOptions::default(),
    };
    let config = build_config(&options)?;
    let raw = RawGraph::from_json(raw_json).map_err(|e| e.to_string())?;
    let snapshot = prepare(raw, config, &options.prepare);
    serde_json::to_string(&snapshot).map_err(|e| e.to_string())
}

/// Transforms, lays out and styles a backend lineage response, returning the
/// snapshot JSON for the renderer.
#[wasm_bindgen]
pub fn prepare_lineage_graph(raw_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    prepare_json(raw_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}
