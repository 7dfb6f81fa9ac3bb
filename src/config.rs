use crate::ir::{RankDir, Size};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub rankdir: RankDir,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub margin: f32,
    pub default_node_width: f32,
    pub default_node_height: f32,
    pub order_passes: usize,
    pub zone_padding: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rankdir: RankDir::LeftRight,
            node_spacing: 40.0,
            rank_spacing: 120.0,
            margin: 8.0,
            default_node_width: 240.0,
            default_node_height: 64.0,
            order_passes: 4,
            zone_padding: 24.0,
        }
    }
}

impl LayoutConfig {
    pub fn default_node_size(&self) -> Size {
        Size {
            width: self.default_node_width,
            height: self.default_node_height,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    root_border_color: Option<String>,
    critical_color: Option<String>,
    high_color: Option<String>,
    medium_color: Option<String>,
    low_color: Option<String>,
    dimmed_opacity: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    rankdir: Option<String>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    margin: Option<f32>,
    default_node_width: Option<f32>,
    default_node_height: Option<f32>,
    order_passes: Option<usize>,
    zone_padding: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses JSON5 config text; keys left out keep their defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme {theme_name:?}"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.root_border_color {
            config.theme.root_border_color = v;
        }
        if let Some(v) = vars.critical_color {
            config.theme.critical_color = v;
        }
        if let Some(v) = vars.high_color {
            config.theme.high_color = v;
        }
        if let Some(v) = vars.medium_color {
            config.theme.medium_color = v;
        }
        if let Some(v) = vars.low_color {
            config.theme.low_color = v;
        }
        if let Some(v) = vars.dimmed_opacity {
            config.theme.dimmed_opacity = v.clamp(0.0, 1.0);
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(token) = layout.rankdir.as_deref() {
            config.layout.rankdir = RankDir::from_token(token)
                .ok_or_else(|| anyhow::anyhow!("unknown rankdir {token:?}"))?;
        }
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v.max(0.0);
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v.max(0.0);
        }
        if let Some(v) = layout.margin {
            config.layout.margin = v.max(0.0);
        }
        if let Some(v) = layout.default_node_width {
            config.layout.default_node_width = v.max(1.0);
        }
        if let Some(v) = layout.default_node_height {
            config.layout.default_node_height = v.max(1.0);
        }
        if let Some(v) = layout.order_passes {
            config.layout.order_passes = v;
        }
        if let Some(v) = layout.zone_padding {
            config.layout.zone_padding = v.max(0.0);
        }
    }

    Ok(config)
}
