use crate::ir::RiskLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub root_border_color: String,
    pub critical_color: String,
    pub high_color: String,
    pub medium_color: String,
    pub low_color: String,
    pub dimmed_opacity: f32,
}

impl Theme {
    pub fn standard() -> Self {
        Self {
            root_border_color: "#2563EB".to_string(),
            critical_color: "#DC2626".to_string(),
            high_color: "#EA580C".to_string(),
            medium_color: "#CA8A04".to_string(),
            low_color: "#16A34A".to_string(),
            dimmed_opacity: 0.25,
        }
    }

    pub fn high_contrast() -> Self {
        Self {
            root_border_color: "#000000".to_string(),
            critical_color: "#B00020".to_string(),
            high_color: "#D14900".to_string(),
            medium_color: "#8A6D00".to_string(),
            low_color: "#006B3C".to_string(),
            dimmed_opacity: 0.15,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "standard" | "default" => Some(Self::standard()),
            "high-contrast" | "highContrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    pub fn risk_color(&self, level: RiskLevel) -> &str {
        match level {
            RiskLevel::Critical => &self.critical_color,
            RiskLevel::High => &self.high_color,
            RiskLevel::Medium => &self.medium_color,
            RiskLevel::Low => &self.low_color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::standard()
    }
}
