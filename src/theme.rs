use serde::{Deserialize, Serialize};

use crate::classify::{ColorToken, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub muted_text_color: String,
    pub background: String,
    pub low_color: String,
    pub medium_color: String,
    pub high_color: String,
    pub critical_color: String,
    pub trunk_color: String,
    pub trunk_border: String,
    pub trunk_gradient: [String; 3],
    pub bark_highlight: String,
    pub branch_color: String,
    pub connection_color: String,
    pub ground_gradient: [String; 3],
    pub grass_colors: Vec<String>,
    pub canopy_green: Vec<String>,
    pub canopy_yellow: Vec<String>,
    pub canopy_red: Vec<String>,
    pub canopy_brown: Vec<String>,
    /// Factor applied by [`darken`] to derive leaf strokes from fills.
    pub stroke_darken: f32,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Theme {
    /// Saturated leaf colors on a sky background.
    pub fn natural() -> Self {
        Self {
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            font_size: 10.0,
            text_color: "#333333".to_string(),
            muted_text_color: "#666666".to_string(),
            background: "#e1f5fe".to_string(),
            low_color: "#4caf50".to_string(),
            medium_color: "#ffc107".to_string(),
            high_color: "#f44336".to_string(),
            critical_color: "#8d6e63".to_string(),
            trunk_color: "#8B4513".to_string(),
            trunk_border: "#654321".to_string(),
            trunk_gradient: [
                "#6d4c41".to_string(),
                "#8d6e63".to_string(),
                "#a1887f".to_string(),
            ],
            bark_highlight: "#A0522D".to_string(),
            branch_color: "#8B4513".to_string(),
            connection_color: "#666666".to_string(),
            ground_gradient: [
                "#66bb6a".to_string(),
                "#4caf50".to_string(),
                "#2e7d32".to_string(),
            ],
            grass_colors: strings(&["#2e7d32", "#388e3c", "#43a047", "#66bb6a"]),
            canopy_green: strings(&["#4caf50", "#66bb6a", "#81c784"]),
            canopy_yellow: strings(&["#ffeb3b", "#ffc107", "#ff9800"]),
            canopy_red: strings(&["#f44336", "#e53935", "#d32f2f"]),
            canopy_brown: strings(&["#8d6e63", "#6d4c41", "#5d4037"]),
            stroke_darken: 0.35,
        }
    }

    /// Light fills on a neutral background, suited to the grid style.
    pub fn pastel() -> Self {
        Self {
            background: "#f8f9fa".to_string(),
            low_color: "#d4edda".to_string(),
            medium_color: "#fff3cd".to_string(),
            high_color: "#f8d7da".to_string(),
            critical_color: "#e0cfc8".to_string(),
            stroke_darken: 0.55,
            ..Self::natural()
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "natural" | "default" => Some(Self::natural()),
            "pastel" => Some(Self::pastel()),
            _ => None,
        }
    }

    pub fn fill_for(&self, token: ColorToken) -> &str {
        match token {
            ColorToken::Green => &self.low_color,
            ColorToken::Yellow => &self.medium_color,
            ColorToken::Red => &self.high_color,
            ColorToken::Brown => &self.critical_color,
        }
    }

    pub fn severity_fill(&self, severity: Severity) -> &str {
        self.fill_for(severity.color())
    }

    pub fn severity_stroke(&self, severity: Severity) -> String {
        darken(self.severity_fill(severity), self.stroke_darken)
    }

    pub fn canopy_palette(&self, severity: Severity) -> &[String] {
        match severity {
            Severity::Low => &self.canopy_green,
            Severity::Medium => &self.canopy_yellow,
            Severity::High => &self.canopy_red,
            Severity::Critical => &self.canopy_brown,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::natural()
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
    let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
    let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Scale each channel of a `#rgb`/`#rrggbb` color toward black by `amount`
/// (0 keeps the color, 1 yields black). Unparseable colors pass through.
pub fn darken(color: &str, amount: f32) -> String {
    let Some((r, g, b)) = parse_hex(color) else {
        return color.to_string();
    };
    let keep = (1.0 - amount).clamp(0.0, 1.0);
    let scale = |channel: u8| (f32::from(channel) * keep).round() as u8;
    format!("#{:02x}{:02x}{:02x}", scale(r), scale(g), scale(b))
}
