use crate::classify::Thresholds;
use crate::error::ConfigError;
use crate::theme::Theme;
use crate::tree::GroupBy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MIN_CANVAS_WIDTH: f32 = 200.0;
pub const MIN_CANVAS_HEIGHT: f32 = 200.0;
pub const DEFAULT_SEED: u64 = 0x7472_6565;
pub const MAX_CANOPY_LEAVES: usize = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    /// Trunk with alternating branches and leaf clusters.
    #[default]
    #[serde(alias = "natural")]
    Organic,
    /// Root, groups and functions on three horizontal bands.
    #[serde(alias = "hierarchical")]
    Grid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganicConfig {
    pub ground_height: f32,
    pub trunk_height: f32,
    pub trunk_width: f32,
    pub trunk_top_ratio: f32,
    pub base_branch_length: f32,
    pub branch_length_per_leaf: f32,
    pub branch_length_variation: f32,
    pub max_branch_length: f32,
    pub branch_angle_step: f32,
    pub left_angle_range: (f32, f32),
    pub right_angle_range: (f32, f32),
    pub max_branch_thickness: f32,
    pub min_branch_thickness: f32,
    pub branch_thickness_step: f32,
    pub small_cluster_radius: f32,
    pub ring_base_radius: f32,
    pub ring_step: f32,
    pub leaf_spacing: f32,
    /// Fraction of a ring slot a leaf may drift by, in either direction.
    pub ring_jitter: f32,
    pub leaf_extent: f32,
    pub canopy_leaves: usize,
    pub canopy_radius: f32,
    pub canopy_layers: usize,
}

impl Default for OrganicConfig {
    fn default() -> Self {
        Self {
            ground_height: 30.0,
            trunk_height: 150.0,
            trunk_width: 40.0,
            trunk_top_ratio: 0.6,
            base_branch_length: 60.0,
            branch_length_per_leaf: 8.0,
            branch_length_variation: 10.0,
            max_branch_length: 120.0,
            branch_angle_step: 6.0,
            left_angle_range: (110.0, 165.0),
            right_angle_range: (15.0, 70.0),
            max_branch_thickness: 8.0,
            min_branch_thickness: 3.0,
            branch_thickness_step: 0.5,
            small_cluster_radius: 8.0,
            ring_base_radius: 10.0,
            ring_step: 10.0,
            leaf_spacing: 14.0,
            ring_jitter: 0.35,
            leaf_extent: 12.0,
            canopy_leaves: 160,
            canopy_radius: 120.0,
            canopy_layers: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub root_band: f32,
    pub group_band: f32,
    pub function_band: f32,
    pub side_margin: f32,
    pub max_function_spacing: f32,
    pub min_function_spacing: f32,
    pub row_step: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            root_band: 0.15,
            group_band: 0.40,
            function_band: 0.65,
            side_margin: 50.0,
            max_function_spacing: 80.0,
            min_function_spacing: 14.0,
            row_step: 28.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub style: LayoutStyle,
    pub width: f32,
    pub height: f32,
    /// Inset kept free of functional geometry on every side.
    pub margin: f32,
    pub seed: u64,
    pub organic: OrganicConfig,
    pub grid: GridConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            style: LayoutStyle::Organic,
            width: 800.0,
            height: 600.0,
            margin: 8.0,
            seed: DEFAULT_SEED,
            organic: OrganicConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let drawable = |value: f32| value.is_finite() && value > 0.0;
        if !drawable(self.width) || !drawable(self.height) {
            return Err(ConfigError::NonPositiveCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if self.width < MIN_CANVAS_WIDTH || self.height < MIN_CANVAS_HEIGHT {
            return Err(ConfigError::CanvasTooSmall {
                width: self.width,
                height: self.height,
                min_width: MIN_CANVAS_WIDTH,
                min_height: MIN_CANVAS_HEIGHT,
            });
        }
        non_negative("margin", self.margin)?;
        self.organic.validate()?;
        self.grid.validate()
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLayoutValue { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    in_range(field, value, 0.0, f32::MAX)
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    in_range(field, value, f32::MIN_POSITIVE, f32::MAX)
}

impl OrganicConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("trunkHeight", self.trunk_height)?;
        positive("trunkWidth", self.trunk_width)?;
        in_range("trunkTopRatio", self.trunk_top_ratio, 0.1, 1.0)?;
        positive("maxBranchLength", self.max_branch_length)?;
        positive("canopyRadius", self.canopy_radius)?;
        positive("leafSpacing", self.leaf_spacing)?;
        positive("leafExtent", self.leaf_extent)?;
        positive("ringStep", self.ring_step)?;
        in_range("ringJitter", self.ring_jitter, 0.0, 0.5)?;
        for (field, value) in [
            ("groundHeight", self.ground_height),
            ("baseBranchLength", self.base_branch_length),
            ("branchLengthPerLeaf", self.branch_length_per_leaf),
            ("branchLengthVariation", self.branch_length_variation),
            ("branchAngleStep", self.branch_angle_step),
            ("maxBranchThickness", self.max_branch_thickness),
            ("minBranchThickness", self.min_branch_thickness),
            ("branchThicknessStep", self.branch_thickness_step),
            ("smallClusterRadius", self.small_cluster_radius),
            ("ringBaseRadius", self.ring_base_radius),
        ] {
            non_negative(field, value)?;
        }
        for (field, (low, high)) in [
            ("leftAngleRange", self.left_angle_range),
            ("rightAngleRange", self.right_angle_range),
        ] {
            in_range(field, low, 0.0, 180.0)?;
            in_range(field, high, low, 180.0)?;
        }
        if self.canopy_leaves > MAX_CANOPY_LEAVES {
            return Err(ConfigError::TooManyCanopyLeaves {
                count: self.canopy_leaves,
                max: MAX_CANOPY_LEAVES,
            });
        }
        Ok(())
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("rootBand", self.root_band),
            ("groupBand", self.group_band),
            ("functionBand", self.function_band),
        ] {
            in_range(field, value, 0.0, 1.0)?;
        }
        non_negative("sideMargin", self.side_margin)?;
        positive("maxFunctionSpacing", self.max_function_spacing)?;
        positive("minFunctionSpacing", self.min_function_spacing)?;
        positive("rowStep", self.row_step)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub title: Option<String>,
    pub show_grid_labels: bool,
    pub grass_blades: usize,
    pub grass_clusters: usize,
    pub fallen_leaves: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_grid_labels: true,
            grass_blades: 200,
            grass_clusters: 50,
            fallen_leaves: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: Thresholds,
    pub group_by: GroupBy,
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            group_by: GroupBy::File,
            theme: Theme::natural(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Config {
    /// Reject thresholds and canvas settings before any analysis runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.layout.validate()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    thresholds: Option<ThresholdsFile>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThresholdsFile {
    medium: Option<u32>,
    high: Option<u32>,
    critical: Option<u32>,
    /// `false` switches to the three-level classifier.
    use_critical: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    style: Option<LayoutStyle>,
    width: Option<f32>,
    height: Option<f32>,
    margin: Option<f32>,
    seed: Option<u64>,
    group_by: Option<GroupBy>,
    trunk_height: Option<f32>,
    trunk_width: Option<f32>,
    max_branch_length: Option<f32>,
    canopy_leaves: Option<usize>,
    canopy_radius: Option<f32>,
    ring_jitter: Option<f32>,
    max_function_spacing: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    title: Option<String>,
    show_grid_labels: Option<bool>,
    grass_blades: Option<usize>,
    grass_clusters: Option<usize>,
    fallen_leaves: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
    low_color: Option<String>,
    medium_color: Option<String>,
    high_color: Option<String>,
    critical_color: Option<String>,
    trunk_color: Option<String>,
    trunk_border: Option<String>,
    branch_color: Option<String>,
    stroke_darken: Option<f32>,
}

/// Load a JSON (or JSON5) config file on top of the defaults. Without a path
/// the defaults are returned. The result is not validated; call
/// [`Config::validate`] once every override is applied.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {json_err}"))?,
    };
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme `{theme_name}`"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.low_color {
            config.theme.low_color = v;
        }
        if let Some(v) = vars.medium_color {
            config.theme.medium_color = v;
        }
        if let Some(v) = vars.high_color {
            config.theme.high_color = v;
        }
        if let Some(v) = vars.critical_color {
            config.theme.critical_color = v;
        }
        if let Some(v) = vars.trunk_color {
            config.theme.trunk_color = v;
        }
        if let Some(v) = vars.trunk_border {
            config.theme.trunk_border = v;
        }
        if let Some(v) = vars.branch_color {
            config.theme.branch_color = v;
        }
        if let Some(v) = vars.stroke_darken {
            config.theme.stroke_darken = v;
        }
    }

    if let Some(thresholds) = parsed.thresholds {
        if let Some(v) = thresholds.medium {
            config.thresholds.medium = v;
        }
        if let Some(v) = thresholds.high {
            config.thresholds.high = v;
        }
        if let Some(v) = thresholds.critical {
            config.thresholds.critical = Some(v);
        }
        if thresholds.use_critical == Some(false) {
            config.thresholds.critical = None;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.style {
            config.layout.style = v;
        }
        if let Some(v) = layout.width {
            config.layout.width = v;
        }
        if let Some(v) = layout.height {
            config.layout.height = v;
        }
        if let Some(v) = layout.margin {
            config.layout.margin = v;
        }
        if let Some(v) = layout.seed {
            config.layout.seed = v;
        }
        if let Some(v) = layout.group_by {
            config.group_by = v;
        }
        if let Some(v) = layout.trunk_height {
            config.layout.organic.trunk_height = v;
        }
        if let Some(v) = layout.trunk_width {
            config.layout.organic.trunk_width = v;
        }
        if let Some(v) = layout.max_branch_length {
            config.layout.organic.max_branch_length = v;
        }
        if let Some(v) = layout.canopy_leaves {
            config.layout.organic.canopy_leaves = v;
        }
        if let Some(v) = layout.canopy_radius {
            config.layout.organic.canopy_radius = v;
        }
        if let Some(v) = layout.ring_jitter {
            config.layout.organic.ring_jitter = v.clamp(0.0, 0.5);
        }
        if let Some(v) = layout.max_function_spacing {
            config.layout.grid.max_function_spacing = v;
        }
    }

    if let Some(render) = parsed.render {
        if render.title.is_some() {
            config.render.title = render.title;
        }
        if let Some(v) = render.show_grid_labels {
            config.render.show_grid_labels = v;
        }
        if let Some(v) = render.grass_blades {
            config.render.grass_blades = v;
        }
        if let Some(v) = render.grass_clusters {
            config.render.grass_clusters = v;
        }
        if let Some(v) = render.fallen_leaves {
            config.render.fallen_leaves = v;
        }
    }

    Ok(config)
}
