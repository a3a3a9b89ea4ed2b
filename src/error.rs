use thiserror::Error;

/// Configuration rejected before any analysis runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "thresholds must be strictly ascending: medium={medium}, high={high}, critical={critical:?}"
    )]
    NonAscendingThresholds {
        medium: u32,
        high: u32,
        critical: Option<u32>,
    },
    #[error("medium threshold must be at least 1")]
    ZeroThreshold,
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    NonPositiveCanvas { width: f32, height: f32 },
    #[error("canvas {width}x{height} is smaller than the minimum {min_width}x{min_height}")]
    CanvasTooSmall {
        width: f32,
        height: f32,
        min_width: f32,
        min_height: f32,
    },
    #[error("layout setting `{field}` is out of range: {value}")]
    InvalidLayoutValue { field: &'static str, value: f32 },
    #[error("canopy of {count} leaves exceeds the maximum of {max}")]
    TooManyCanopyLeaves { count: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("line {line}: {reason}")]
    Input { line: usize, reason: String },
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
