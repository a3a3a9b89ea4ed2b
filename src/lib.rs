pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod ratio;
pub mod render;
pub mod theme;
pub mod tree;

pub use classify::{ColorToken, Severity, Thresholds};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, LayoutStyle, RenderConfig, load_config};
pub use error::{ConfigError, Error, Result};
pub use input::parse_records;
pub use ir::FunctionRecord;
pub use layout::{TreeLayout, compute_layout};
pub use ratio::ColorRatio;
pub use render::render_svg;
pub use theme::Theme;
pub use tree::{ComplexityTree, GroupBy, build_tree};
