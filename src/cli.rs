use crate::config::{Config, LayoutStyle, load_config};
use crate::input::parse_records;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::ratio::ColorRatio;
use crate::render::{render_svg, write_output_svg};
use crate::tree::{GroupBy, build_tree};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "cxtree",
    version,
    about = "Render cyclomatic complexity as a tree (JSON records or gocyclo output)"
)]
pub struct Args {
    /// Input file (JSON array or analyzer lines) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Layout style
    #[arg(short = 's', long = "style", value_enum)]
    pub style: Option<StyleArg>,

    /// First complexity classified as medium
    #[arg(long = "medium")]
    pub medium: Option<u32>,

    /// First complexity classified as high
    #[arg(long = "high")]
    pub high: Option<u32>,

    /// First complexity classified as critical
    #[arg(long = "critical", conflicts_with = "no_critical")]
    pub critical: Option<u32>,

    /// Classify with three levels only
    #[arg(long = "noCritical")]
    pub no_critical: bool,

    /// Layout seed
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Group functions by file or by package directory
    #[arg(short = 'g', long = "groupBy", value_enum)]
    pub group_by: Option<GroupByArg>,

    /// Title drawn at the top of the image
    #[arg(short = 't', long = "title")]
    pub title: Option<String>,

    /// Write the computed geometry as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Log the tree outline and color ratio
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StyleArg {
    #[value(alias = "natural")]
    Organic,
    #[value(alias = "hierarchical")]
    Grid,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum GroupByArg {
    File,
    Package,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;
    info!(thresholds = %config.thresholds.describe(), "classifier ready");

    let input = read_input(args.input.as_deref())?;
    let records = parse_records(&input)?;
    let tree = build_tree(&records, &config.thresholds, config.group_by);
    let ratio = ColorRatio::from_tree(&tree);
    if args.verbose {
        log_summary(&tree, &ratio);
    }

    let layout = compute_layout(&tree, &ratio, &config.layout)?;
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout, &tree, &ratio)?;
    }
    let svg = render_svg(&layout, &config.theme, &config.render);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => write_png(&svg, args.output.as_deref(), &config)?,
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // SVG goes to stdout, so logs stay on stderr.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(width) = args.width {
        config.layout.width = width;
    }
    if let Some(height) = args.height {
        config.layout.height = height;
    }
    if let Some(style) = args.style {
        config.layout.style = match style {
            StyleArg::Organic => LayoutStyle::Organic,
            StyleArg::Grid => LayoutStyle::Grid,
        };
    }
    if let Some(seed) = args.seed {
        config.layout.seed = seed;
    }
    if let Some(group_by) = args.group_by {
        config.group_by = match group_by {
            GroupByArg::File => GroupBy::File,
            GroupByArg::Package => GroupBy::Package,
        };
    }
    if let Some(medium) = args.medium {
        config.thresholds.medium = medium;
    }
    if let Some(high) = args.high {
        config.thresholds.high = high;
    }
    if args.no_critical {
        config.thresholds.critical = None;
    } else if let Some(critical) = args.critical {
        config.thresholds.critical = Some(critical);
    }
    if let Some(title) = &args.title {
        config.render.title = Some(title.clone());
    }
}

fn log_summary(tree: &crate::tree::ComplexityTree, ratio: &ColorRatio) {
    let [low, medium, high, critical] = tree.severity_counts();
    info!(
        groups = tree.group_count(),
        functions = tree.function_count(),
        low,
        medium,
        high,
        critical,
        "built complexity tree"
    );
    for line in tree.outline().lines().chain(tree.report().lines()) {
        info!("{line}");
    }
    let [green, yellow, red, brown] = ratio.percentages();
    info!(
        "color ratio: green {green:.1}%, yellow {yellow:.1}%, red {red:.1}%, brown {brown:.1}%"
    );
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    output
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let output = ensure_output(output, "png")?;
    crate::render::write_output_png(svg, &output, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, output: Option<&Path>, _config: &Config) -> Result<()> {
    ensure_output(output, "png")?;
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
