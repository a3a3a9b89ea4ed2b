use crate::classify::Severity;
use crate::config::{LayoutStyle, RenderConfig};
use crate::layout::{
    BranchGeometry, CanopyLeaf, DECOR_STREAM, LeafPlacement, TreeLayout, TrunkGeometry,
    seeded_stream,
};
use crate::theme::Theme;
use anyhow::Result;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::path::Path;

const GROUP_BOX_HEIGHT: f32 = 20.0;
const ELLIPSIS: &str = "...";
const LABEL_MAX_CHARS: usize = 15;

pub fn render_svg(layout: &TreeLayout, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let width = layout.width;
    let height = layout.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    push_defs(&mut svg, theme);

    // Decoration draws from its own stream; geometry is already fixed.
    let mut rng = seeded_stream(layout.seed, DECOR_STREAM);
    match layout.style {
        LayoutStyle::Organic => render_organic(&mut svg, layout, theme, config, &mut rng),
        LayoutStyle::Grid => render_grid(&mut svg, layout, theme, config),
    }

    if let Some(title) = config.title.as_deref().filter(|t| !t.trim().is_empty()) {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"30\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            width / 2.0,
            theme.font_family,
            theme.font_size * 1.5,
            theme.text_color,
            escape_xml(title)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn push_defs(svg: &mut String, theme: &Theme) {
    let [dark, mid, light] = &theme.trunk_gradient;
    let [ground_light, ground_mid, ground_dark] = &theme.ground_gradient;
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<linearGradient id=\"trunkGrad\" x1=\"0%\" y1=\"0%\" x2=\"100%\" y2=\"0%\"><stop offset=\"0%\" stop-color=\"{dark}\"/><stop offset=\"50%\" stop-color=\"{mid}\"/><stop offset=\"100%\" stop-color=\"{light}\"/></linearGradient>"
    ));
    svg.push_str(&format!(
        "<radialGradient id=\"groundDepth\" cx=\"50%\" cy=\"30%\" r=\"70%\"><stop offset=\"0%\" stop-color=\"{ground_light}\"/><stop offset=\"70%\" stop-color=\"{ground_mid}\"/><stop offset=\"100%\" stop-color=\"{ground_dark}\"/></radialGradient>"
    ));
    svg.push_str("</defs>");
}

fn render_organic(
    svg: &mut String,
    layout: &TreeLayout,
    theme: &Theme,
    config: &RenderConfig,
    rng: &mut ChaCha8Rng,
) {
    render_ground(svg, layout, theme, config, rng);
    for leaf in &layout.canopy {
        render_canopy_leaf(svg, leaf, theme);
    }
    render_trunk(svg, &layout.trunk, theme, rng);
    for branch in &layout.branches {
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"{:.1}\" stroke-linecap=\"round\"/>",
            branch.start.x,
            branch.start.y,
            branch.end.x,
            branch.end.y,
            theme.branch_color,
            branch.thickness
        ));
    }
    for leaf in layout.leaves() {
        render_leaf(svg, leaf, theme, None);
    }
}

fn render_ground(
    svg: &mut String,
    layout: &TreeLayout,
    theme: &Theme,
    config: &RenderConfig,
    rng: &mut ChaCha8Rng,
) {
    let top = layout.ground_y;
    let depth = layout.height - top;
    if depth <= 0.0 {
        return;
    }
    svg.push_str(&format!(
        "<rect x=\"0\" y=\"{top:.1}\" width=\"{:.1}\" height=\"{depth:.1}\" fill=\"url(#groundDepth)\"/>",
        layout.width
    ));

    let fallen: Vec<&String> = theme
        .canopy_green
        .iter()
        .chain(&theme.canopy_yellow)
        .chain(theme.canopy_brown.iter().take(1))
        .collect();
    for _ in 0..config.fallen_leaves {
        let x = rng.random_range(0.0..layout.width);
        let y = top + rng.random_range(0.0..=depth * 0.8) + depth * 0.1;
        let size = rng.random_range(8.0..20.0f32).min(depth);
        let rotation = rng.random_range(0.0..360.0f32);
        let opacity = rng.random_range(0.6..0.9f32);
        let color = pick(rng, &fallen)
            .map(|c| c.as_str())
            .unwrap_or(theme.low_color.as_str());
        let body = canopy_leaf_path(size, size * 1.2);
        svg.push_str(&format!(
            "<g transform=\"translate({:.1},{:.1}) rotate({rotation:.1})\"><path d=\"{body}\" fill=\"{}\" opacity=\"0.3\"/></g>",
            x + 1.0,
            y + 1.0,
            theme.ground_gradient[2]
        ));
        svg.push_str(&format!(
            "<g transform=\"translate({x:.1},{y:.1}) rotate({rotation:.1})\"><path d=\"{body}\" fill=\"{color}\" opacity=\"{opacity:.2}\"/></g>"
        ));
    }

    // Wind bends every blade toward the right.
    for _ in 0..config.grass_blades {
        let x = rng.random_range(0.0..layout.width);
        let blade = rng.random_range(5.0..20.0f32);
        let bend = blade * rng.random_range(0.3..0.7f32);
        let stroke = rng.random_range(0.5..1.3f32);
        let opacity = rng.random_range(0.7..1.0f32);
        let color = grass_color(rng, theme);
        push_blade(svg, x, top, blade, bend, 0.6, color, stroke, opacity);
    }
    for _ in 0..config.grass_clusters {
        let center = rng.random_range(0.0..layout.width);
        let tufts = rng.random_range(3..8);
        for _ in 0..tufts {
            let x = center + rng.random_range(-4.0..4.0f32);
            let blade = rng.random_range(3.0..13.0f32);
            let bend = blade * rng.random_range(0.2..0.5f32);
            let stroke = rng.random_range(0.6..1.2f32);
            let opacity = rng.random_range(0.6..1.0f32);
            let color = grass_color(rng, theme);
            push_blade(svg, x, top, blade, bend, 0.5, color, stroke, opacity);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn push_blade(
    svg: &mut String,
    x: f32,
    base: f32,
    height: f32,
    bend: f32,
    control: f32,
    color: &str,
    stroke: f32,
    opacity: f32,
) {
    svg.push_str(&format!(
        "<path d=\"M {x:.1} {base:.1} Q {:.1} {:.1} {:.1} {:.1}\" stroke=\"{color}\" stroke-width=\"{stroke:.1}\" fill=\"none\" opacity=\"{opacity:.2}\"/>",
        x + bend * control,
        base - height * 0.7,
        x + bend,
        base - height
    ));
}

fn grass_color<'a>(rng: &mut ChaCha8Rng, theme: &'a Theme) -> &'a str {
    pick(rng, &theme.grass_colors)
        .map(String::as_str)
        .unwrap_or(theme.low_color.as_str())
}

fn pick<'a, T>(rng: &mut ChaCha8Rng, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        items.get(rng.random_range(0..items.len()))
    }
}

/// Rotationally symmetric leaf body centered on the origin.
fn canopy_leaf_path(width: f32, height: f32) -> String {
    format!(
        "M 0 {:.1} Q {:.1} {:.1} {:.1} 0 Q {:.1} {:.1} 0 {:.1} Q {:.1} {:.1} {:.1} 0 Q {:.1} {:.1} 0 {:.1} Z",
        -height / 2.0,
        width / 3.0,
        -height / 3.0,
        width / 2.0,
        width / 3.0,
        height / 3.0,
        height / 2.0,
        -width / 3.0,
        height / 3.0,
        -width / 2.0,
        -width / 3.0,
        -height / 3.0,
        -height / 2.0
    )
}

fn render_canopy_leaf(svg: &mut String, leaf: &CanopyLeaf, theme: &Theme) {
    let palette = theme.canopy_palette(leaf.severity);
    let color = palette
        .get(leaf.shade % palette.len().max(1))
        .map(String::as_str)
        .unwrap_or_else(|| theme.severity_fill(leaf.severity));
    let height = leaf.size * 1.4;
    svg.push_str(&format!(
        "<g transform=\"translate({:.1},{:.1}) rotate({:.1})\"><path d=\"{}\" fill=\"{color}\" opacity=\"{:.2}\"/><line x1=\"0\" y1=\"{:.1}\" x2=\"0\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\" opacity=\"{:.2}\"/></g>",
        leaf.center.x,
        leaf.center.y,
        leaf.rotation,
        canopy_leaf_path(leaf.size, height),
        leaf.opacity,
        height / 2.0,
        height / 2.0 + leaf.size * 0.3,
        theme.bark_highlight,
        leaf.opacity * 0.8
    ));
}

fn render_trunk(svg: &mut String, trunk: &TrunkGeometry, theme: &Theme, rng: &mut ChaCha8Rng) {
    let base = trunk.base;
    let top = trunk.top();
    let bottom_half = trunk.base_width / 2.0;
    let top_half = trunk.top_width / 2.0;
    svg.push_str(&format!(
        "<path d=\"M {:.1},{:.1} L {:.1},{:.1} L {:.1},{:.1} L {:.1},{:.1} Z\" fill=\"url(#trunkGrad)\" stroke=\"{}\" stroke-width=\"2\"/>",
        base.x - bottom_half,
        base.y,
        base.x + bottom_half,
        base.y,
        top.x + top_half,
        top.y,
        top.x - top_half,
        top.y,
        theme.trunk_border
    ));

    let grains = 5;
    for idx in 0..grains {
        let t = idx as f32 / (grains - 1) as f32;
        let bottom_x = base.x - bottom_half + trunk.base_width * t;
        let top_x = top.x - top_half + trunk.top_width * t;
        let sway = rng.random_range(-1.0..=1.0f32) * trunk.base_width * 0.1;
        svg.push_str(&format!(
            "<path d=\"M {bottom_x:.1},{:.1} Q {:.1},{:.1} {top_x:.1},{:.1}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\" opacity=\"0.6\"/>",
            base.y,
            (bottom_x + top_x) / 2.0 + sway,
            base.y - trunk.height / 2.0,
            top.y,
            theme.trunk_border
        ));
    }

    let rings = 8;
    for idx in 1..rings {
        let t = idx as f32 / rings as f32;
        let y = base.y - trunk.height * t;
        let half = trunk.width_at(t) / 2.0;
        let wobble = rng.random_range(-2.0..=2.0f32).min(half * 0.5);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"{}\" stroke-width=\"0.8\" opacity=\"0.4\"/>",
            base.x - half + wobble,
            base.x + half - wobble,
            theme.trunk_border
        ));
    }

    // Knots and ridges sit at fixed heights and wobble sideways.
    for (t, size) in [(0.3, 4.0f32), (0.6, 3.0), (0.8, 2.0)] {
        let half = trunk.width_at(t) / 2.0;
        let x = base.x + rng.random_range(-0.5..=0.5f32) * half;
        let y = base.y - trunk.height * t;
        svg.push_str(&format!(
            "<ellipse cx=\"{x:.1}\" cy=\"{y:.1}\" rx=\"{size:.1}\" ry=\"{:.1}\" fill=\"{}\" opacity=\"0.8\"/>",
            size * 0.7,
            theme.trunk_border
        ));
        svg.push_str(&format!(
            "<ellipse cx=\"{:.1}\" cy=\"{:.1}\" rx=\"{:.1}\" ry=\"{:.1}\" fill=\"{}\" opacity=\"0.6\"/>",
            x - 0.5,
            y - 0.5,
            size * 0.6,
            size * 0.4,
            theme.bark_highlight
        ));
    }
    for (t, w, h) in [(0.2, 8.0f32, 15.0f32), (0.4, 6.0, 12.0), (0.7, 4.0, 8.0)] {
        let half = trunk.width_at(t) / 2.0;
        let x = base.x + rng.random_range(-0.6..=0.6f32) * half;
        let y = base.y - trunk.height * t;
        let h = h.min(trunk.height * 0.2);
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"2\" ry=\"2\" fill=\"{}\" opacity=\"0.5\"/>",
            x - w / 2.0,
            y - h / 2.0,
            theme.trunk_border
        ));
    }
}

/// Severity silhouette path around `(x, y)` at `scale`.
fn leaf_silhouette(severity: Severity, x: f32, y: f32, scale: f32) -> String {
    let p = |dx: f32, dy: f32| format!("{:.1},{:.1}", x + dx * scale, y + dy * scale);
    match severity {
        Severity::Low => format!(
            "M {} Q {} {} Q {} {} Q {} {} Q {} {} Z",
            p(0.0, -12.0),
            p(8.0, -8.0),
            p(12.0, 0.0),
            p(8.0, 8.0),
            p(0.0, 6.0),
            p(-8.0, 8.0),
            p(-12.0, 0.0),
            p(-8.0, -8.0),
            p(0.0, -12.0)
        ),
        Severity::Medium => format!(
            "M {} L {} L {} L {} L {} L {} Z",
            p(0.0, -11.0),
            p(10.0, -5.0),
            p(12.0, 3.0),
            p(0.0, 9.0),
            p(-12.0, 3.0),
            p(-10.0, -5.0)
        ),
        Severity::High | Severity::Critical => format!(
            "M {} L {} L {} L {} L {} L {} L {} L {} L {} L {} Z",
            p(0.0, -8.0),
            p(4.0, -6.0),
            p(10.0, -2.0),
            p(6.0, 2.0),
            p(8.0, 6.0),
            p(0.0, 4.0),
            p(-8.0, 6.0),
            p(-6.0, 2.0),
            p(-10.0, -2.0),
            p(-4.0, -6.0)
        ),
    }
}

fn leaf_details(severity: Severity, x: f32, y: f32, scale: f32, stroke: &str) -> String {
    let mut out = String::new();
    match severity {
        Severity::Low => {
            let _ = write!(
                out,
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{stroke}\" stroke-width=\"1\" opacity=\"0.6\"/>",
                x,
                y - 10.0 * scale,
                x,
                y + 5.0 * scale
            );
        }
        Severity::Medium => {
            for (dx, dy) in [(-4.0f32, -2.0f32), (4.0, 1.0)] {
                let _ = write!(
                    out,
                    "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{stroke}\" opacity=\"0.8\"/>",
                    x + dx * scale,
                    y + dy * scale,
                    1.8 * scale
                );
            }
        }
        Severity::High | Severity::Critical => {
            for (dx, dy) in [(-4.0f32, -4.0f32), (-4.0, 4.0)] {
                let _ = write!(
                    out,
                    "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{stroke}\" stroke-width=\"1\" opacity=\"0.8\"/>",
                    x + dx * scale,
                    y + dy * scale,
                    x - dx * scale,
                    y - dy * scale
                );
            }
        }
    }
    out
}

fn render_leaf(svg: &mut String, leaf: &LeafPlacement, theme: &Theme, label: Option<&str>) {
    let fill = theme.severity_fill(leaf.severity);
    let stroke = theme.severity_stroke(leaf.severity);
    let (x, y) = (leaf.anchor.x, leaf.anchor.y);
    let name = escape_xml(&leaf.name);
    svg.push_str(&format!(
        "<g class=\"leaf\" data-function=\"{name}\" data-complexity=\"{}\" data-severity=\"{}\">",
        leaf.complexity,
        leaf.severity
    ));
    let tilted = leaf.rotation != 0.0;
    if tilted {
        svg.push_str(&format!(
            "<g transform=\"rotate({:.1} {x:.1} {y:.1})\">",
            leaf.rotation
        ));
    }
    svg.push_str(&format!(
        "<path d=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"1\"/>",
        leaf_silhouette(leaf.severity, x, y, leaf.scale)
    ));
    svg.push_str(&leaf_details(leaf.severity, x, y, leaf.scale, &stroke));
    if tilted {
        svg.push_str("</g>");
    }
    if let Some(label) = label {
        let size = (theme.font_size * 0.6 * leaf.scale).max(6.0);
        svg.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{size:.1}\" fill=\"{}\">{}</text>",
            y + size / 3.0,
            theme.font_family,
            theme.text_color,
            escape_xml(label)
        ));
        svg.push_str(&format!(
            "<text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{size:.1}\" fill=\"{}\">{}</text>",
            y + 20.0 * leaf.scale + size / 3.0,
            theme.font_family,
            theme.muted_text_color,
            leaf.complexity
        ));
    }
    svg.push_str(&format!(
        "<title>{name} (complexity: {})</title></g>",
        leaf.complexity
    ));
}

fn render_grid(svg: &mut String, layout: &TreeLayout, theme: &Theme, config: &RenderConfig) {
    let trunk = &layout.trunk;
    let top = trunk.top();
    for branch in &layout.branches {
        push_connection(
            svg,
            branch.start.x,
            branch.start.y,
            branch.end.x,
            branch.end.y - GROUP_BOX_HEIGHT / 2.0,
            theme,
        );
        for leaf in &branch.leaves {
            push_connection(
                svg,
                branch.end.x,
                branch.end.y + GROUP_BOX_HEIGHT / 2.0,
                leaf.anchor.x,
                leaf.anchor.y - 12.0 * leaf.scale,
                theme,
            );
        }
    }

    svg.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"5\" ry=\"5\" fill=\"{}\" stroke=\"{}\" stroke-width=\"3\"/>",
        top.x - trunk.base_width / 2.0,
        top.y,
        trunk.base_width,
        trunk.height,
        theme.trunk_color,
        theme.trunk_border
    ));
    let center_y = top.y + trunk.height / 2.0;
    push_label(
        svg,
        top.x,
        center_y + theme.font_size / 3.0,
        &trunk.label,
        theme.font_size,
        &theme.text_color,
        theme,
    );

    for branch in &layout.branches {
        render_group(svg, branch, theme, config);
    }
}

fn render_group(svg: &mut String, branch: &BranchGeometry, theme: &Theme, config: &RenderConfig) {
    let (x, y) = (branch.end.x, branch.end.y);
    svg.push_str(&format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{GROUP_BOX_HEIGHT:.1}\" rx=\"10\" ry=\"10\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\" data-group=\"{}\" data-severity=\"{}\"/>",
        x - branch.box_width / 2.0,
        y - GROUP_BOX_HEIGHT / 2.0,
        branch.box_width,
        theme.severity_fill(branch.severity),
        theme.severity_stroke(branch.severity),
        escape_xml(&branch.name),
        branch.severity
    ));
    if config.show_grid_labels {
        let size = theme.font_size * 0.8;
        let name = truncate_label(&branch.name, LABEL_MAX_CHARS);
        push_label(svg, x, y + size / 3.0, &name, size, &theme.text_color, theme);
        let total = branch.complexity.to_string();
        push_label(svg, x, y + 20.0, &total, size, &theme.muted_text_color, theme);
    }
    for leaf in &branch.leaves {
        let label = config
            .show_grid_labels
            .then(|| truncate_label(&leaf.name, LABEL_MAX_CHARS));
        render_leaf(svg, leaf, theme, label.as_deref());
    }
}

fn push_connection(svg: &mut String, x1: f32, y1: f32, x2: f32, y2: f32, theme: &Theme) {
    svg.push_str(&format!(
        "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
        theme.connection_color
    ));
}

fn push_label(svg: &mut String, x: f32, y: f32, text: &str, size: f32, fill: &str, theme: &Theme) {
    svg.push_str(&format!(
        "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{size:.1}\" fill=\"{fill}\">{}</text>",
        theme.font_family,
        escape_xml(text)
    ));
}

/// Names longer than `max` characters keep their first `max - 3` plus "...".
pub fn truncate_label(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = name.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme.font_family.clone();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
