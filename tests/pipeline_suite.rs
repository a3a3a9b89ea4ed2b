use std::path::Path;

use complexity_tree::config::parse_config;
use complexity_tree::layout::compute_layout;
use complexity_tree::tree::NodeKind;
use complexity_tree::{
    ColorRatio, Config, FunctionRecord, GroupBy, LayoutStyle, RenderConfig, Severity, Theme,
    Thresholds, build_tree, parse_records, render_svg,
};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).expect("fixture read failed")
}

fn render_records(records: &[FunctionRecord], config: &Config) -> String {
    let tree = build_tree(records, &config.thresholds, config.group_by);
    let ratio = ColorRatio::from_tree(&tree);
    let layout = compute_layout(&tree, &ratio, &config.layout).expect("layout failed");
    render_svg(&layout, &config.theme, &config.render)
}

fn assert_valid_svg(svg: &str, label: &str) {
    assert!(svg.starts_with("<svg"), "{label}: missing <svg tag");
    assert!(svg.ends_with("</svg>"), "{label}: missing </svg tag");
}

#[test]
fn mixed_severities_in_one_file() {
    let records = vec![
        FunctionRecord::new("small", "app.go", 2),
        FunctionRecord::new("busy", "app.go", 12),
        FunctionRecord::new("tangled", "app.go", 22),
    ];
    let tree = build_tree(&records, &Thresholds::default(), GroupBy::File);
    let levels: Vec<Severity> = tree.functions().map(|f| f.severity).collect();
    assert_eq!(levels, vec![Severity::Low, Severity::Medium, Severity::Critical]);
    assert_eq!(tree.root().kind, NodeKind::Root);
    assert_eq!(tree.group_count(), 1);
    assert_eq!(tree.function_count(), 3);

    let ratio = ColorRatio::from_tree(&tree);
    assert!(ratio.brown >= 0.1);
    assert_eq!(ratio.red, 0.0);
}

#[test]
fn no_functions_draws_bare_trunk() {
    let svg = render_records(&[], &Config::default());
    assert_valid_svg(&svg, "empty");
    assert!(svg.contains("url(#trunkGrad)"));
    assert!(!svg.contains("class=\"leaf\""));
    assert!(!svg.contains("stroke-linecap=\"round\""));
}

#[test]
fn boundary_score_classifies_the_same_everywhere() {
    let thresholds = Thresholds::default();
    let records = vec![FunctionRecord::new("edge", "edge.go", thresholds.medium)];
    let tree = build_tree(&records, &thresholds, GroupBy::File);
    let function = tree.functions().next().unwrap();
    let group = tree.groups().next().unwrap();
    assert_eq!(thresholds.level(thresholds.medium), Severity::Medium);
    assert_eq!(function.severity, Severity::Medium);
    assert_eq!(group.severity, Severity::Medium);

    let svg = render_records(&records, &Config::default());
    assert!(svg.contains("data-function=\"edge\" data-complexity=\"10\" data-severity=\"medium\""));
}

#[test]
fn json_and_analyzer_output_build_the_same_tree() {
    let from_json = parse_records(&fixture("records.json")).unwrap();
    let from_text = parse_records(&fixture("gocyclo.txt")).unwrap();
    assert_eq!(from_json.len(), 8);
    assert_eq!(from_text.len(), 8);

    let thresholds = Thresholds::default();
    let a = build_tree(&from_json, &thresholds, GroupBy::File);
    let b = build_tree(&from_text, &thresholds, GroupBy::File);
    assert_eq!(a.severity_counts(), b.severity_counts());
    let mut groups_a: Vec<u64> = a.groups().map(|g| g.complexity).collect();
    let mut groups_b: Vec<u64> = b.groups().map(|g| g.complexity).collect();
    groups_a.sort_unstable();
    groups_b.sort_unstable();
    assert_eq!(groups_a, groups_b);
}

#[test]
fn fixture_renders_every_function_as_a_leaf() {
    let records = parse_records(&fixture("records.json")).unwrap();
    for style in [LayoutStyle::Organic, LayoutStyle::Grid] {
        let mut config = Config::default();
        config.layout.style = style;
        let svg = render_records(&records, &config);
        assert_valid_svg(&svg, &format!("{style:?}"));
        assert_eq!(svg.matches("class=\"leaf\"").count(), records.len());
        assert!(svg.contains("<title>(*Server).route (complexity: 22)</title>"));
    }
}

#[test]
fn grid_config_file_drives_the_pipeline() {
    let config = parse_config(&fixture("grid.json")).unwrap();
    config.validate().unwrap();
    assert_eq!(config.layout.style, LayoutStyle::Grid);
    assert_eq!(config.thresholds.critical, None);
    assert_eq!(config.group_by, GroupBy::Package);

    let records = parse_records(&fixture("records.json")).unwrap();
    let tree = build_tree(&records, &config.thresholds, config.group_by);
    let groups: Vec<&str> = tree.groups().map(|g| g.name.as_str()).collect();
    assert_eq!(groups, vec!["server", "config", "main", "lexer"]);
    assert_eq!(tree.severity_counts()[Severity::Critical.index()], 0);

    let svg = render_records(&records, &config);
    assert_valid_svg(&svg, "grid.json");
    assert!(svg.contains("width=\"640\" height=\"480\""));
    assert!(svg.contains(&Theme::pastel().background));
    assert!(svg.contains("Grid &amp; friends"));
}

#[test]
fn same_seed_same_document() {
    let records = parse_records(&fixture("records.json")).unwrap();
    let config = Config::default();
    assert_eq!(render_records(&records, &config), render_records(&records, &config));

    let mut reseeded = config.clone();
    reseeded.layout.seed ^= 0xff;
    assert_ne!(render_records(&records, &config), render_records(&records, &reseeded));
}

#[test]
fn decoration_settings_do_not_move_leaves() {
    let records = parse_records(&fixture("records.json")).unwrap();
    let tree = build_tree(&records, &Thresholds::default(), GroupBy::File);
    let ratio = ColorRatio::from_tree(&tree);
    let config = Config::default();
    let layout = compute_layout(&tree, &ratio, &config.layout).unwrap();

    let sparse = RenderConfig {
        grass_blades: 0,
        grass_clusters: 0,
        fallen_leaves: 0,
        ..RenderConfig::default()
    };
    let dense = render_svg(&layout, &config.theme, &config.render);
    let plain = render_svg(&layout, &config.theme, &sparse);
    let leaves = |svg: &str| -> Vec<String> {
        svg.split("<g class=\"leaf\"")
            .skip(1)
            .map(|chunk| chunk.split("</g>").next().unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(leaves(&dense), leaves(&plain));
}

#[test]
fn invalid_canvas_is_rejected_before_layout() {
    let mut config = Config::default();
    config.layout.width = 120.0;
    assert!(config.validate().is_err());
    let tree = build_tree(&[], &config.thresholds, config.group_by);
    assert!(compute_layout(&tree, &ColorRatio::default(), &config.layout).is_err());
}
