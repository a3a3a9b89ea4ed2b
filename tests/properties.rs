//! Property-based tests for classification, tree building and layout.

use complexity_tree::config::{MIN_CANVAS_HEIGHT, MIN_CANVAS_WIDTH};
use complexity_tree::ratio::VISIBILITY_FLOOR;
use complexity_tree::{
    ColorRatio, FunctionRecord, GroupBy, LayoutConfig, LayoutStyle, Thresholds, build_tree,
    compute_layout,
};
use proptest::prelude::*;

fn thresholds() -> impl Strategy<Value = Thresholds> {
    (1u32..30, 1u32..30, prop::option::of(1u32..30)).prop_map(|(medium, gap, extra)| Thresholds {
        medium,
        high: medium + gap,
        critical: extra.map(|extra| medium + gap + extra),
    })
}

fn records() -> impl Strategy<Value = Vec<FunctionRecord>> {
    prop::collection::vec((0usize..6, 0u32..60), 0..60).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, (file, complexity))| {
                let path = format!("pkg{}/file{file}.go", file % 2);
                FunctionRecord::new(&format!("f{idx}"), &path, complexity)
            })
            .collect()
    })
}

proptest! {
    // ========================
    // Classifier Properties
    // ========================

    #[test]
    fn classification_is_monotonic(t in thresholds(), a in 0u32..100, b in 0u32..100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(t.level(lo) <= t.level(hi));
    }

    #[test]
    fn thresholds_open_their_bucket(t in thresholds()) {
        prop_assert!(t.level(t.medium - 1) < t.level(t.medium));
        prop_assert!(t.level(t.high - 1) < t.level(t.high));
        if let Some(critical) = t.critical {
            prop_assert!(t.level(critical - 1) < t.level(critical));
        }
    }

    // ========================
    // Tree Builder Properties
    // ========================

    #[test]
    fn builder_keeps_every_record(
        records in records(),
        group_by in prop_oneof![Just(GroupBy::File), Just(GroupBy::Package)],
    ) {
        let tree = build_tree(&records, &Thresholds::default(), group_by);
        prop_assert_eq!(tree.function_count(), records.len());
        prop_assert_eq!(tree.severity_counts().iter().sum::<usize>(), records.len());
        for id in tree.group_ids() {
            let group = tree.node(*id);
            let sum: u64 = tree.children(*id).map(|f| f.complexity).sum();
            prop_assert_eq!(group.complexity, sum);
            prop_assert!(!group.children.is_empty());
        }
    }

    // ========================
    // Ratio Properties
    // ========================

    #[test]
    fn ratio_floor_applies_to_nonempty_buckets(counts in prop::array::uniform4(0usize..200)) {
        let ratio = ColorRatio::from_counts(counts);
        for (count, share) in counts.iter().zip(ratio.as_array()) {
            if *count == 0 {
                prop_assert_eq!(share, 0.0);
            } else {
                prop_assert!(share >= VISIBILITY_FLOOR);
            }
        }
        let normalized = ratio.renormalized();
        if counts.iter().any(|c| *c > 0) {
            prop_assert!((normalized.sum() - 1.0).abs() < 1e-9);
        }
    }

    // ========================
    // Layout Properties
    // ========================

    #[test]
    fn layout_stays_on_canvas(
        records in records(),
        width in MIN_CANVAS_WIDTH..1600.0f32,
        height in MIN_CANVAS_HEIGHT..1200.0f32,
        seed in any::<u64>(),
        grid in any::<bool>(),
    ) {
        let tree = build_tree(&records, &Thresholds::default(), GroupBy::File);
        let ratio = ColorRatio::from_tree(&tree);
        let config = LayoutConfig {
            style: if grid { LayoutStyle::Grid } else { LayoutStyle::Organic },
            width,
            height,
            seed,
            ..LayoutConfig::default()
        };
        let layout = compute_layout(&tree, &ratio, &config).unwrap();
        prop_assert_eq!(layout.leaf_count(), records.len());
        prop_assert_eq!(layout.branches.len(), tree.group_count());
        for point in layout.functional_points() {
            prop_assert!(layout.contains(point), "{:?} off a {}x{} canvas", point, width, height);
        }
    }

    #[test]
    fn layout_is_deterministic(records in records(), seed in any::<u64>()) {
        let tree = build_tree(&records, &Thresholds::default(), GroupBy::File);
        let ratio = ColorRatio::from_tree(&tree);
        let config = LayoutConfig { seed, ..LayoutConfig::default() };
        let first = compute_layout(&tree, &ratio, &config).unwrap();
        let second = compute_layout(&tree, &ratio, &config).unwrap();
        prop_assert_eq!(first.functional_points(), second.functional_points());
        prop_assert_eq!(first.canopy.len(), second.canopy.len());
    }
}
