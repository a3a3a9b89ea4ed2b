mod canopy;
mod cluster;
mod grid;
mod organic;
pub(crate) mod types;
pub use types::*;
use canopy::*;
use cluster::*;
use grid::*;
use organic::*;

use crate::classify::Severity;
use crate::config::{LayoutConfig, LayoutStyle};
use crate::error::ConfigError;
use crate::ratio::ColorRatio;
use crate::tree::{ComplexityTree, NodeId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

// Independent random streams derived from the layout seed. Geometry and
// decoration never share a stream, so decoration cannot move a leaf.
const CLUSTER_STREAM: u64 = 0;
const CANOPY_STREAM: u64 = 1;
pub(crate) const DECOR_STREAM: u64 = 2;

pub(crate) fn seeded_stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Place trunk, branches and leaves for `tree` on the configured canvas.
///
/// Fails only when the canvas itself is invalid. The same tree, ratio and
/// config always produce the same geometry.
pub fn compute_layout(
    tree: &ComplexityTree,
    ratio: &ColorRatio,
    config: &LayoutConfig,
) -> Result<TreeLayout, ConfigError> {
    config.validate()?;
    let layout = match config.style {
        LayoutStyle::Organic => compute_organic_layout(tree, ratio, config),
        LayoutStyle::Grid => compute_grid_layout(tree, config),
    };
    debug!(
        style = ?config.style,
        branches = layout.branches.len(),
        leaves = layout.leaf_count(),
        canopy = layout.canopy.len(),
        "computed layout"
    );
    Ok(layout)
}

fn leaf_placement(
    tree: &ComplexityTree,
    id: NodeId,
    anchor: Point,
    scale: f32,
    rotation: f32,
) -> LeafPlacement {
    let node = tree.node(id);
    LeafPlacement {
        anchor,
        name: node.name.clone(),
        complexity: node.complexity,
        severity: node.severity,
        scale,
        rotation,
    }
}

fn group_severity(tree: &ComplexityTree, id: NodeId) -> (u64, Severity) {
    let node = tree.node(id);
    (node.complexity, node.severity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use crate::ir::FunctionRecord;
    use crate::tree::{GroupBy, build_tree};

    fn sample_tree(groups: usize, per_group: usize) -> ComplexityTree {
        let mut records = Vec::new();
        for g in 0..groups {
            for f in 0..per_group {
                records.push(FunctionRecord::new(
                    &format!("f{g}_{f}"),
                    &format!("pkg/file{g}.go"),
                    1 + ((g * 7 + f * 3) % 30) as u32,
                ));
            }
        }
        build_tree(&records, &Thresholds::default(), GroupBy::File)
    }

    fn assert_on_canvas(layout: &TreeLayout) {
        for point in layout.functional_points() {
            assert!(layout.contains(point), "{point:?} outside {}x{}", layout.width, layout.height);
        }
    }

    #[test]
    fn empty_tree_draws_only_trunk() {
        let tree = sample_tree(0, 0);
        let layout =
            compute_layout(&tree, &ColorRatio::from_tree(&tree), &LayoutConfig::default()).unwrap();
        assert!(layout.branches.is_empty());
        assert!(layout.canopy.is_empty());
        assert!(layout.trunk.height > 0.0);
    }

    #[test]
    fn rejects_invalid_canvas() {
        let tree = sample_tree(1, 1);
        let mut config = LayoutConfig::default();
        config.height = -1.0;
        assert!(compute_layout(&tree, &ColorRatio::default(), &config).is_err());
    }

    #[test]
    fn rejects_non_finite_organic_settings() {
        let tree = sample_tree(2, 3);
        let ratio = ColorRatio::from_tree(&tree);
        let mut config = LayoutConfig::default();
        config.organic.trunk_height = f32::NAN;
        assert!(matches!(
            compute_layout(&tree, &ratio, &config),
            Err(ConfigError::InvalidLayoutValue { field: "trunkHeight", .. })
        ));

        let mut config = LayoutConfig::default();
        config.organic.canopy_leaves = usize::MAX;
        assert!(matches!(
            compute_layout(&tree, &ratio, &config),
            Err(ConfigError::TooManyCanopyLeaves { .. })
        ));
    }

    #[test]
    fn dense_trees_stay_on_minimum_canvas() {
        let tree = sample_tree(50, 50);
        let ratio = ColorRatio::from_tree(&tree);
        for style in [LayoutStyle::Organic, LayoutStyle::Grid] {
            let mut config = LayoutConfig::default();
            config.style = style;
            config.width = crate::config::MIN_CANVAS_WIDTH;
            config.height = crate::config::MIN_CANVAS_HEIGHT;
            let layout = compute_layout(&tree, &ratio, &config).unwrap();
            assert_eq!(layout.branches.len(), 50);
            assert_eq!(layout.leaf_count(), 2500);
            assert_on_canvas(&layout);
        }
    }

    #[test]
    fn same_input_same_geometry() {
        let tree = sample_tree(7, 9);
        let ratio = ColorRatio::from_tree(&tree);
        let config = LayoutConfig::default();
        let first = compute_layout(&tree, &ratio, &config).unwrap();
        let second = compute_layout(&tree, &ratio, &config).unwrap();
        assert_eq!(first.functional_points(), second.functional_points());
    }

    #[test]
    fn different_streams_diverge() {
        use rand::Rng;
        let mut a = seeded_stream(1, CLUSTER_STREAM);
        let mut b = seeded_stream(1, DECOR_STREAM);
        let left: Vec<u32> = (0..4).map(|_| a.random()).collect();
        let right: Vec<u32> = (0..4).map(|_| b.random()).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn streams_do_not_alias_across_seeds() {
        use rand::Rng;
        let draw = |mut rng: ChaCha8Rng| -> Vec<u64> { (0..4).map(|_| rng.random()).collect() };
        assert_ne!(
            draw(seeded_stream(CANOPY_STREAM, CLUSTER_STREAM)),
            draw(seeded_stream(CLUSTER_STREAM, CANOPY_STREAM))
        );
        assert_ne!(
            draw(seeded_stream(DECOR_STREAM, CLUSTER_STREAM)),
            draw(seeded_stream(CLUSTER_STREAM, DECOR_STREAM))
        );
        assert_eq!(
            draw(seeded_stream(7, CANOPY_STREAM)),
            draw(seeded_stream(7, CANOPY_STREAM))
        );
    }
}
