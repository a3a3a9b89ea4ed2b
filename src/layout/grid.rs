use super::*;

const ROOT_HEIGHT: f32 = 50.0;
const ROOT_WIDTH: f32 = 40.0;
const GROUP_BOX_WIDTH: f32 = 60.0;
// Share of a group slot a box may cover, leaving a gap between neighbours.
const GROUP_BOX_SLOT_SHARE: f32 = 0.9;
const CONNECTION_THICKNESS: f32 = 1.0;
// Matches the organic leaf glyph's half extent at scale 1.
const LEAF_EXTENT: f32 = 12.0;
const REFERENCE_SPACING: f32 = 40.0;

/// Columns and pitch for one group's functions inside its horizontal slot.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnPlan {
    columns: usize,
    rows: usize,
    spacing: f32,
}

fn column_plan(count: usize, slot: f32, min_spacing: f32, max_spacing: f32) -> ColumnPlan {
    if count == 0 {
        return ColumnPlan {
            columns: 0,
            rows: 0,
            spacing: 0.0,
        };
    }
    let min_spacing = min_spacing.max(1.0);
    let columns = if count as f32 * min_spacing <= slot {
        count
    } else {
        ((slot / min_spacing).floor() as usize).max(1)
    };
    ColumnPlan {
        columns,
        rows: count.div_ceil(columns),
        spacing: (slot / columns as f32).min(max_spacing),
    }
}

/// Evenly spaced hierarchy: root band, one group per column slot, functions
/// wrapped into rows below their group. Uses no randomness.
pub(super) fn compute_grid_layout(tree: &ComplexityTree, config: &LayoutConfig) -> TreeLayout {
    let grid = &config.grid;
    let width = config.width;
    let height = config.height;
    let margin = config.margin.clamp(0.0, width.min(height) * 0.1);

    let root_y = height * grid.root_band;
    let group_y = height * grid.group_band;
    let function_y = height * grid.function_band;

    let trunk = TrunkGeometry {
        base: Point::new(width / 2.0, root_y + ROOT_HEIGHT / 2.0),
        height: ROOT_HEIGHT,
        base_width: ROOT_WIDTH,
        top_width: ROOT_WIDTH,
        label: tree.root().name.clone(),
    };

    let groups = tree.group_ids();
    let side_margin = grid.side_margin.clamp(0.0, width * 0.1);
    let slot = (width - 2.0 * side_margin) / groups.len().max(1) as f32;
    let available = (height - margin - LEAF_EXTENT - function_y).max(0.0);
    let box_width = GROUP_BOX_WIDTH.min(slot * GROUP_BOX_SLOT_SHARE);

    let mut branches = Vec::with_capacity(groups.len());
    for (idx, group_id) in groups.iter().enumerate() {
        let group = tree.node(*group_id);
        let group_x = side_margin + idx as f32 * slot + slot / 2.0;
        let start = trunk.base;
        let end = Point::new(group_x, group_y);

        let plan = column_plan(
            group.children.len(),
            slot,
            grid.min_function_spacing,
            grid.max_function_spacing,
        );
        let row_step = grid
            .row_step
            .min(available / plan.rows.saturating_sub(1).max(1) as f32);
        let scale = (plan.spacing / REFERENCE_SPACING).clamp(0.3, 1.0);

        let leaves = group
            .children
            .iter()
            .enumerate()
            .map(|(pos, child)| {
                let row = pos / plan.columns;
                let col = pos % plan.columns;
                let in_row = (group.children.len() - row * plan.columns).min(plan.columns);
                let x = group_x - (in_row - 1) as f32 * plan.spacing / 2.0
                    + col as f32 * plan.spacing;
                let y = function_y + row as f32 * row_step;
                leaf_placement(tree, *child, Point::new(x, y), scale, 0.0)
            })
            .collect();

        let (complexity, severity) = group_severity(tree, *group_id);
        branches.push(BranchGeometry {
            name: group.name.clone(),
            start,
            end,
            angle: (start.y - end.y).atan2(end.x - start.x).to_degrees(),
            length: start.distance(end),
            thickness: CONNECTION_THICKNESS,
            box_width,
            side: if group_x < start.x {
                BranchSide::Left
            } else {
                BranchSide::Right
            },
            complexity,
            severity,
            leaves,
        });
    }

    TreeLayout {
        style: LayoutStyle::Grid,
        width,
        height,
        ground_y: height,
        seed: config.seed,
        trunk,
        branches,
        canopy: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use crate::ir::FunctionRecord;
    use crate::tree::{GroupBy, build_tree};

    fn grid_config() -> LayoutConfig {
        LayoutConfig {
            style: LayoutStyle::Grid,
            ..LayoutConfig::default()
        }
    }

    fn tree(groups: &[usize]) -> ComplexityTree {
        let mut records = Vec::new();
        for (g, count) in groups.iter().enumerate() {
            for f in 0..*count {
                records.push(FunctionRecord::new(&format!("fn{f}"), &format!("m{g}.go"), 12));
            }
        }
        build_tree(&records, &Thresholds::default(), GroupBy::File)
    }

    #[test]
    fn wide_slot_fits_one_row() {
        let plan = column_plan(4, 200.0, 14.0, 80.0);
        assert_eq!(plan.columns, 4);
        assert_eq!(plan.rows, 1);
        assert_eq!(plan.spacing, 50.0);
    }

    #[test]
    fn narrow_slot_wraps_rows() {
        let plan = column_plan(10, 50.0, 14.0, 80.0);
        assert_eq!(plan.columns, 3);
        assert_eq!(plan.rows, 4);
    }

    #[test]
    fn groups_evenly_spaced_between_margins() {
        let layout = compute_grid_layout(&tree(&[1, 1]), &grid_config());
        let xs: Vec<f32> = layout.branches.iter().map(|b| b.end.x).collect();
        assert_eq!(xs, vec![225.0, 575.0]);
        assert!(layout.branches.iter().all(|b| (b.end.y - 240.0).abs() < 1e-3));
        assert!(layout.canopy.is_empty());
    }

    #[test]
    fn row_is_centered_under_group() {
        let layout = compute_grid_layout(&tree(&[3]), &grid_config());
        let branch = &layout.branches[0];
        let mean = branch.leaves.iter().map(|l| l.anchor.x).sum::<f32>() / 3.0;
        assert!((mean - branch.end.x).abs() < 1e-3);
        assert!(branch.leaves.iter().all(|l| (l.anchor.y - 390.0).abs() < 1e-3));
    }

    #[test]
    fn crowded_groups_shrink_their_boxes() {
        let mut config = grid_config();
        config.width = 200.0;
        config.height = 200.0;
        let layout = compute_grid_layout(&tree(&[1; 50]), &config);
        let boxes: Vec<(f32, f32)> = layout
            .branches
            .iter()
            .map(|b| (b.end.x - b.box_width / 2.0, b.end.x + b.box_width / 2.0))
            .collect();
        assert!(boxes.iter().all(|(left, right)| *left >= 0.0 && *right <= 200.0));
        assert!(boxes.windows(2).all(|pair| pair[0].1 < pair[1].0));

        let roomy = compute_grid_layout(&tree(&[1, 1]), &grid_config());
        assert!(roomy.branches.iter().all(|b| b.box_width == GROUP_BOX_WIDTH));
    }

    #[test]
    fn empty_group_keeps_its_column() {
        let mut tree = tree(&[2]);
        tree.push_group("empty.go".to_string(), &[], &Thresholds::default());
        let layout = compute_layout(&tree, &ColorRatio::from_tree(&tree), &grid_config()).unwrap();
        assert_eq!(layout.branches.len(), 2);
        assert!(layout.branches[1].leaves.is_empty());
        assert_eq!(layout.branches[1].end.x, 575.0);
        assert_eq!(layout.leaf_count(), 2);
    }

    #[test]
    fn grid_is_seed_independent() {
        let tree = tree(&[4, 6]);
        let mut config = grid_config();
        let first = compute_grid_layout(&tree, &config);
        config.seed = 99;
        let second = compute_grid_layout(&tree, &config);
        assert_eq!(first.functional_points(), second.functional_points());
    }
}
