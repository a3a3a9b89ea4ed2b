use super::*;

use crate::config::OrganicConfig;

// Share of the usable canvas a single leaf cluster may cover, per axis.
const MAX_CLUSTER_SHARE: f32 = 0.25;
const MAX_TRUNK_SHARE: f32 = 0.4;
const MAX_GROUND_SHARE: f32 = 0.15;
const MAX_BRANCH_WIDTH_SHARE: f32 = 0.3;

/// Rectangle that functional geometry must stay inside.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

impl Bounds {
    fn inset(self, amount: f32) -> Self {
        Self {
            min_x: self.min_x + amount,
            max_x: self.max_x - amount,
            min_y: self.min_y + amount,
            max_y: self.max_y - amount,
        }
    }

    fn clamp(self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y.clamp(self.min_y, self.max_y),
        )
    }

    fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    fn height(self) -> f32 {
        self.max_y - self.min_y
    }
}

fn side_count(total: usize, side: BranchSide) -> usize {
    match side {
        BranchSide::Left => total.div_ceil(2),
        BranchSide::Right => total / 2,
    }
}

/// Branch angle in degrees. Left branches fan from 160° toward the upper-left
/// bound, right branches from 20° toward the upper-right bound; the step
/// shrinks when a side holds more branches than its range allows.
fn branch_angle(side: BranchSide, rank: usize, count: usize, config: &OrganicConfig) -> f32 {
    let (lo, hi) = match side {
        BranchSide::Left => config.left_angle_range,
        BranchSide::Right => config.right_angle_range,
    };
    let (start, room) = match side {
        BranchSide::Left => {
            let start = 160.0f32.clamp(lo, hi);
            (start, start - lo)
        }
        BranchSide::Right => {
            let start = 20.0f32.clamp(lo, hi);
            (start, hi - start)
        }
    };
    let mut step = config.branch_angle_step;
    if count > 1 {
        step = step.min(room / (count - 1) as f32);
    }
    match side {
        BranchSide::Left => start - rank as f32 * step,
        BranchSide::Right => start + rank as f32 * step,
    }
}

fn branch_length(
    index: usize,
    side: BranchSide,
    leaves: usize,
    cap: f32,
    config: &OrganicConfig,
) -> f32 {
    let wobble = match side {
        BranchSide::Left => index % 3,
        BranchSide::Right => (index + 1) % 3,
    };
    let length = config.base_branch_length
        + leaves as f32 * config.branch_length_per_leaf
        + wobble as f32 * config.branch_length_variation;
    length.min(cap)
}

/// Tilt that points a ringed leaf away from its branch tip.
fn outward_tilt(offset: Point) -> f32 {
    if offset == Point::default() {
        return 0.0;
    }
    offset.y.atan2(offset.x).to_degrees() + 90.0
}

pub(super) fn compute_organic_layout(
    tree: &ComplexityTree,
    ratio: &ColorRatio,
    config: &LayoutConfig,
) -> TreeLayout {
    let organic = &config.organic;
    let width = config.width;
    let height = config.height;
    let margin = config.margin.clamp(0.0, width.min(height) * 0.1);

    let ground_height = organic.ground_height.clamp(0.0, height * MAX_GROUND_SHARE);
    let ground_y = height - ground_height;
    let trunk_height = organic.trunk_height.clamp(1.0, height * MAX_TRUNK_SHARE);
    let base_width = organic.trunk_width.clamp(2.0, width * 0.1);
    let trunk = TrunkGeometry {
        base: Point::new(width / 2.0, ground_y),
        height: trunk_height,
        base_width,
        top_width: base_width * organic.trunk_top_ratio.clamp(0.1, 1.0),
        label: tree.root().name.clone(),
    };

    let usable = Bounds {
        min_x: margin,
        max_x: width - margin,
        min_y: margin,
        max_y: ground_y - margin,
    };
    let max_reach = MAX_CLUSTER_SHARE * usable.width().min(usable.height());
    let length_cap = organic
        .max_branch_length
        .min(width * MAX_BRANCH_WIDTH_SHARE)
        .max(1.0);

    let mut rng = seeded_stream(config.seed, CLUSTER_STREAM);
    let groups = tree.group_ids();
    let total = groups.len();
    let mut branches = Vec::with_capacity(total);

    for (idx, group_id) in groups.iter().enumerate() {
        let group = tree.node(*group_id);
        let side = if idx % 2 == 0 {
            BranchSide::Left
        } else {
            BranchSide::Right
        };
        let angle = branch_angle(side, idx / 2, side_count(total, side), organic);
        let attach_y = trunk.base.y - trunk_height * (idx + 1) as f32 / (total + 1) as f32;
        let start = Point::new(trunk.base.x, attach_y);
        let length = branch_length(idx, side, group.children.len(), length_cap, organic);

        let cluster = cluster_offsets(group.children.len(), organic, &mut rng);
        let footprint = cluster.radius + organic.leaf_extent;
        let scale = if footprint > max_reach {
            max_reach / footprint
        } else {
            1.0
        };
        let cluster = cluster.scaled(scale);
        let reach = footprint * scale;

        let radians = angle.to_radians();
        let desired = Point::new(
            start.x + length * radians.cos(),
            start.y - length * radians.sin(),
        );
        let end = usable.inset(reach).clamp(desired);

        let leaves = group
            .children
            .iter()
            .zip(&cluster.offsets)
            .map(|(child, offset)| {
                leaf_placement(
                    tree,
                    *child,
                    end.offset(offset.x, offset.y),
                    scale,
                    outward_tilt(*offset),
                )
            })
            .collect();

        let (complexity, severity) = group_severity(tree, *group_id);
        let thickness = (organic.max_branch_thickness
            - idx as f32 * organic.branch_thickness_step)
            .max(organic.min_branch_thickness);
        branches.push(BranchGeometry {
            name: group.name.clone(),
            start,
            end,
            angle: (start.y - end.y).atan2(end.x - start.x).to_degrees(),
            length: start.distance(end),
            thickness,
            box_width: 0.0,
            side,
            complexity,
            severity,
            leaves,
        });
    }

    let canopy = compute_canopy(&trunk, ratio, width, margin, config);

    TreeLayout {
        style: LayoutStyle::Organic,
        width,
        height,
        ground_y,
        seed: config.seed,
        trunk,
        branches,
        canopy,
    }
}
