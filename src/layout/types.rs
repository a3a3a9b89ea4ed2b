use serde::Serialize;

use crate::classify::Severity;
use crate::config::LayoutStyle;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchSide {
    Left,
    Right,
}

/// Tapered trunk standing on `base` (bottom center) and growing upward.
#[derive(Debug, Clone, Serialize)]
pub struct TrunkGeometry {
    pub base: Point,
    pub height: f32,
    pub base_width: f32,
    pub top_width: f32,
    pub label: String,
}

impl TrunkGeometry {
    pub fn top(&self) -> Point {
        Point::new(self.base.x, self.base.y - self.height)
    }

    /// Trunk width at `t` of its height (0 = base, 1 = top).
    pub fn width_at(&self, t: f32) -> f32 {
        self.base_width - (self.base_width - self.top_width) * t.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeafPlacement {
    pub anchor: Point,
    pub name: String,
    pub complexity: u64,
    pub severity: Severity,
    /// Glyph scale; below 1 when the cluster had to shrink to fit the canvas.
    pub scale: f32,
    /// Degrees of tilt about the anchor, 0 for an upright glyph.
    pub rotation: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchGeometry {
    pub name: String,
    pub start: Point,
    pub end: Point,
    /// Degrees, counterclockwise from the positive x axis (screen up is 90).
    pub angle: f32,
    pub length: f32,
    pub thickness: f32,
    /// Width of the group box drawn at `end` in the grid style, 0 otherwise.
    pub box_width: f32,
    pub side: BranchSide,
    pub complexity: u64,
    pub severity: Severity,
    pub leaves: Vec<LeafPlacement>,
}

/// Decorative crown foliage apportioned by the color ratio.
#[derive(Debug, Clone, Serialize)]
pub struct CanopyLeaf {
    pub center: Point,
    pub size: f32,
    pub rotation: f32,
    pub opacity: f32,
    pub severity: Severity,
    pub shade: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeLayout {
    pub style: LayoutStyle,
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub seed: u64,
    pub trunk: TrunkGeometry,
    pub branches: Vec<BranchGeometry>,
    pub canopy: Vec<CanopyLeaf>,
}

impl TreeLayout {
    pub fn leaves(&self) -> impl Iterator<Item = &LeafPlacement> + '_ {
        self.branches.iter().flat_map(|branch| branch.leaves.iter())
    }

    pub fn leaf_count(&self) -> usize {
        self.branches.iter().map(|branch| branch.leaves.len()).sum()
    }

    /// Every branch endpoint and leaf anchor, in drawing order.
    pub fn functional_points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for branch in &self.branches {
            points.push(branch.start);
            points.push(branch.end);
            points.extend(branch.leaves.iter().map(|leaf| leaf.anchor));
        }
        points
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x.is_finite()
            && point.y.is_finite()
            && (0.0..=self.width).contains(&point.x)
            && (0.0..=self.height).contains(&point.y)
    }
}
