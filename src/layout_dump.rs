use crate::classify::Severity;
use crate::layout::{Point, TreeLayout};
use crate::ratio::ColorRatio;
use crate::tree::ComplexityTree;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub style: String,
    pub width: f32,
    pub height: f32,
    pub seed: u64,
    pub ratio: ColorRatio,
    pub severity_counts: SeverityCounts,
    pub trunk: TrunkDump,
    pub branches: Vec<BranchDump>,
    pub canopy_leaves: usize,
}

#[derive(Debug, Serialize)]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

#[derive(Debug, Serialize)]
pub struct TrunkDump {
    pub label: String,
    pub base: [f32; 2],
    pub top: [f32; 2],
    pub base_width: f32,
    pub top_width: f32,
}

#[derive(Debug, Serialize)]
pub struct BranchDump {
    pub group: String,
    pub complexity: u64,
    pub severity: Severity,
    pub mean: Option<f64>,
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub angle: f32,
    pub thickness: f32,
    pub leaves: Vec<LeafDump>,
}

#[derive(Debug, Serialize)]
pub struct LeafDump {
    pub function: String,
    pub complexity: u64,
    pub severity: Severity,
    pub at: [f32; 2],
    pub scale: f32,
    pub rotation: f32,
}

fn xy(point: Point) -> [f32; 2] {
    [point.x, point.y]
}

impl LayoutDump {
    pub fn from_layout(layout: &TreeLayout, tree: &ComplexityTree, ratio: &ColorRatio) -> Self {
        let [low, medium, high, critical] = tree.severity_counts();

        // Branches are emitted in group order, so stats line up by index.
        let branches = layout
            .branches
            .iter()
            .zip(tree.groups())
            .map(|(branch, group)| BranchDump {
                group: branch.name.clone(),
                complexity: branch.complexity,
                severity: branch.severity,
                mean: group.stats.map(|stats| stats.mean),
                start: xy(branch.start),
                end: xy(branch.end),
                angle: branch.angle,
                thickness: branch.thickness,
                leaves: branch
                    .leaves
                    .iter()
                    .map(|leaf| LeafDump {
                        function: leaf.name.clone(),
                        complexity: leaf.complexity,
                        severity: leaf.severity,
                        at: xy(leaf.anchor),
                        scale: leaf.scale,
                        rotation: leaf.rotation,
                    })
                    .collect(),
            })
            .collect();

        LayoutDump {
            style: format!("{:?}", layout.style).to_lowercase(),
            width: layout.width,
            height: layout.height,
            seed: layout.seed,
            ratio: *ratio,
            severity_counts: SeverityCounts {
                low,
                medium,
                high,
                critical,
            },
            trunk: TrunkDump {
                label: layout.trunk.label.clone(),
                base: xy(layout.trunk.base),
                top: xy(layout.trunk.top()),
                base_width: layout.trunk.base_width,
                top_width: layout.trunk.top_width,
            },
            branches,
            canopy_leaves: layout.canopy.len(),
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &TreeLayout,
    tree: &ComplexityTree,
    ratio: &ColorRatio,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, tree, ratio);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use crate::config::LayoutConfig;
    use crate::ir::FunctionRecord;
    use crate::layout::compute_layout;
    use crate::tree::{GroupBy, build_tree};

    #[test]
    fn dump_mirrors_layout() {
        let records = vec![
            FunctionRecord::new("a", "x.go", 2),
            FunctionRecord::new("b", "x.go", 16),
            FunctionRecord::new("c", "y.go", 30),
        ];
        let tree = build_tree(&records, &Thresholds::default(), GroupBy::File);
        let ratio = ColorRatio::from_tree(&tree);
        let layout = compute_layout(&tree, &ratio, &LayoutConfig::default()).unwrap();
        let dump = LayoutDump::from_layout(&layout, &tree, &ratio);

        assert_eq!(dump.style, "organic");
        assert_eq!(dump.branches.len(), 2);
        assert_eq!(dump.branches[0].leaves.len(), 2);
        assert_eq!(dump.branches[0].mean, Some(9.0));
        assert_eq!(dump.severity_counts.critical, 1);

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["branches"][1]["leaves"][0]["function"], "c");
        assert_eq!(json["branches"][1]["severity"], "critical");
    }
}
