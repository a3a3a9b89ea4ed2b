use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{Severity, Thresholds};
use crate::ir::{FunctionRecord, SourceLocation};

pub const UNKNOWN_GROUP: &str = "unknown";
pub const ROOT_PACKAGE_GROUP: &str = "main";
const ROOT_NAME: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    FileGroup,
    Function,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::FileGroup => "file",
            NodeKind::Function => "function",
        }
    }
}

/// How records are grouped into branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    File,
    /// Parent directory of the file; files without one group under `main`.
    Package,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupStats {
    pub count: usize,
    /// Exact sum of the member complexities; wide enough for any `u32` input.
    pub total: u64,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

impl GroupStats {
    fn from_complexities(values: &[u32]) -> Self {
        let total: u64 = values.iter().map(|v| u64::from(*v)).sum();
        let count = values.len();
        let mean = if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        };
        Self {
            count,
            total,
            mean,
            min: values.iter().copied().min().unwrap_or(0),
            max: values.iter().copied().max().unwrap_or(0),
        }
    }

    /// Mean truncated toward zero, the score used to classify the whole group.
    pub fn classification_score(&self) -> u32 {
        self.mean.trunc() as u32
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub kind: NodeKind,
    pub complexity: u64,
    pub severity: Severity,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub location: Option<SourceLocation>,
    pub stats: Option<GroupStats>,
}

/// Arena-backed three-level tree. The root is always node 0.
#[derive(Debug, Clone)]
pub struct ComplexityTree {
    nodes: Vec<TreeNode>,
}

impl ComplexityTree {
    fn with_root(thresholds: &Thresholds) -> Self {
        let severity = thresholds.level(0);
        Self {
            nodes: vec![TreeNode {
                name: ROOT_NAME.to_string(),
                kind: NodeKind::Root,
                complexity: 0,
                severity,
                children: Vec::new(),
                parent: None,
                location: None,
                stats: None,
            }],
        }
    }

    fn push(&mut self, parent: NodeId, mut node: TreeNode) -> NodeId {
        let parent_kind = self.nodes[parent.0].kind;
        assert!(
            parent_kind != NodeKind::Function,
            "function node {:?} cannot own children",
            self.nodes[parent.0].name
        );
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append a FileGroup under the root, classified by the truncated mean
    /// of `complexities`. Function children are pushed separately.
    pub(crate) fn push_group(
        &mut self,
        name: String,
        complexities: &[u32],
        thresholds: &Thresholds,
    ) -> NodeId {
        let stats = GroupStats::from_complexities(complexities);
        let severity = thresholds.level(stats.classification_score());
        self.push(
            self.root_id(),
            TreeNode {
                name,
                kind: NodeKind::FileGroup,
                complexity: stats.total,
                severity,
                children: Vec::new(),
                parent: None,
                location: None,
                stats: Some(stats),
            },
        )
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes[id.0].parent.map(|parent| self.node(parent))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes[id.0].children.iter().map(|child| self.node(*child))
    }

    pub fn groups(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.children(self.root_id())
    }

    pub fn group_ids(&self) -> &[NodeId] {
        &self.nodes[0].children
    }

    pub fn functions(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes.iter().filter(|node| node.kind == NodeKind::Function)
    }

    pub fn group_count(&self) -> usize {
        self.nodes[0].children.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions().count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Function counts indexed by `Severity::index()`.
    pub fn severity_counts(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for function in self.functions() {
            counts[function.severity.index()] += 1;
        }
        counts
    }

    /// Indented outline of the tree, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_node(self.root_id(), 0, &mut out);
        out
    }

    fn outline_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} [{}]", node.name, node.kind.as_str()));
        if node.kind != NodeKind::Root {
            out.push_str(&format!(
                " {} (complexity: {})",
                node.severity, node.complexity
            ));
        }
        out.push('\n');
        for child in &node.children {
            self.outline_node(*child, depth + 1, out);
        }
    }

    /// Per-group statistics followed by one line per function with its
    /// source position.
    pub fn report(&self) -> String {
        let mut out = String::from("group statistics:\n");
        for group in self.groups() {
            if let Some(stats) = group.stats {
                out.push_str(&format!(
                    "  {}: avg={:.1}, max={}, min={}, total={} ({} functions)\n",
                    group.name, stats.mean, stats.max, stats.min, stats.total, stats.count
                ));
            }
        }
        out.push_str("function details:\n");
        for function in self.functions() {
            out.push_str(&format!(
                "  {} ({}): {}",
                function.name, function.severity, function.complexity
            ));
            if let Some(location) = &function.location {
                out.push_str(&format!(" - {}:{}", location.file, location.line));
            }
            out.push('\n');
        }
        out
    }
}

fn group_key(record: &FunctionRecord, group_by: GroupBy) -> String {
    let file = record.file.trim();
    if file.is_empty() {
        return UNKNOWN_GROUP.to_string();
    }
    match group_by {
        GroupBy::File => file.to_string(),
        GroupBy::Package => match Path::new(file).parent() {
            Some(dir) if !dir.as_os_str().is_empty() && dir != Path::new(".") => {
                dir.to_string_lossy().into_owned()
            }
            _ => ROOT_PACKAGE_GROUP.to_string(),
        },
    }
}

/// Build the root → group → function tree from a flat record list.
///
/// Groups appear in first-seen order and keep their records in input order, so
/// the same input always yields the same tree.
pub fn build_tree(
    records: &[FunctionRecord],
    thresholds: &Thresholds,
    group_by: GroupBy,
) -> ComplexityTree {
    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<&FunctionRecord>> = HashMap::new();
    for record in records {
        let key = group_key(record, group_by);
        if record.file.trim().is_empty() {
            warn!(function = %record.name, "record has no file identifier, grouping as unknown");
        }
        let entry = members.entry(key.clone()).or_default();
        if entry.is_empty() {
            order.push(key);
        }
        entry.push(record);
    }

    let mut tree = ComplexityTree::with_root(thresholds);
    for key in order {
        let group = &members[&key];
        let complexities: Vec<u32> = group.iter().map(|record| record.complexity).collect();
        let group_id = tree.push_group(key, &complexities, thresholds);
        for record in group {
            let severity = thresholds.level(record.complexity);
            tree.push(
                group_id,
                TreeNode {
                    name: record.name.clone(),
                    kind: NodeKind::Function,
                    complexity: u64::from(record.complexity),
                    severity,
                    children: Vec::new(),
                    parent: None,
                    location: Some(record.location()),
                    stats: None,
                },
            );
        }
    }

    debug!(
        groups = tree.group_count(),
        functions = tree.function_count(),
        "built complexity tree"
    );
    tree
}
