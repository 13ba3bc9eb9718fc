use crate::model::{NodeId, RawNode, RawValue};

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub category: Option<String>,
    pub value: Option<RawValue>,
    /// Own value plus the sum of every descendant.
    pub aggregate_value: f64,
    pub depth: usize,
    pub children: Vec<NodeId>,
}

impl HierarchyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Weighted tree built from a [`RawNode`], children sorted by descending weight.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub root: NodeId,
    pub nodes: Vec<HierarchyNode>,
}

impl Hierarchy {
    pub fn from_raw(raw: &RawNode) -> Self {
        let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(128);
        push_node(&mut nodes, raw, None, 0);
        let root = NodeId(0);
        sum(&mut nodes, root);
        sort_children(&mut nodes, root);
        tracing::debug!(
            nodes = nodes.len(),
            total = nodes[0].aggregate_value,
            "built hierarchy"
        );
        Hierarchy { root, nodes }
    }

    pub fn get(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.get(self.root).aggregate_value
    }

    /// Nodes in pre-order (parents before children, siblings in sorted order).
    pub fn each_before(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for &c in self.get(id).children.iter().rev() {
                stack.push(c);
            }
        }
        out
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.each_before()
            .into_iter()
            .filter(|id| self.get(*id).is_leaf())
            .collect()
    }
}

fn push_node(nodes: &mut Vec<HierarchyNode>, raw: &RawNode, parent: Option<NodeId>, depth: usize) {
    let id = NodeId(nodes.len() as u64);
    nodes.push(HierarchyNode {
        id,
        parent,
        name: raw.name.clone(),
        category: raw.category.clone(),
        value: raw.value.clone(),
        aggregate_value: 0.0,
        depth,
        children: Vec::new(),
    });
    if let Some(pid) = parent {
        nodes[pid.index()].children.push(id);
    }
    for child in raw.children() {
        push_node(nodes, child, Some(id), depth + 1);
    }
}

/// Leaves weigh their own value; internal nodes only the sum of their children.
fn sum(nodes: &mut [HierarchyNode], id: NodeId) -> f64 {
    let children = nodes[id.index()].children.clone();
    let total = if children.is_empty() {
        nodes[id.index()]
            .value
            .as_ref()
            .map(RawValue::as_f64)
            .unwrap_or(0.0)
    } else {
        children.into_iter().map(|c| sum(nodes, c)).sum()
    };
    nodes[id.index()].aggregate_value = total;
    total
}

fn sort_children(nodes: &mut [HierarchyNode], id: NodeId) {
    let mut children = std::mem::take(&mut nodes[id.index()].children);
    // sort_by is stable: equal weights keep input order
    children.sort_by(|a, b| {
        nodes[b.index()]
            .aggregate_value
            .partial_cmp(&nodes[a.index()].aggregate_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for &c in &children {
        sort_children(nodes, c);
    }
    nodes[id.index()].children = children;
}
