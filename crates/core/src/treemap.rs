use crate::hierarchy::Hierarchy;
use crate::model::{NodeId, RawValue};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Half-open on the far edges so adjacent tiles never both claim a point.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

/// A drawn leaf: hierarchy attributes plus its rectangle in canvas coordinates.
#[derive(Clone, Debug, Serialize)]
pub struct PositionedLeaf {
    /// Position in leaf order; stable key for clip paths and hover state.
    pub index: usize,
    #[serde(skip)]
    pub id: NodeId,
    pub name: String,
    pub category: Option<String>,
    pub value: Option<RawValue>,
    pub aggregate_value: f64,
    pub rect: Rect,
}

impl PositionedLeaf {
    pub fn value_text(&self) -> String {
        self.value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// One rectangle per hierarchy node, indexed by [`NodeId`].
#[derive(Clone, Debug)]
pub struct Layout {
    pub rects: Vec<Rect>,
}

impl Layout {
    pub fn rect(&self, id: NodeId) -> Rect {
        self.rects[id.index()]
    }

    pub fn leaves(&self, tree: &Hierarchy) -> Vec<PositionedLeaf> {
        tree.leaves()
            .into_iter()
            .enumerate()
            .map(|(index, id)| {
                let node = tree.get(id);
                PositionedLeaf {
                    index,
                    id,
                    name: node.name.clone(),
                    category: node.category.clone(),
                    value: node.value.clone(),
                    aggregate_value: node.aggregate_value,
                    rect: self.rect(id),
                }
            })
            .collect()
    }
}

/// Golden ratio, the default target aspect for squarified rows.
pub const PHI: f64 = 1.618_033_988_749_895;

#[derive(Clone, Copy, Debug)]
pub struct TreemapLayout {
    width: f64,
    height: f64,
    padding_inner: f64,
    padding_outer: f64,
    ratio: f64,
}

impl TreemapLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding_inner: 0.0,
            padding_outer: 0.0,
            ratio: PHI,
        }
    }

    /// Sets inner and outer padding together.
    pub fn padding(mut self, p: f64) -> Self {
        self.padding_inner = p.max(0.0);
        self.padding_outer = p.max(0.0);
        self
    }

    pub fn padding_inner(mut self, p: f64) -> Self {
        self.padding_inner = p.max(0.0);
        self
    }

    pub fn padding_outer(mut self, p: f64) -> Self {
        self.padding_outer = p.max(0.0);
        self
    }

    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = if ratio > 1.0 { ratio } else { 1.0 };
        self
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn compute(&self, tree: &Hierarchy) -> Layout {
        let mut rects = vec![Rect::default(); tree.len()];
        if tree.is_empty() {
            return Layout { rects };
        }
        rects[tree.root.index()] = Rect::new(0.0, 0.0, self.width, self.height);

        // padding applied to a node comes from its parent's depth
        let mut padding_stack: Vec<f64> = vec![0.0];
        for id in tree.each_before() {
            self.position_node(tree, id, &mut rects, &mut padding_stack);
        }
        tracing::debug!(nodes = rects.len(), "computed treemap layout");
        Layout { rects }
    }

    fn position_node(
        &self,
        tree: &Hierarchy,
        id: NodeId,
        rects: &mut [Rect],
        padding_stack: &mut Vec<f64>,
    ) {
        let node = tree.get(id);
        let depth = node.depth;
        if padding_stack.len() <= depth {
            padding_stack.resize(depth + 1, 0.0);
        }
        let p = padding_stack[depth];
        let r = rects[id.index()];
        let mut inner = collapse(Rect::new(r.x0 + p, r.y0 + p, r.x1 - p, r.y1 - p));
        rects[id.index()] = inner;

        if node.is_leaf() {
            return;
        }

        let half = self.padding_inner / 2.0;
        if padding_stack.len() <= depth + 1 {
            padding_stack.resize(depth + 2, 0.0);
        }
        padding_stack[depth + 1] = half;
        let inset = self.padding_outer - half;
        inner = collapse(Rect::new(
            inner.x0 + inset,
            inner.y0 + inset,
            inner.x1 - inset,
            inner.y1 - inset,
        ));
        squarify(tree, id, self.ratio, inner, rects);
    }
}

fn collapse(mut r: Rect) -> Rect {
    if r.x1 < r.x0 {
        let mid = (r.x0 + r.x1) / 2.0;
        r.x0 = mid;
        r.x1 = mid;
    }
    if r.y1 < r.y0 {
        let mid = (r.y0 + r.y1) / 2.0;
        r.y0 = mid;
        r.y1 = mid;
    }
    r
}

/// Bruls et al. squarified tiling with the aspect test scaled by `ratio`.
fn squarify(tree: &Hierarchy, parent: NodeId, ratio: f64, area: Rect, rects: &mut [Rect]) {
    let children = &tree.get(parent).children;
    let n = children.len();
    let value_of = |i: usize| tree.get(children[i]).aggregate_value;

    let (mut x0, mut y0, x1, y1) = (area.x0, area.y0, area.x1, area.y1);
    let mut value = tree.get(parent).aggregate_value;
    let mut i0 = 0usize;
    let mut i1 = 0usize;

    while i0 < n {
        let dx = x1 - x0;
        let dy = y1 - y0;

        // seed the row with the next non-empty node
        let mut sum_value;
        loop {
            sum_value = value_of(i1);
            i1 += 1;
            if sum_value != 0.0 || i1 >= n {
                break;
            }
        }
        let mut min_value = sum_value;
        let mut max_value = sum_value;
        let alpha = (dy / dx).max(dx / dy) / (value * ratio);
        let mut beta = sum_value * sum_value * alpha;
        let mut min_ratio = (max_value / beta).max(beta / min_value);

        // keep adding while the worst aspect ratio holds or improves
        while i1 < n {
            let node_value = value_of(i1);
            sum_value += node_value;
            min_value = min_value.min(node_value);
            max_value = max_value.max(node_value);
            beta = sum_value * sum_value * alpha;
            let new_ratio = (max_value / beta).max(beta / min_value);
            if new_ratio > min_ratio {
                sum_value -= node_value;
                break;
            }
            min_ratio = new_ratio;
            i1 += 1;
        }

        let row = &children[i0..i1];
        if dx < dy {
            let y2 = if value != 0.0 { y0 + dy * sum_value / value } else { y1 };
            dice(tree, row, sum_value, Rect::new(x0, y0, x1, y2), rects);
            y0 = y2;
        } else {
            let x2 = if value != 0.0 { x0 + dx * sum_value / value } else { x1 };
            slice(tree, row, sum_value, Rect::new(x0, y0, x2, y1), rects);
            x0 = x2;
        }
        value -= sum_value;
        i0 = i1;
    }
}

/// Lays a row out left to right.
fn dice(tree: &Hierarchy, row: &[NodeId], row_value: f64, area: Rect, rects: &mut [Rect]) {
    let k = if row_value != 0.0 { area.width() / row_value } else { 0.0 };
    let mut x = area.x0;
    for &id in row {
        let next = x + tree.get(id).aggregate_value * k;
        rects[id.index()] = Rect::new(x, area.y0, next, area.y1);
        x = next;
    }
}

/// Lays a row out top to bottom.
fn slice(tree: &Hierarchy, row: &[NodeId], row_value: f64, area: Rect, rects: &mut [Rect]) {
    let k = if row_value != 0.0 { area.height() / row_value } else { 0.0 };
    let mut y = area.y0;
    for &id in row {
        let next = y + tree.get(id).aggregate_value * k;
        rects[id.index()] = Rect::new(area.x0, y, area.x1, next);
        y = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawNode;
    use proptest::prelude::*;

    fn flat(values: &[f64]) -> Hierarchy {
        let leaves = values
            .iter()
            .enumerate()
            .map(|(i, v)| RawNode::leaf(format!("n{i}"), "c", *v))
            .collect();
        Hierarchy::from_raw(&RawNode::branch("root", leaves))
    }

    #[test]
    fn single_leaf_fills_padded_canvas() {
        let tree = flat(&[5.0]);
        let layout = TreemapLayout::new(900.0, 900.0).padding(1.0).compute(&tree);
        let leaves = layout.leaves(&tree);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].rect, Rect::new(1.0, 1.0, 899.0, 899.0));
    }

    #[test]
    fn unpadded_areas_match_weights() {
        let tree = flat(&[6.0, 6.0, 4.0, 3.0, 2.0, 2.0, 1.0]);
        let layout = TreemapLayout::new(600.0, 400.0).compute(&tree);
        let total: f64 = 24.0;
        for leaf in layout.leaves(&tree) {
            let expected = 600.0 * 400.0 * leaf.aggregate_value / total;
            assert!((leaf.rect.area() - expected).abs() < 1e-6, "{leaf:?}");
        }
    }

    #[test]
    fn zero_total_produces_empty_rects_without_nan() {
        let tree = flat(&[0.0, 0.0]);
        let layout = TreemapLayout::new(100.0, 100.0).padding(1.0).compute(&tree);
        for leaf in layout.leaves(&tree) {
            let r = leaf.rect;
            assert!(r.x0.is_finite() && r.x1.is_finite() && r.y0.is_finite() && r.y1.is_finite());
            assert_eq!(r.area(), 0.0);
        }
    }

    #[test]
    fn siblings_are_separated_by_inner_padding() {
        let tree = flat(&[1.0, 1.0]);
        let layout = TreemapLayout::new(200.0, 100.0).padding(1.0).compute(&tree);
        let leaves = layout.leaves(&tree);
        let gap = leaves[1].rect.x0 - leaves[0].rect.x1;
        assert!((gap - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_leaves_are_disjoint_and_non_degenerate(values in prop::collection::vec(10.0f64..100.0, 1..8)) {
            let tree = flat(&values);
            let leaves = TreemapLayout::new(900.0, 900.0).padding(1.0).compute(&tree).leaves(&tree);
            let container = Rect::new(0.0, 0.0, 900.0, 900.0);
            let mut area = 0.0;
            for (i, a) in leaves.iter().enumerate() {
                prop_assert!(a.rect.x1 > a.rect.x0 && a.rect.y1 > a.rect.y0);
                prop_assert!(container.intersection_area(&a.rect) >= a.rect.area() - 1e-6);
                area += a.rect.area();
                for b in &leaves[i + 1..] {
                    prop_assert!(a.rect.intersection_area(&b.rect) < 1e-6);
                }
            }
            prop_assert!(area <= container.area());
        }

        #[test]
        fn prop_area_grows_with_weight(values in prop::collection::vec(1.0f64..100.0, 2..12)) {
            let tree = flat(&values);
            let leaves = TreemapLayout::new(900.0, 600.0).compute(&tree).leaves(&tree);
            for a in &leaves {
                for b in &leaves {
                    if a.aggregate_value > b.aggregate_value {
                        prop_assert!(a.rect.area() >= b.rect.area() - 1e-6);
                    }
                }
            }
        }
    }
}
