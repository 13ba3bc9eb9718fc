//! Retained drawing surface and the treemap renderer that fills it.
//!
//! The canvas is a small element tree shaped like SVG so every drawn tile and legend
//! entry can be queried by tag, class or id, and serialized by [`crate::export::to_svg`].

use serde::{Deserialize, Serialize};

use crate::color::ColorMap;
use crate::treemap::PositionedLeaf;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    pub fn attr(mut self, key: &str, value: impl ToString) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        if let Some(tag) = &selector.tag {
            if self.tag != tag.as_str() {
                return false;
            }
        }
        if let Some(class) = &selector.class {
            if !self.has_class(class) {
                return false;
            }
        }
        if let Some(id) = &selector.id {
            if self.get("id") != Some(id.as_str()) {
                return false;
            }
        }
        true
    }

    fn collect<'a>(&'a self, selector: &Selector, out: &mut Vec<&'a Element>) {
        if self.matches(selector) {
            out.push(self);
        }
        for c in &self.children {
            c.collect(selector, out);
        }
    }

    /// Offset from a `translate(x, y)` transform, `(0, 0)` otherwise.
    pub fn translation(&self) -> (f64, f64) {
        let Some(t) = self.get("transform") else {
            return (0.0, 0.0);
        };
        let inner = t
            .trim()
            .strip_prefix("translate(")
            .and_then(|r| r.strip_suffix(')'));
        let Some(inner) = inner else {
            return (0.0, 0.0);
        };
        let mut parts = inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<f64>().unwrap_or(0.0));
        let x = parts.next().unwrap_or(0.0);
        let y = parts.next().unwrap_or(0.0);
        (x, y)
    }

    /// Numeric attribute, `default` when missing or unparseable.
    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(default)
    }

    /// This element plus all descendants.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Element::count).sum::<usize>()
    }
}

/// Simple selector: `tag`, `.class`, `#id`, `tag.class` or `tag#id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub tag: Option<String>,
    pub class: Option<String>,
    pub id: Option<String>,
}

impl Selector {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let split = s.find(['.', '#']).unwrap_or(s.len());
        let (tag, rest) = s.split_at(split);
        let mut sel = Selector {
            tag: (!tag.is_empty()).then(|| tag.to_string()),
            ..Default::default()
        };
        if let Some(class) = rest.strip_prefix('.') {
            sel.class = Some(class.to_string());
        } else if let Some(id) = rest.strip_prefix('#') {
            sel.id = Some(id.to_string());
        }
        sel
    }
}

#[derive(Debug, Clone, Default)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub description: String,
    pub children: Vec<Element>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn append(&mut self, el: Element) {
        self.children.push(el);
    }

    pub fn select_all(&self, selector: &str) -> Vec<&Element> {
        let selector = Selector::parse(selector);
        let mut out = Vec::new();
        for c in &self.children {
            c.collect(&selector, &mut out);
        }
        out
    }

    pub fn select(&self, selector: &str) -> Option<&Element> {
        self.select_all(selector).into_iter().next()
    }

    pub fn element_count(&self) -> usize {
        self.children.iter().map(Element::count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub x: f64,
    /// Space between the treemap's bottom edge and the first legend row.
    pub gap: f64,
    pub columns: usize,
    pub column_spacing: f64,
    pub row_spacing: f64,
    pub swatch: f64,
    pub label_dx: f64,
    pub label_dy: f64,
    pub font_size: String,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            x: 250.0,
            gap: 10.0,
            columns: 3,
            column_spacing: 150.0,
            row_spacing: 30.0,
            swatch: 20.0,
            label_dx: 25.0,
            label_dy: 12.0,
            font_size: "1rem".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    /// Extra canvas height below the treemap reserved for the legend.
    pub legend_height: f64,
    pub label_font_size: String,
    pub legend: LegendConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 900.0,
            padding: 1.0,
            legend_height: 300.0,
            label_font_size: "0.45rem".into(),
            legend: LegendConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn canvas_height(&self) -> f64 {
        self.height + self.legend_height
    }

    /// Top-left of legend entry `i`, relative to the legend group.
    pub fn legend_cell(&self, i: usize) -> (f64, f64) {
        let columns = self.legend.columns.max(1);
        (
            (i % columns) as f64 * self.legend.column_spacing,
            (i / columns) as f64 * self.legend.row_spacing,
        )
    }
}

pub fn clip_id(leaf: &PositionedLeaf) -> String {
    format!("clip-{}", leaf.index)
}

/// One label line per whitespace-separated word.
pub fn label_lines(name: &str) -> Vec<&str> {
    name.split_whitespace().collect()
}

pub(crate) fn num(v: f64) -> String {
    if !v.is_finite() || v == 0.0 {
        return "0".into();
    }
    format!("{v}")
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Replaces everything on `canvas` with tiles, labels and legend.
    pub fn render(
        &self,
        canvas: &mut Canvas,
        leaves: &[PositionedLeaf],
        colors: &ColorMap,
        title: &str,
        description: &str,
    ) {
        canvas.clear();
        canvas.width = self.config.width;
        canvas.height = self.config.canvas_height();
        canvas.title = title.to_string();
        canvas.description = description.to_string();

        for leaf in leaves {
            canvas.append(self.tile(leaf, colors));
        }
        canvas.append(self.legend(colors));
        tracing::debug!(
            tiles = leaves.len(),
            legend = colors.len(),
            elements = canvas.element_count(),
            "rendered canvas"
        );
    }

    fn tile(&self, leaf: &PositionedLeaf, colors: &ColorMap) -> Element {
        let r = leaf.rect;
        let clip = clip_id(leaf);
        let category = leaf.category.as_deref().unwrap_or_default();

        let rect = Element::new("rect")
            .attr("class", "tile")
            .attr("data-index", leaf.index)
            .attr("data-name", &leaf.name)
            .attr("data-category", category)
            .attr("data-value", leaf.value_text())
            .attr("fill", colors.for_category(leaf.category.as_deref()))
            .attr("width", num(r.width()))
            .attr("height", num(r.height()));

        let clip_path = Element::new("clipPath").attr("id", &clip).child(
            Element::new("rect")
                .attr("width", num(r.width()))
                .attr("height", num(r.height())),
        );

        let mut text = Element::new("text")
            .attr("x", 3)
            .attr("y", 3)
            .attr("clip-path", format!("url(#{clip})"));
        for word in label_lines(&leaf.name) {
            text.children.push(
                Element::new("tspan")
                    .attr("x", 5)
                    .attr("dy", "1em")
                    .attr("font-size", &self.config.label_font_size)
                    .with_text(word),
            );
        }

        Element::new("g")
            .attr("class", "cell")
            .attr("transform", format!("translate({}, {})", num(r.x0), num(r.y0)))
            .child(rect)
            .child(clip_path)
            .child(text)
    }

    fn legend(&self, colors: &ColorMap) -> Element {
        let cfg = &self.config.legend;
        let mut legend = Element::new("g").attr("id", "legend").attr(
            "transform",
            format!(
                "translate({}, {})",
                num(cfg.x),
                num(self.config.height + cfg.gap)
            ),
        );
        for (i, (name, color)) in colors.entries().enumerate() {
            let (x, y) = self.config.legend_cell(i);
            legend.children.push(
                Element::new("rect")
                    .attr("class", "legend-item")
                    .attr("data-category", name)
                    .attr("width", num(cfg.swatch))
                    .attr("height", num(cfg.swatch))
                    .attr("x", num(x))
                    .attr("y", num(y))
                    .attr("fill", color),
            );
        }
        for (i, (name, _)) in colors.entries().enumerate() {
            let (x, y) = self.config.legend_cell(i);
            legend.children.push(
                Element::new("text")
                    .attr("class", "legend-label")
                    .attr("x", num(x + cfg.label_dx))
                    .attr("y", num(y + cfg.label_dy))
                    .attr("font-size", &cfg.font_size)
                    .attr("alignment-baseline", "middle")
                    .with_text(name),
            );
        }
        legend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Hierarchy;
    use crate::model::RawNode;
    use crate::treemap::TreemapLayout;

    fn leaves_of(raw: &RawNode) -> Vec<PositionedLeaf> {
        let tree = Hierarchy::from_raw(raw);
        TreemapLayout::new(900.0, 900.0)
            .padding(1.0)
            .compute(&tree)
            .leaves(&tree)
    }

    #[test]
    fn selector_forms() {
        assert_eq!(
            Selector::parse("rect.tile"),
            Selector {
                tag: Some("rect".into()),
                class: Some("tile".into()),
                id: None
            }
        );
        assert_eq!(Selector::parse("#legend").id.as_deref(), Some("legend"));
        assert_eq!(Selector::parse(".legend-item").class.as_deref(), Some("legend-item"));
    }

    #[test]
    fn tiles_carry_data_attributes() {
        let raw = RawNode::branch(
            "Root",
            vec![RawNode::leaf("Wii Sports", "Wii", 82.53), RawNode::leaf("Tetris", "GB", 30.26)],
        );
        let leaves = leaves_of(&raw);
        let colors = ColorMap::from_categories(raw.categories());
        let mut canvas = Canvas::new(0.0, 0.0);
        Renderer::default().render(&mut canvas, &leaves, &colors, "T", "D");

        let tiles = canvas.select_all(".tile");
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].get("data-name"), Some("Wii Sports"));
        assert_eq!(tiles[0].get("data-category"), Some("Wii"));
        assert_eq!(tiles[0].get("data-value"), Some("82.53"));
        assert_eq!(tiles[0].get("fill"), Some("#1f77b4"));
        assert_eq!(canvas.height, 1200.0);
        assert_eq!(canvas.title, "T");

        let words: Vec<_> = canvas
            .select_all("tspan")
            .iter()
            .filter_map(|t| t.text.clone())
            .collect();
        assert_eq!(words, ["Wii", "Sports", "Tetris"]);
    }

    #[test]
    fn clip_ids_stay_unique_for_colliding_names() {
        let raw = RawNode::branch(
            "Root",
            vec![RawNode::leaf("a b", "x", 2.0), RawNode::leaf("a-b", "x", 1.0)],
        );
        let leaves = leaves_of(&raw);
        let mut canvas = Canvas::default();
        Renderer::default().render(
            &mut canvas,
            &leaves,
            &ColorMap::from_categories(raw.categories()),
            "",
            "",
        );
        let ids: Vec<_> = canvas
            .select_all("clipPath")
            .iter()
            .filter_map(|c| c.get("id"))
            .collect();
        assert_eq!(ids, ["clip-0", "clip-1"]);
        let texts = canvas.select_all("text");
        assert_eq!(texts[0].get("clip-path"), Some("url(#clip-0)"));
    }

    #[test]
    fn legend_uses_three_column_grid() {
        let colors = ColorMap::from_categories(["a", "b", "c", "d"]);
        let mut canvas = Canvas::default();
        Renderer::default().render(&mut canvas, &[], &colors, "", "");
        let items = canvas.select_all("rect.legend-item");
        assert_eq!(items.len(), 4);
        assert_eq!(items[2].get("x"), Some("300"));
        assert_eq!(items[3].get("x"), Some("0"));
        assert_eq!(items[3].get("y"), Some("30"));
        let legend = canvas.select("#legend").unwrap();
        assert_eq!(legend.get("transform"), Some("translate(250, 910)"));
        assert_eq!(legend.translation(), (250.0, 910.0));
        let labels = canvas.select_all("text.legend-label");
        assert_eq!(labels[3].get("x"), Some("25"));
        assert_eq!(labels[3].get("y"), Some("42"));
    }
}
