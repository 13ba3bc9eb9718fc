use crate::color::ColorMap;
use crate::config::VizConfig;
use crate::error::ViewError;
use crate::hierarchy::Hierarchy;
use crate::interaction::{hit_test, Tooltip};
use crate::model::{Dataset, DatasetKind};
use crate::scene::{Canvas, Renderer};
use crate::treemap::{PositionedLeaf, TreemapLayout};

/// Owns the loaded datasets and everything currently on screen.
pub struct ViewController {
    datasets: [Dataset; 3],
    active: DatasetKind,
    renderer: Renderer,
    layout: TreemapLayout,
    canvas: Canvas,
    tooltip: Tooltip,
    leaves: Vec<PositionedLeaf>,
    colors: ColorMap,
}

impl ViewController {
    /// Takes datasets in load order and shows the first one.
    pub fn new(datasets: [Dataset; 3], config: &VizConfig) -> Result<Self, ViewError> {
        let render = config.render.clone();
        let layout = TreemapLayout::new(render.width, render.height).padding(render.padding);
        let mut view = Self {
            canvas: Canvas::new(render.width, render.canvas_height()),
            renderer: Renderer::new(render),
            layout,
            tooltip: Tooltip::new(config.tooltip.clone()),
            active: DatasetKind::Video,
            datasets,
            leaves: Vec::new(),
            colors: ColorMap::default(),
        };
        view.select(DatasetKind::Video)?;
        Ok(view)
    }

    pub fn active(&self) -> DatasetKind {
        self.active
    }

    pub fn dataset(&self, kind: DatasetKind) -> &Dataset {
        &self.datasets[kind.slot()]
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn leaves(&self) -> &[PositionedLeaf] {
        &self.leaves
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn render_config(&self) -> &crate::scene::RenderConfig {
        &self.renderer.config
    }

    /// Rebuilds and redraws everything for `kind`.
    ///
    /// On error the previous view stays on screen untouched.
    pub fn select(&mut self, kind: DatasetKind) -> Result<(), ViewError> {
        let dataset = &self.datasets[kind.slot()];
        let tree = Hierarchy::from_raw(&dataset.root);
        let total = tree.total();
        if total.is_nan() || total <= 0.0 {
            return Err(ViewError::EmptyDataset(kind.to_string()));
        }

        self.tooltip.reset();
        let leaves = self.layout.compute(&tree).leaves(&tree);
        let colors = ColorMap::from_categories(dataset.root.categories());
        self.renderer.render(
            &mut self.canvas,
            &leaves,
            &colors,
            dataset.title(),
            dataset.description(),
        );
        self.leaves = leaves;
        self.colors = colors;
        self.active = kind;
        tracing::info!(
            dataset = %kind,
            tiles = self.leaves.len(),
            categories = self.colors.len(),
            "selected dataset"
        );
        Ok(())
    }

    /// Routes a pointer position in canvas coordinates; outside every tile counts as leaving.
    pub fn pointer_move(&mut self, x: f64, y: f64, now: f64) {
        match hit_test(&self.leaves, x, y) {
            Some(leaf) => self.tooltip.pointer_move(leaf, (x, y), now),
            None => self.tooltip.pointer_leave(now),
        }
    }

    pub fn pointer_leave(&mut self, now: f64) {
        self.tooltip.pointer_leave(now);
    }
}
