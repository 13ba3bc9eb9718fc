mod state;
mod ui;

use eframe::egui;
use state::AppState;
use treeviz_core::config::VizConfig;

struct TreevizApp {
    state: AppState,
}

impl TreevizApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: VizConfig) -> Self {
        let mut state = AppState::new(config);
        state.start_load();
        Self { state }
    }
}

impl eframe::App for TreevizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::draw(&mut self.state, ctx);
    }
}

fn main() -> anyhow::Result<()> {
    treeviz_core::logging::init();
    let config = match std::env::args_os().nth(1) {
        Some(path) => VizConfig::from_path(path)?,
        None => VizConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([960.0, 1000.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Treemap",
        options,
        Box::new(move |cc| Ok(Box::new(TreevizApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
