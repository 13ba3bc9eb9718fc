use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::Path;
use treeviz_core::config::VizConfig;
use treeviz_core::export;
use treeviz_core::loader::{spawn_load, LoadMsg};
use treeviz_core::search::matching_leaves;
use treeviz_core::{DatasetKind, ViewController};

pub struct AppState {
    pub config: VizConfig,
    pub load_rx: Option<Receiver<LoadMsg>>,
    pub view: Option<ViewController>,
    pub load_error: Option<String>,
    pub search: String,
    pub matches: Vec<usize>,
    pub status: Option<String>,
    pub open_after_export: bool,
}

impl AppState {
    pub fn new(config: VizConfig) -> Self {
        Self {
            config,
            load_rx: None,
            view: None,
            load_error: None,
            search: String::new(),
            matches: Vec::new(),
            status: None,
            open_after_export: false,
        }
    }

    pub fn start_load(&mut self) {
        self.view = None;
        self.load_error = None;
        self.matches.clear();
        let (tx, rx): (Sender<LoadMsg>, Receiver<LoadMsg>) = bounded(1);
        self.load_rx = Some(rx);
        spawn_load(self.config.sources.clone(), tx);
    }

    pub fn finish_load(&mut self, msg: LoadMsg) {
        match msg {
            LoadMsg::Done(datasets) => match ViewController::new(*datasets, &self.config) {
                Ok(view) => self.view = Some(view),
                Err(e) => self.load_error = Some(e.to_string()),
            },
            LoadMsg::Error(e) => self.load_error = Some(e.to_string()),
        }
    }

    pub fn select(&mut self, kind: DatasetKind) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        match view.select(kind) {
            Ok(()) => {
                self.status = None;
                self.refresh_matches();
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn refresh_matches(&mut self) {
        self.matches = match &self.view {
            Some(view) => matching_leaves(&self.search, view.leaves()),
            None => Vec::new(),
        };
    }

    pub fn export_svg(&mut self, path: &Path) -> anyhow::Result<()> {
        let Some(view) = &self.view else {
            anyhow::bail!("nothing to export yet");
        };
        std::fs::write(path, export::to_svg(view.canvas()))?;
        tracing::info!(path = %path.display(), "exported svg");
        self.status = Some(format!("Saved {}", path.display()));
        if self.open_after_export {
            open::that(path)?;
        }
        Ok(())
    }

    pub fn default_export_name(&self) -> String {
        let key = self
            .view
            .as_ref()
            .map(|v| v.active().key())
            .unwrap_or("treemap");
        format!("{key}-{}.svg", chrono::Local::now().format("%Y%m%d-%H%M%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treeviz_core::error::LoadError;

    #[test]
    fn failed_load_is_terminal() {
        let mut state = AppState::new(VizConfig::default());
        state.finish_load(LoadMsg::Error(LoadError::UnsupportedSource("ftp://x".into())));
        assert!(state.load_error.is_some());
        assert!(state.view.is_none());
        assert!(state.load_rx.is_none());

        // nothing left to interact with
        state.select(DatasetKind::Movies);
        state.search = "mario".into();
        state.refresh_matches();
        assert!(state.view.is_none());
        assert!(state.matches.is_empty());
    }
}
