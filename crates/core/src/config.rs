use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::interaction::TooltipConfig;
use crate::model::DatasetKind;
use crate::scene::RenderConfig;

/// Where each dataset is read from: an http(s) URL, a `file://` URL or a plain path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub video: String,
    pub movies: String,
    pub kickstarter: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            video: DatasetKind::Video.default_url().into(),
            movies: DatasetKind::Movies.default_url().into(),
            kickstarter: DatasetKind::Kickstarter.default_url().into(),
        }
    }
}

impl SourcesConfig {
    pub fn get(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Video => &self.video,
            DatasetKind::Movies => &self.movies,
            DatasetKind::Kickstarter => &self.kickstarter,
        }
    }

    pub fn set(&mut self, kind: DatasetKind, source: impl Into<String>) {
        let slot = match kind {
            DatasetKind::Video => &mut self.video,
            DatasetKind::Movies => &mut self.movies,
            DatasetKind::Kickstarter => &mut self.kickstarter,
        };
        *slot = source.into();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub render: RenderConfig,
    pub tooltip: TooltipConfig,
    pub sources: SourcesConfig,
}

impl VizConfig {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_json(&text, path)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(cfg)
    }
}
