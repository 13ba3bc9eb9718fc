use crossbeam_channel::Sender;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::config::SourcesConfig;
use crate::error::LoadError;
use crate::model::{Dataset, DatasetKind, RawNode};

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    Remote(Url),
    Local(PathBuf),
}

impl DatasetSource {
    /// `http`/`https` URLs are fetched, `file` URLs and bare paths are read from disk.
    pub fn parse(s: &str) -> Result<Self, LoadError> {
        match Url::parse(s) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(DatasetSource::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(DatasetSource::Local)
                    .map_err(|()| LoadError::UnsupportedSource(s.to_string())),
                // a drive letter parses as a one-letter scheme
                scheme if scheme.len() == 1 => Ok(DatasetSource::Local(PathBuf::from(s))),
                _ => Err(LoadError::UnsupportedSource(s.to_string())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(DatasetSource::Local(PathBuf::from(s)))
            }
            Err(_) => Err(LoadError::UnsupportedSource(s.to_string())),
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Remote(url) => write!(f, "{url}"),
            DatasetSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn parse_dataset(bytes: &[u8], origin: &str) -> Result<RawNode, LoadError> {
    serde_json::from_slice(bytes).map_err(|source| LoadError::Parse {
        origin: origin.to_string(),
        source,
    })
}

pub struct Loader {
    client: reqwest::Client,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("treeviz/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, source: &DatasetSource) -> Result<RawNode, LoadError> {
        match source {
            DatasetSource::Remote(url) => {
                let http = |source| LoadError::Http {
                    url: url.to_string(),
                    source,
                };
                let response = self.client.get(url.clone()).send().await.map_err(http)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::Status {
                        url: url.to_string(),
                        status,
                    });
                }
                let body = response.bytes().await.map_err(http)?;
                tracing::debug!(%url, bytes = body.len(), "fetched dataset");
                parse_dataset(&body, url.as_str())
            }
            DatasetSource::Local(path) => {
                let body = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), bytes = body.len(), "read dataset");
                parse_dataset(&body, &path.display().to_string())
            }
        }
    }

    /// Fetches all three datasets concurrently; any failure fails the whole load.
    pub async fn load_all(&self, sources: &SourcesConfig) -> Result<[Dataset; 3], LoadError> {
        let video = DatasetSource::parse(sources.get(DatasetKind::Video))?;
        let movies = DatasetSource::parse(sources.get(DatasetKind::Movies))?;
        let kickstarter = DatasetSource::parse(sources.get(DatasetKind::Kickstarter))?;

        let (video, movies, kickstarter) = futures::try_join!(
            self.fetch(&video),
            self.fetch(&movies),
            self.fetch(&kickstarter)
        )?;
        tracing::info!("loaded all datasets");
        Ok([
            Dataset::new(DatasetKind::Video, video),
            Dataset::new(DatasetKind::Movies, movies),
            Dataset::new(DatasetKind::Kickstarter, kickstarter),
        ])
    }
}

/// Runs [`Loader::load_all`] on a single-threaded runtime.
pub fn load_blocking(sources: &SourcesConfig) -> Result<[Dataset; 3], LoadError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(LoadError::Runtime)?;
    runtime.block_on(Loader::new().load_all(sources))
}

#[derive(Debug)]
pub enum LoadMsg {
    Done(Box<[Dataset; 3]>),
    Error(LoadError),
}

/// Loads on a background thread and reports once over `tx`.
pub fn spawn_load(sources: SourcesConfig, tx: Sender<LoadMsg>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let msg = match load_blocking(&sources) {
            Ok(datasets) => LoadMsg::Done(Box::new(datasets)),
            Err(e) => {
                tracing::error!(error = %e, "dataset load failed");
                LoadMsg::Error(e)
            }
        };
        let _ = tx.send(msg);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_by_scheme() {
        assert!(matches!(
            DatasetSource::parse("https://example.com/a.json").unwrap(),
            DatasetSource::Remote(_)
        ));
        assert_eq!(
            DatasetSource::parse("data/video.json").unwrap(),
            DatasetSource::Local(PathBuf::from("data/video.json"))
        );
        assert!(matches!(
            DatasetSource::parse("ftp://example.com/a.json"),
            Err(LoadError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_dataset(b"{\"name\": ", "inline").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("inline"));
    }
}
