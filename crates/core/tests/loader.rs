use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;

use treeviz_core::config::SourcesConfig;
use treeviz_core::error::LoadError;
use treeviz_core::loader::{load_blocking, spawn_load, LoadMsg, Loader};
use treeviz_core::model::DatasetKind;

const VIDEO: &str = r#"{"name":"Video Game Sales Data Top 100","children":[
  {"name":"Wii","children":[
    {"name":"Wii Sports","category":"Wii","value":"82.53"},
    {"name":"Mario Kart Wii","category":"Wii","value":"35.52"}]},
  {"name":"NES","children":[
    {"name":"Super Mario Bros.","category":"NES","value":"40.24"}]}]}"#;

const MOVIES: &str = r#"{"name":"Movies","children":[
  {"name":"Action","children":[{"name":"Avatar","category":"Action","value":"760505847"}]}]}"#;

const KICKSTARTER: &str = r#"{"name":"Kickstarter","children":[
  {"name":"Product Design","children":[{"name":"Pebble Time","category":"Product Design","value":"20338986.27"}]}]}"#;

fn fixture(dir: &str, name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("treeviz-{dir}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn sources(dir: &str, movies_body: &str) -> SourcesConfig {
    let mut sources = SourcesConfig::default();
    sources.set(
        DatasetKind::Video,
        fixture(dir, "video.json", VIDEO).display().to_string(),
    );
    sources.set(
        DatasetKind::Movies,
        fixture(dir, "movies.json", movies_body).display().to_string(),
    );
    sources.set(
        DatasetKind::Kickstarter,
        fixture(dir, "kickstarter.json", KICKSTARTER).display().to_string(),
    );
    sources
}

#[tokio::test]
async fn loads_all_three_in_request_order() {
    let sources = sources("ok", MOVIES);
    let [video, movies, kickstarter] = Loader::new().load_all(&sources).await.unwrap();
    assert_eq!(video.kind, DatasetKind::Video);
    assert_eq!(video.root.children().len(), 2);
    assert_eq!(movies.root.categories(), vec!["Action".to_string()]);
    assert_eq!(kickstarter.title(), "Kickstarter Pledges");
}

#[tokio::test]
async fn one_bad_document_fails_the_whole_load() {
    let sources = sources("bad-json", "{ not json");
    let err = Loader::new().load_all(&sources).await.unwrap_err();
    assert!(matches!(err, LoadError::Parse { .. }), "{err}");
}

#[test]
fn missing_file_fails_blocking_load() {
    let mut sources = sources("missing", MOVIES);
    sources.set(DatasetKind::Kickstarter, "/definitely/not/here/kickstarter.json");
    let err = load_blocking(&sources).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "{err}");
}

#[test]
fn background_load_reports_over_channel() {
    let (tx, rx) = crossbeam_channel::unbounded();
    spawn_load(sources("channel", MOVIES), tx);
    match rx.recv().unwrap() {
        LoadMsg::Done(datasets) => assert_eq!(datasets[1].kind, DatasetKind::Movies),
        LoadMsg::Error(e) => panic!("load failed: {e}"),
    }
}

/// Answers every request on a local port with `status_line` and an empty body.
fn serve_status(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let _ = write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            );
        }
    });
    format!("http://{addr}/video.json")
}

fn direct_loader() -> Loader {
    Loader::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

#[tokio::test]
async fn non_success_status_fails_the_whole_load() {
    let mut sources = sources("status", MOVIES);
    sources.set(DatasetKind::Video, serve_status("404 Not Found"));
    let err = direct_loader().load_all(&sources).await.unwrap_err();
    match err {
        LoadError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
        other => panic!("expected a status error, got {other}"),
    }
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut sources = sources("refused", MOVIES);
    sources.set(DatasetKind::Video, format!("http://127.0.0.1:{port}/video.json"));
    let err = direct_loader().load_all(&sources).await.unwrap_err();
    assert!(matches!(err, LoadError::Http { .. }), "{err}");
}
