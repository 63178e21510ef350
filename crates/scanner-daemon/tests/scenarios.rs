use std::path::PathBuf;
use std::sync::Arc;

use scanner_core::{CompilationSettings, Library, MetadataOrder, MetadataSettings, MetadataSource, UserSettings};
use scanner_library::catalog::{CatalogClient, FileSelector};
use scanner_library::pipelines::{run_clean, run_refresh, run_scan, PipelineContext};
use scanner_library::tasks::TaskEngine;
use scanner_paths::ScannerPaths;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> UserSettings {
    UserSettings {
        compilations: CompilationSettings { artists: vec![], use_id3_comp_tag: false },
        track_regex: vec![r"(?P<Artist>[^/]+)/(?P<Album>[^/]+) \((?P<Year>\d{4})\)/(?P<Disc>\d)-(?P<Index>\d+) (?P<Track>.+)\.\w+$".into()],
        metadata: MetadataSettings { source: MetadataSource::Path, order: MetadataOrder::Only },
        use_embedded_thumbnails: false,
    }
}

fn context(base_url: &str, data_dir: PathBuf, settings: UserSettings) -> PipelineContext {
    let track_regex = settings.compiled_track_regex().unwrap();
    let paths = ScannerPaths { config_dir: data_dir.clone(), settings_file: data_dir.join("settings.json"), data_dir };
    PipelineContext {
        catalog: Arc::new(CatalogClient::new(base_url, "test-key")),
        paths: Arc::new(paths),
        settings: Arc::new(settings),
        track_regex: Arc::new(track_regex),
    }
}

fn new_engine() -> Arc<TaskEngine> {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    TaskEngine::new(tx)
}

fn library(id: i64, slug: &str, path: &str) -> Library {
    Library { id, name: slug.to_string(), slug: slug.to_string(), path: path.to_string() }
}

#[tokio::test]
async fn scan_registers_new_files_and_skips_unrecognized_ones() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    let album_dir = root.path().join("Artist").join("Album (2006)");
    std::fs::create_dir_all(&album_dir).unwrap();
    std::fs::write(album_dir.join("1-02 Song.m4a"), b"not really audio").unwrap();
    std::fs::write(root.path().join("notes.txt"), b"not media").unwrap();

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [], "metadata": { "next": null } })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "trackId": 1, "songId": null })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server.uri(), root.path().to_path_buf(), settings());
    let engine = new_engine();
    let lib = library(1, "a", "");

    run_scan(&ctx, &engine, &lib).await.unwrap();

    let (_, progress, _) = engine.current_tasks().await;
    assert_eq!(progress, 100);
}

#[tokio::test]
async fn refresh_skips_files_with_unchanged_checksum() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let file = root.path().join("track.m4a");
    std::fs::write(&file, b"audio bytes").unwrap();
    let checksum = scanner_core::checksum::compute(&file).unwrap();

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{ "id": 10, "path": "track.m4a", "checksum": checksum, "libraryId": 1 }],
            "metadata": { "next": null }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/libraries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{ "id": 1, "name": "a", "slug": "a", "path": "" }],
            "metadata": { "next": null }
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST")).and(path("/metadata")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;
    Mock::given(method("PUT")).and(path("/metadata")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

    let ctx = context(&server.uri(), root.path().to_path_buf(), settings());
    let engine = new_engine();

    run_refresh(&ctx, &engine, FileSelector { library: Some("a".to_string()), ..Default::default() }, false).await.unwrap();
}

#[tokio::test]
async fn clean_deletes_only_missing_files() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("x.m4a"), b"present").unwrap();

    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                { "id": 1, "path": "x.m4a", "checksum": "c1", "libraryId": 1 },
                { "id": 2, "path": "y.m4a", "checksum": "c2", "libraryId": 1 }
            ],
            "metadata": { "next": null }
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server.uri(), root.path().to_path_buf(), settings());
    let engine = new_engine();
    let lib = library(1, "a", "");

    run_clean(&ctx, &engine, &lib).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let delete_req = requests.iter().find(|r| r.method.as_str() == "DELETE").expect("expected a DELETE /files call");
    let body: serde_json::Value = serde_json::from_slice(&delete_req.body).unwrap();
    assert_eq!(body["ids"], serde_json::json!([2]));
}
