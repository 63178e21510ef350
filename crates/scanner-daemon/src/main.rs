use std::sync::Arc;
use std::time::Duration;

use scanner_core::UserSettings;
use scanner_daemon::{build_router, AppState};
use scanner_library::catalog::CatalogClient;
use scanner_library::pipelines::PipelineContext;
use scanner_library::tasks::TaskEngine;
use scanner_library::watcher::WatcherSupervisor;
use scanner_paths::ScannerPaths;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const HEALTHCHECK_ATTEMPTS: u32 = 5;
const HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(7);
const BIND_ADDR: &str = "0.0.0.0:8133";

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting scanner-daemon");

    if let Err(e) = run().await {
        error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let paths = ScannerPaths::resolve()?;
    let settings = UserSettings::from_file(&paths.settings_file)?;
    let track_regex = settings.compiled_track_regex()?;

    let api_url = std::env::var("API_URL").map_err(|_| scanner_core::ConfigError::MissingEnv("API_URL"))?;
    let api_key = first_api_key()?;
    let version = std::env::var("VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    let catalog = Arc::new(CatalogClient::new(api_url, api_key));
    healthcheck(&catalog).await?;

    let ctx = PipelineContext { catalog: Arc::clone(&catalog), paths: Arc::new(paths), settings: Arc::new(settings), track_regex: Arc::new(track_regex) };

    let (thumbnail_tx, mut thumbnail_rx) = tokio::sync::mpsc::unbounded_channel();
    let engine = TaskEngine::new(thumbnail_tx);

    let shutdown = CancellationToken::new();

    let engine_loop = tokio::spawn({
        let engine = Arc::clone(&engine);
        let shutdown = shutdown.clone();
        async move { engine.run(shutdown).await }
    });

    let thumbnail_loop = tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move {
            while let Some(job) = thumbnail_rx.recv().await {
                if let Err(e) = scanner_library::illustration::process_thumbnail_job(&catalog, job).await {
                    error!(error = %e, "thumbnail upload failed");
                }
            }
        }
    });

    let (supervisor, event_rx) = WatcherSupervisor::new(ctx.clone(), Arc::clone(&engine));
    let watcher_loop = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        let shutdown = shutdown.clone();
        async move { supervisor.run(event_rx, shutdown).await }
    });

    let state = AppState { ctx, engine: Arc::clone(&engine), version };
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;
    info!(addr = BIND_ADDR, "listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    engine_loop.await.ok();
    watcher_loop.await.ok();
    thumbnail_loop.abort();

    Ok(())
}

fn first_api_key() -> Result<String, scanner_core::ConfigError> {
    if let Ok(keys) = std::env::var("API_KEYS") {
        if let Some(first) = keys.split(',').next().filter(|k| !k.is_empty()) {
            return Ok(first.to_string());
        }
    }
    std::env::var("API_KEY").map_err(|_| scanner_core::ConfigError::MissingEnv("API_KEY"))
}

async fn healthcheck(catalog: &CatalogClient) -> anyhow::Result<()> {
    for attempt in 1..=HEALTHCHECK_ATTEMPTS {
        match catalog.health_check().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                error!(attempt, error = %e, "catalog healthcheck failed");
                if attempt < HEALTHCHECK_ATTEMPTS {
                    tokio::time::sleep(HEALTHCHECK_INTERVAL).await;
                }
            }
        }
    }
    anyhow::bail!("catalog unreachable after {HEALTHCHECK_ATTEMPTS} attempts")
}
