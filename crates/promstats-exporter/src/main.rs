//! promstats exporter
//!
//! - Strict YAML config (`PROMSTATS_CONFIG`, default `promstats.yaml`)
//! - `/metrics` scrape endpoint backed by the in-process metric store
//! - Background retention task evicting series past `metric_timeout_ms`
//! - Graceful shutdown on Ctrl-C (readiness flips to draining first)

use std::net::SocketAddr;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use promstats_exporter::{app_state, config, obs, router};

const CONFIG_ENV: &str = "PROMSTATS_CONFIG";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "promstats.yaml".to_string());
    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%path, code = e.code().as_str(), error = %e, "config load failed");
            std::process::exit(2);
        }
    };
    // validated by config::load_from_file
    let listen: SocketAddr = cfg
        .exporter
        .listen
        .parse()
        .expect("exporter.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let retention = tokio::spawn(obs::retention::run_cleanup(
        state.prometheus(),
        state.cleanup_interval(),
        shutdown_rx,
    ));

    let app = router::build_router(state.clone());

    tracing::info!(%listen, "promstats-exporter starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    let draining = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested, draining");
            draining.set_draining();
        })
        .await
        .expect("server failed");

    let _ = shutdown_tx.send(true);
    let _ = retention.await;
    tracing::info!("promstats-exporter stopped");
}
