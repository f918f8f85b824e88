use std::sync::Arc;

use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use request_profiler::profiler::{CaptureLayer, Profiler};
use request_profiler::{config, mock_data, server, store::UserStore, AppState};

#[tokio::main]
async fn main() {
    let cfg = match config::load_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config load failed: {e}");
            std::process::exit(1);
        }
    };

    // ── 1. Logging: console + toolbar capture ───────────────────
    let capture_level = tracing::Level::from(cfg.profiler.capture_level);
    tracing_subscriber::registry()
        .with(
            fmt::layer().with_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy(),
            ),
        )
        .with(CaptureLayer::new().with_filter(LevelFilter::from_level(capture_level)))
        .init();

    // ── 2. Seed the demo directory ──────────────────────────────
    let store = Arc::new(UserStore::new());
    mock_data::seed(&store);

    // ── 3. Build shared state ───────────────────────────────────
    let state = Arc::new(AppState {
        store,
        profiler: Arc::new(Profiler::new(&cfg.profiler)),
    });

    // ── 4. Build Axum router ────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ─────────────────────────────────────────
    let listen = match cfg.server.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%listen, error = %e, "bind failed");
            std::process::exit(1);
        }
    };

    tracing::info!(
        %listen,
        enabled = cfg.profiler.enabled,
        dialect = %cfg.profiler.dialect,
        "request-profiler demo starting"
    );

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
