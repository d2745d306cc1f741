//! Scatter Host
//!
//! Development host for the embedded scatter visualizer: serves it inside a
//! frame and relays tabular frames to it over WebSocket and `postMessage`.

mod api;
mod config;
mod error;
mod lifecycle;
mod models;
mod storage;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use clap::Parser;
use scatter_embed::style::PlotStyle;
use scatter_embed::trace::TraceOptions;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::stream::BroadcastHub;
use crate::config::Config;
use crate::storage::FrameStore;

/// Application state shared across handlers
pub struct AppState {
    pub store: FrameStore,
    pub broadcast_hub: BroadcastHub,
    pub config: Config,
    pub style: Option<PlotStyle>,
    pub trace_options: TraceOptions,
}

impl AppState {
    pub fn new(config: Config, style: Option<PlotStyle>) -> Self {
        Self {
            store: FrameStore::new(),
            broadcast_hub: BroadcastHub::new(),
            trace_options: config.trace_options(),
            config,
            style,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.max_body_bytes;
    let static_dir = state.config.static_dir.clone();
    let pkg_dir = state.config.pkg_dir.clone();

    Router::new()
        // Pages
        .route("/", get(api::portal::index))
        .route("/view", get(api::portal::view))
        // API routes
        .nest("/api/v1", api::frames::router())
        // WebSocket route
        .route("/ws/v1/streams/{name}", get(api::stream::ws_handler))
        // Static files
        .nest_service("/static", ServeDir::new(static_dir))
        .nest_service("/pkg", ServeDir::new(pkg_dir))
        // Middleware
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scatter_host=debug,scatter_embed=debug,tower_http=debug".into()),
        )
        .init();

    // Parse CLI args
    let config = Config::parse();
    info!("Starting scatter-host on {}:{}", config.host, config.port);

    let style = config.load_style()?;
    if style.is_some() {
        info!("Applying plot style to every redraw");
    }

    let state = Arc::new(AppState::new(config.clone(), style));

    // Start lifecycle cleanup task
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        lifecycle::cleanup_task(cleanup_state).await;
    });

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
