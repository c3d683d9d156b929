//! spotmix Render Service (spotmix-render) - Main entry point
//!
//! Loads the bootstrap configuration, wires the ElevenLabs client and the
//! ffmpeg engine into the render pipeline, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use spotmix_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use spotmix_render::engine::{AudioEngine, FfmpegEngine};
use spotmix_render::render::API_KEY_ENV_VAR;
use spotmix_render::tts::{ElevenLabsClient, SpeechSynthesizer};
use spotmix_render::{build_router, AppState, SpotRenderer};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for spotmix-render
#[derive(Parser, Debug)]
#[command(name = "spotmix-render")]
#[command(about = "Renders branded audio spots from text")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "SPOTMIX_PORT")]
    port: Option<u16>,

    /// Background music file (overrides config)
    #[arg(long, env = "SPOTMIX_BGM")]
    bgm: Option<PathBuf>,

    /// Text-to-speech API key (overrides config)
    #[arg(long, env = API_KEY_ENV_VAR, hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let (mut config, config_source) = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing: RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "spotmix_render={0},spotmix_common={0},tower_http={0}",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting spotmix-render v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    // Loading ran before the subscriber existed, so report the outcome now
    config_source.log();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bgm) = args.bgm {
        config.assets.background_music = bgm;
    }
    if let Some(api_key) = args.api_key {
        config.tts.api_key = Some(api_key);
    }

    config.validate().context("Invalid configuration")?;

    if !config.assets.background_music.exists() {
        warn!(
            "Background music {} not found; renders will fail until it exists",
            config.assets.background_music.display()
        );
    }

    let synthesizer: Option<Arc<dyn SpeechSynthesizer>> =
        match config.tts.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
            Some(key) => {
                let client: Arc<dyn SpeechSynthesizer> = Arc::new(
                    ElevenLabsClient::new(key.to_string(), &config.tts)
                        .context("Failed to create TTS client")?,
                );
                Some(client)
            }
            None => {
                warn!("{} not set; renders will fail until it is configured", API_KEY_ENV_VAR);
                None
            }
        };

    let engine: Arc<dyn AudioEngine> =
        Arc::new(FfmpegEngine::new(&config.engine, config.output.clone()));

    let renderer = SpotRenderer::new(synthesizer, engine, &config);
    let state = AppState::new(renderer, config.output.clone());
    let app = build_router(state);

    let addr = SocketAddr::new(config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("spotmix-render listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
