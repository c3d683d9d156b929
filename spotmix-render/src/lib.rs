//! # spotmix Render Service (spotmix-render)
//!
//! Turns a line of text into a short branded audio spot: synthesized voice
//! over a looping music bed, ducked while the voice speaks, faded at the end.
//!
//! **Architecture:** TTS provider and audio engine sit behind the
//! [`tts::SpeechSynthesizer`] and [`engine::AudioEngine`] traits; timeline
//! planning and mix graph construction come from `spotmix-common`.

use std::sync::Arc;

use axum::Router;
use spotmix_common::config::OutputConfig;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod engine;
pub mod error;
pub mod render;
pub mod tts;
pub mod voice;

pub use error::{RenderError, Result};
pub use render::{RenderRequest, RenderedSpot, SpotRenderer};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<SpotRenderer>,
    /// Encoding of rendered spots, for response headers
    pub output: OutputConfig,
}

impl AppState {
    pub fn new(renderer: SpotRenderer, output: OutputConfig) -> Self {
        Self {
            renderer: Arc::new(renderer),
            output,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/render", post(api::render_spot))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
