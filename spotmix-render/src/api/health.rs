//! Health check endpoint
//!
//! The process answering means it is up. The readiness fields say whether a
//! render could succeed right now: a missing credential or music bed does not
//! stop the service, but every render fails with a configuration error.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// A TTS credential is configured
    pub tts_configured: bool,
    /// The music bed file exists
    pub background_music_present: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let renderer = &state.renderer;
    let background_music_present = tokio::fs::try_exists(renderer.background_music())
        .await
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "spotmix-render".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tts_configured: renderer.has_synthesizer(),
        background_music_present,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
