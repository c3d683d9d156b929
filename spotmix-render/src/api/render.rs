//! Spot rendering endpoint

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::error::RenderError;
use crate::render::RenderRequest;
use crate::AppState;

/// Response header carrying the planned spot length in seconds
pub const SPOT_DURATION_HEADER: &str = "x-spot-duration";

/// POST /api/render
///
/// Body: `{ "text": string, "voiceId": string }`. Responds with the encoded
/// spot, or a plain-text error (400 for bad input, 500 otherwise).
///
/// The render runs on its own task so a client disconnect does not abandon
/// a running engine process halfway.
pub async fn render_spot(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("render", %request_id);

    let request = match RenderRequest::from_json(&body) {
        Ok(request) => request,
        Err(e) => {
            span.in_scope(|| warn!("Rejected render request: {}", e));
            return e.into_response();
        }
    };

    let renderer = state.renderer.clone();
    let task = tokio::spawn(
        async move {
            info!(
                voice_id = %request.voice_id,
                chars = request.text.chars().count(),
                "Render requested"
            );
            renderer.render(&request).await
        }
        .instrument(span.clone()),
    );

    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            span.in_scope(|| error!("Render task aborted: {}", e));
            return (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response();
        }
    };

    match result {
        Ok(spot) => {
            let output = &state.output;
            let disposition = format!("inline; filename=\"spot.{}\"", output.extension);
            let mut response = (StatusCode::OK, spot.audio).into_response();
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&output.content_type) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            if let Ok(value) = HeaderValue::from_str(&format!("{:.3}", spot.plan.total_seconds)) {
                headers.insert(SPOT_DURATION_HEADER, value);
            }
            response
        }
        Err(e) => {
            span.in_scope(|| log_failure(&e));
            e.into_response()
        }
    }
}

fn log_failure(e: &RenderError) {
    match e {
        RenderError::Validation(_) => warn!("Rejected render request: {}", e),
        _ => error!("Render failed: {}", e),
    }
}
