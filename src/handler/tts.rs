use super::middleware::clientip::ClientIp;
use super::TtsRequest;
use crate::app::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::json;
use std::time::Instant;
use tracing::{error, info};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tts", post(synthesize))
        .route("/health", get(health))
}

pub async fn synthesize(
    client_ip: ClientIp,
    State(state): State<AppState>,
    Json(params): Json<TtsRequest>,
) -> Response {
    let text = params.text.trim();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "text must not be empty"})),
        )
            .into_response();
    }
    let voice = params
        .voice
        .as_deref()
        .unwrap_or_else(|| state.synthesizer.default_voice());
    let speaker = params.speaker.unwrap_or(0);

    let start = Instant::now();
    match state.synthesizer.synthesize(text, voice, speaker).await {
        Ok(audio) => {
            info!(
                %client_ip,
                voice,
                bytes = audio.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "synthesis completed"
            );
            (
                [(header::CONTENT_TYPE, "audio/wav")],
                Bytes::from(audio),
            )
                .into_response()
        }
        Err(err) => {
            error!(%client_ip, voice, "synthesis failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": err.to_string()})),
            )
                .into_response()
        }
    }
}

pub async fn health() -> Response {
    Json(json!({"status": "healthy"})).into_response()
}
