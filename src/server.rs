// HTTP front for the prober
//
// GET /get-transcript?videoId=<id or URL>
//   200 {"transcript":[{"text","start","duration"}]}
//   400 invalid or missing identifier
//   404 every strategy came back empty
//   500 anything else

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::captions::{CaptionError, CaptionProber};

/// Shared state for the HTTP server
#[derive(Clone)]
pub struct ServerState {
    pub prober: Arc<CaptionProber>,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptQuery {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

pub fn router(prober: Arc<CaptionProber>) -> Router {
    Router::new()
        .route("/get-transcript", get(get_transcript))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .with_state(ServerState { prober })
}

pub async fn serve(addr: SocketAddr, prober: Arc<CaptionProber>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("[Server] listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(prober)).await
}

async fn get_transcript(
    State(state): State<ServerState>,
    Query(query): Query<TranscriptQuery>,
) -> Response {
    let Some(input) = query.video_id.filter(|v| !v.trim().is_empty()) else {
        return error_response(&CaptionError::InvalidIdentifier(
            "missing videoId query parameter".to_string(),
        ));
    };

    // Dropping this future on client disconnect abandons the remaining strategies.
    match state.prober.get_captions(&input).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &CaptionError) -> Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("[Server] {}", e);
    } else {
        info!("[Server] {} -> {}", status.as_u16(), e);
    }

    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}
