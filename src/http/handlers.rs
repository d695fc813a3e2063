use super::auth::AdminAccess;
use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::relay::RelayRoute;
use crate::store::{finished_patch, Article, Transcript, TranscriptSummary, Turn};
use axum::{
    extract::{rejection::JsonRejection, ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

// ============================================================================
// Agent
// ============================================================================

/// POST /api/agent
/// Append one turn to a conversation; a turn with `phase: "ended"` also
/// marks the conversation finished.
pub async fn post_agent(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(mut body) = payload?;

    let conversation_id = match body.remove("conversationId") {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        _ => return Err(ApiError::BadRequest("conversationId is required".to_string())),
    };
    if !body.get("role").is_some_and(Value::is_string) {
        return Err(ApiError::BadRequest("role is required".to_string()));
    }
    // The store assigns ts; whatever the client sent is discarded
    body.remove("ts");

    let turn: Turn = serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::BadRequest(format!("Invalid turn: {}", e)))?;
    let ending = turn.is_ending();

    state.transcripts.append_turn(&conversation_id, turn).await?;

    if ending {
        state
            .transcripts
            .update_conversation(&conversation_id, &finished_patch(Utc::now()))
            .await?;
        info!("Conversation {} finished", conversation_id);
    }

    Ok(Json(json!({ "ok": true })))
}

// ============================================================================
// Transcripts (admin)
// ============================================================================

/// GET /api/transcripts
pub async fn list_transcripts(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TranscriptSummary>>> {
    Ok(Json(state.transcripts.list().await?))
}

/// GET /api/transcripts/:id
pub async fn get_transcript(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Transcript>> {
    state
        .transcripts
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Transcript {}", id)))
}

/// DELETE /api/transcripts/:id
pub async fn delete_transcript(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if state.transcripts.delete(&id).await? {
        info!("Deleted transcript {}", id);
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::NotFound(format!("Transcript {}", id)))
    }
}

// ============================================================================
// Articles
// ============================================================================

/// GET /api/articles
pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.articles.list().await?))
}

/// GET /api/articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    state
        .articles
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Article {}", id)))
}

/// POST /api/articles (admin)
pub async fn create_article(
    _admin: AdminAccess,
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(fields) = payload?;
    let article = state.articles.create(&fields).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": article.id }))).into_response())
}

/// PUT /api/articles/:id (admin)
pub async fn update_article(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<Article>> {
    let Json(patch) = payload?;
    state
        .articles
        .update(&id, &patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Article {}", id)))
}

/// DELETE /api/articles/:id (admin)
pub async fn delete_article(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if state.articles.delete(&id).await? {
        Ok(Json(json!({ "ok": true })))
    } else {
        Err(ApiError::NotFound(format!("Article {}", id)))
    }
}

// ============================================================================
// Voice relays
// ============================================================================

/// GET /api/stt (WebSocket)
pub async fn stt_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    upgrade_to_relay(ws, state.stt.clone(), state.shutdown.clone())
}

/// GET /api/evi (WebSocket)
pub async fn evi_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    upgrade_to_relay(ws, state.evi.clone(), state.shutdown.clone())
}

fn upgrade_to_relay(ws: WebSocketUpgrade, route: RelayRoute, shutdown: CancellationToken) -> Response {
    ws.on_upgrade(move |socket| async move {
        route.serve(socket, shutdown).await;
    })
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
