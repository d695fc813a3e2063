//! Vendor-backed endpoints: chat, speech, recommendations, summaries and
//! realtime session bootstrap

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::prompts;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(alias = "text")]
    pub message: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SolutionRequest {
    pub answers: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub conversation_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RealtimeSessionRequest {
    pub instructions: Option<String>,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let message = required(req.message, "message")?;

    let reply = state
        .vendors
        .agent
        .send_text(req.conversation_id.as_deref(), &message)
        .await?;

    Ok(Json(json!({ "reply": reply })))
}

/// POST /api/tts
/// Returns base64 WAV audio
pub async fn tts(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let text = required(req.text, "text")?;

    let audio = state.vendors.speech.synthesize(&text).await?;
    debug!("TTS: {} chars -> {} bytes", text.len(), audio.len());

    Ok(Json(json!({
        "audio": base64::engine::general_purpose::STANDARD.encode(&audio),
        "mimeType": "audio/wav",
    })))
}

/// POST /api/solution
pub async fn solution(
    State(state): State<AppState>,
    payload: Result<Json<SolutionRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let answers = match req.answers {
        None | Some(Value::Null) => {
            return Err(ApiError::BadRequest("answers is required".to_string()))
        }
        Some(answers) => answers,
    };

    let text = state
        .vendors
        .llm
        .complete(prompts::SOLUTION_SYSTEM_PROMPT, &prompts::solution_prompt(&answers))
        .await?;

    Ok(Json(json!({ "text": text })))
}

/// POST /api/summary
pub async fn summary(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let id = required(req.conversation_id, "conversationId")?;

    let transcript = state
        .transcripts
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Transcript {}", id)))?;

    let dialogue = transcript.render_dialogue();
    if dialogue.is_empty() {
        return Err(ApiError::BadRequest(format!("Transcript {} has no text", id)));
    }

    let summary = state
        .vendors
        .llm
        .complete(prompts::SUMMARY_SYSTEM_PROMPT, &dialogue)
        .await?;

    Ok(Json(json!({ "summary": summary })))
}

/// POST /api/realtime/session
/// Body is optional; an empty body means no instructions
pub async fn realtime_session(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let req: RealtimeSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RealtimeSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid session request: {}", e)))?
    };

    let session = state
        .vendors
        .realtime
        .create_session(req.instructions.as_deref())
        .await?;
    Ok(Json(session))
}

/// POST /api/realtime/say
/// Event for the browser to push into its realtime data channel
pub async fn realtime_say(payload: Result<Json<TextRequest>, JsonRejection>) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let text = required(req.text, "text")?;
    Ok(Json(json!({ "event": prompts::say_event(&text) })))
}
