use super::{ensure_success, LanguageModel, RealtimeSessions, SpeechSynthesizer, VendorError};
use crate::config::OpenAiConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const VENDOR: &str = "OpenAI";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI chat completions, speech and realtime sessions
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig, api_key: String, timeout: Duration) -> Result<Self, VendorError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, VendorError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        ensure_success(VENDOR, response).await
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, VendorError> {
        let body = json!({
            "model": self.config.chat_model,
            "temperature": 0.7,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let parsed: ChatCompletionResponse = self.post("chat/completions", &body).await?.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| VendorError::Unexpected {
                vendor: VENDOR,
                detail: "completion had no content".to_string(),
            })?;

        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError> {
        let body = json!({
            "model": self.config.tts_model,
            "voice": self.config.tts_voice,
            "input": text,
            "response_format": "wav",
        });

        let audio = self.post("audio/speech", &body).await?.bytes().await?;
        debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl RealtimeSessions for OpenAiClient {
    async fn create_session(&self, instructions: Option<&str>) -> Result<Value, VendorError> {
        let mut body = json!({
            "model": self.config.realtime_model,
            "voice": self.config.realtime_voice,
        });
        if let Some(instructions) = instructions {
            body["instructions"] = Value::String(instructions.to_string());
        }

        let session: Value = self.post("realtime/sessions", &body).await?.json().await?;
        info!("Created realtime session ({})", self.config.realtime_model);
        Ok(session)
    }
}
