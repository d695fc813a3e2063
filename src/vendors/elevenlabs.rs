use super::{ensure_success, ConversationAgent, VendorError};
use crate::config::ElevenLabsConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const VENDOR: &str = "ElevenLabs";

/// Reply fields the conversation endpoint has used, in order of preference
const REPLY_FIELDS: &[&str] = &["response", "reply", "text"];

pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig, api_key: String, timeout: Duration) -> Result<Self, VendorError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            config,
        })
    }
}

#[async_trait]
impl ConversationAgent for ElevenLabsClient {
    async fn send_text(&self, conversation_id: Option<&str>, text: &str) -> Result<String, VendorError> {
        if self.config.agent_id.is_empty() {
            return Err(VendorError::NotConfigured("vendors.elevenlabs.agent_id"));
        }

        let url = format!(
            "{}/convai/conversation/text",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "agent_id": self.config.agent_id,
            "conversation_id": conversation_id,
            "text": text,
        });

        let response = self
            .http
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let reply: Value = ensure_success(VENDOR, response).await?.json().await?;

        extract_reply(&reply).ok_or_else(|| VendorError::Unexpected {
            vendor: VENDOR,
            detail: "no reply text in response".to_string(),
        })
    }
}

fn extract_reply(body: &Value) -> Option<String> {
    REPLY_FIELDS
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}
