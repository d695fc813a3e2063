//! Third-party API clients
//!
//! Handlers only see the traits below; production wiring uses the
//! reqwest-backed OpenAI and ElevenLabs clients, tests substitute fakes.

mod elevenlabs;
mod hume;
mod openai;

pub use elevenlabs::ElevenLabsClient;
pub use hume::HumeAuth;
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{Config, Secrets};

#[derive(Debug, Error)]
pub enum VendorError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{vendor} returned {status}: {body}")]
    Api {
        vendor: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {vendor}: {detail}")]
    Unexpected { vendor: &'static str, detail: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Single-shot chat completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, VendorError>;
}

/// Text to WAV audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError>;
}

/// Ephemeral realtime voice sessions for the browser
#[async_trait]
pub trait RealtimeSessions: Send + Sync {
    /// Vendor session object, returned to the browser verbatim
    async fn create_session(&self, instructions: Option<&str>) -> Result<Value, VendorError>;
}

/// Hosted conversational agent answering typed chat messages
#[async_trait]
pub trait ConversationAgent: Send + Sync {
    async fn send_text(&self, conversation_id: Option<&str>, text: &str) -> Result<String, VendorError>;
}

/// The vendor seams handlers depend on
#[derive(Clone)]
pub struct Vendors {
    pub llm: Arc<dyn LanguageModel>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub realtime: Arc<dyn RealtimeSessions>,
    pub agent: Arc<dyn ConversationAgent>,
}

impl Vendors {
    pub fn from_config(cfg: &Config, secrets: &Secrets) -> Result<Self, VendorError> {
        let timeout = Duration::from_secs(cfg.vendors.http_timeout_secs);

        let openai_key = secrets
            .openai_api_key
            .clone()
            .ok_or(VendorError::NotConfigured("OPENAI_API_KEY"))?;
        let elevenlabs_key = secrets
            .elevenlabs_api_key
            .clone()
            .ok_or(VendorError::NotConfigured("ELEVENLABS_API_KEY"))?;

        let openai = Arc::new(OpenAiClient::new(cfg.vendors.openai.clone(), openai_key, timeout)?);
        let elevenlabs = Arc::new(ElevenLabsClient::new(
            cfg.vendors.elevenlabs.clone(),
            elevenlabs_key,
            timeout,
        )?);

        Ok(Self {
            llm: openai.clone(),
            speech: openai.clone(),
            realtime: openai,
            agent: elevenlabs,
        })
    }
}

/// Turn a non-2xx response into `VendorError::Api`, keeping the body for logs
pub(crate) async fn ensure_success(
    vendor: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, VendorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(VendorError::Api {
        vendor,
        status: status.as_u16(),
        body,
    })
}
