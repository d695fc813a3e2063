// Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use neurobiz_server::relay::{EndpointResolver, RelayKind, RelayRoute, VendorEndpoint};
use neurobiz_server::store::{ArticleStore, TranscriptStore};
use neurobiz_server::vendors::{
    ConversationAgent, LanguageModel, RealtimeSessions, SpeechSynthesizer, VendorError, Vendors,
};
use neurobiz_server::AppState;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const ADMIN_PASS: &str = "let-me-in";

/// Records every (system, user) prompt and answers with the first user line
#[derive(Default)]
pub struct FakeLlm {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn complete(&self, system: &str, user: &str) -> Result<String, VendorError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(format!("LLM: {}", user.lines().next().unwrap_or_default()))
    }
}

pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, VendorError> {
        Ok(format!("RIFF:{}", text).into_bytes())
    }
}

pub struct FakeRealtime;

#[async_trait]
impl RealtimeSessions for FakeRealtime {
    async fn create_session(&self, instructions: Option<&str>) -> Result<Value, VendorError> {
        Ok(json!({
            "id": "sess_test",
            "instructions": instructions,
            "client_secret": {"value": "ek_test"},
        }))
    }
}

/// Echoes messages; the text "explode" simulates a vendor outage
pub struct FakeAgent;

#[async_trait]
impl ConversationAgent for FakeAgent {
    async fn send_text(&self, conversation_id: Option<&str>, text: &str) -> Result<String, VendorError> {
        if text == "explode" {
            return Err(VendorError::Api {
                vendor: "ElevenLabs",
                status: 503,
                body: "internal upstream detail".to_string(),
            });
        }
        Ok(format!("[{}] echo: {}", conversation_id.unwrap_or("-"), text))
    }
}

#[derive(Default)]
pub struct TestOptions {
    pub admin_pass: Option<String>,
    pub stt: Option<VendorEndpoint>,
    pub evi: Option<VendorEndpoint>,
}

impl TestOptions {
    pub fn with_admin() -> Self {
        Self {
            admin_pass: Some(ADMIN_PASS.to_string()),
            ..Default::default()
        }
    }
}

pub struct TestApp {
    pub state: AppState,
    pub llm: Arc<FakeLlm>,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new(opts: TestOptions) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let llm = Arc::new(FakeLlm::default());

        let vendors = Vendors {
            llm: llm.clone(),
            speech: Arc::new(FakeSpeech),
            realtime: Arc::new(FakeRealtime),
            agent: Arc::new(FakeAgent),
        };

        let grace = Duration::from_millis(500);
        let resolver = |e: Option<VendorEndpoint>| e.map(|e| Arc::new(e) as Arc<dyn EndpointResolver>);

        let state = AppState {
            transcripts: Arc::new(TranscriptStore::open(dir.path().join("transcripts")).await?),
            articles: Arc::new(ArticleStore::open(dir.path().join("articles")).await?),
            vendors,
            stt: RelayRoute::new(RelayKind::Stt, resolver(opts.stt), grace),
            evi: RelayRoute::new(RelayKind::Evi, resolver(opts.evi), grace),
            admin_pass: opts.admin_pass.as_deref().map(Arc::from),
            shutdown: CancellationToken::new(),
        };

        Ok(Self { state, llm, dir })
    }
}
