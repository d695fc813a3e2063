use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub vendors: VendorsConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Directory holding the built frontend (index.html + assets)
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory; `transcripts/` and `articles/` live under it
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir.join("transcripts")
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.data_dir.join("articles")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorsConfig {
    pub openai: OpenAiConfig,
    pub elevenlabs: ElevenLabsConfig,
    pub hume: HumeConfig,
    /// Client-level timeout for vendor HTTP calls
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub chat_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub realtime_model: String,
    pub realtime_voice: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElevenLabsConfig {
    pub base_url: String,
    /// Agent that answers `/api/chat` messages
    pub agent_id: String,
    pub stt_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HumeConfig {
    pub evi_url: String,
    pub token_url: String,
    pub config_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Upper bound on the paired close handshake
    pub close_grace_ms: u64,
}

impl Config {
    /// Load configuration: built-in defaults, then the (optional) file at
    /// `path`, then `NEUROBIZ__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::builder()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("NEUROBIZ").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if let Ok(port) = std::env::var("PORT") {
            cfg.service.http.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }

        Ok(cfg)
    }

    /// Defaults only, no file or environment. Used by tests and as the base layer.
    pub fn defaults() -> Result<Self> {
        Ok(Self::builder()?.build()?.try_deserialize()?)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "neurobiz")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 3000)?
            .set_default("service.static_dir", "dist")?
            .set_default("storage.data_dir", "data")?
            .set_default("vendors.http_timeout_secs", 60)?
            .set_default("vendors.openai.base_url", "https://api.openai.com/v1")?
            .set_default("vendors.openai.chat_model", "gpt-4o-mini")?
            .set_default("vendors.openai.tts_model", "tts-1")?
            .set_default("vendors.openai.tts_voice", "alloy")?
            .set_default("vendors.openai.realtime_model", "gpt-4o-realtime-preview")?
            .set_default("vendors.openai.realtime_voice", "verse")?
            .set_default("vendors.elevenlabs.base_url", "https://api.elevenlabs.io/v1")?
            .set_default("vendors.elevenlabs.agent_id", "")?
            .set_default(
                "vendors.elevenlabs.stt_url",
                "wss://api.elevenlabs.io/v1/speech-to-text/realtime",
            )?
            .set_default("vendors.hume.evi_url", "wss://api.hume.ai/v0/evi/chat")?
            .set_default("vendors.hume.token_url", "https://api.hume.ai/oauth2-cc/token")?
            .set_default("relay.close_grace_ms", 2000)?)
    }
}

/// Vendor credentials and the admin pass, read from plain environment variables
#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub hume_api_key: Option<String>,
    pub hume_secret_key: Option<String>,
    pub admin_pass: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &self.openai_api_key.is_some())
            .field("elevenlabs_api_key", &self.elevenlabs_api_key.is_some())
            .field("hume_api_key", &self.hume_api_key.is_some())
            .field("hume_secret_key", &self.hume_secret_key.is_some())
            .field("admin_pass", &self.admin_pass.is_some())
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        }

        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            elevenlabs_api_key: var("ELEVENLABS_API_KEY"),
            hume_api_key: var("HUME_API_KEY"),
            hume_secret_key: var("HUME_SECRET_KEY"),
            admin_pass: var("ADMIN_PASS"),
        }
    }

    /// Keys without which the server refuses to start
    pub fn require_startup_keys(&self) -> Result<()> {
        if self.openai_api_key.is_none() {
            anyhow::bail!("OPENAI_API_KEY is not set");
        }
        if self.elevenlabs_api_key.is_none() {
            anyhow::bail!("ELEVENLABS_API_KEY is not set");
        }
        Ok(())
    }
}
