use crate::config::{Config, Secrets};
use crate::relay::{EndpointResolver, RelayKind, RelayRoute, VendorEndpoint};
use crate::store::{ArticleStore, TranscriptStore};
use crate::vendors::{HumeAuth, Vendors};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const ELEVENLABS_KEY_HEADER: &str = "xi-api-key";

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub transcripts: Arc<TranscriptStore>,
    pub articles: Arc<ArticleStore>,
    pub vendors: Vendors,
    pub stt: RelayRoute,
    pub evi: RelayRoute,
    /// `None` locks every admin route
    pub admin_pass: Option<Arc<str>>,
    /// Cancelled when the server shuts down; relays watch it
    pub shutdown: CancellationToken,
}

impl AppState {
    pub async fn from_config(cfg: &Config, secrets: &Secrets) -> Result<Self> {
        let transcripts = TranscriptStore::open(cfg.storage.transcripts_dir())
            .await
            .context("Failed to open transcript store")?;
        let articles = ArticleStore::open(cfg.storage.articles_dir())
            .await
            .context("Failed to open article store")?;

        let vendors = Vendors::from_config(cfg, secrets).context("Failed to create vendor clients")?;
        let close_grace = Duration::from_millis(cfg.relay.close_grace_ms);

        let stt_endpoint: Option<Arc<dyn EndpointResolver>> =
            secrets.elevenlabs_api_key.as_ref().map(|key| {
                Arc::new(
                    VendorEndpoint::new(cfg.vendors.elevenlabs.stt_url.clone())
                        .with_header(ELEVENLABS_KEY_HEADER, key.clone()),
                ) as Arc<dyn EndpointResolver>
            });

        let evi_endpoint: Option<Arc<dyn EndpointResolver>> = match &secrets.hume_api_key {
            Some(key) => Some(Arc::new(
                HumeAuth::new(
                    cfg.vendors.hume.clone(),
                    key.clone(),
                    secrets.hume_secret_key.clone(),
                    Duration::from_secs(cfg.vendors.http_timeout_secs),
                )
                .context("Failed to create Hume client")?,
            ) as Arc<dyn EndpointResolver>),
            None => {
                warn!("HUME_API_KEY not set; /api/evi will refuse connections");
                None
            }
        };

        if secrets.admin_pass.is_none() {
            warn!("ADMIN_PASS not set; admin routes are locked");
        }

        info!(
            "Storage: {} / {}",
            transcripts.dir().display(),
            cfg.storage.articles_dir().display()
        );

        Ok(Self {
            transcripts: Arc::new(transcripts),
            articles: Arc::new(articles),
            vendors,
            stt: RelayRoute::new(RelayKind::Stt, stt_endpoint, close_grace),
            evi: RelayRoute::new(RelayKind::Evi, evi_endpoint, close_grace),
            admin_pass: secrets.admin_pass.as_deref().map(Arc::from),
            shutdown: CancellationToken::new(),
        })
    }
}
