//! WebSocket relays between the browser and vendor voice sockets
//!
//! Two routes share one relay loop:
//! - `/api/stt` - ElevenLabs speech-to-text, frames passed through verbatim
//! - `/api/evi` - Hume EVI, client input wrapped into EVI envelopes and
//!   assistant audio decoded to binary frames
//!
//! The vendor socket is opened before any client frame is read, so frames
//! a browser sends early wait in the client socket and are relayed in order
//! once the vendor is open.

mod bridge;
mod endpoint;
mod envelope;
mod frame;
mod translate;

pub use bridge::{run_relay, CloseCause, RelayStats};
pub use endpoint::{connect_vendor, EndpointResolver, VendorEndpoint, VendorSocket};
pub use envelope::EviEvent;
pub use frame::{Frame, Inbound};
pub use translate::{DropReason, EviTranslator, Passthrough, Translated, Translator};

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Stt,
    Evi,
}

impl RelayKind {
    pub fn label(&self) -> &'static str {
        match self {
            RelayKind::Stt => "STT",
            RelayKind::Evi => "EVI",
        }
    }
}

/// One relay route: which vendor to dial and how to translate
#[derive(Clone)]
pub struct RelayRoute {
    kind: RelayKind,
    endpoint: Option<Arc<dyn EndpointResolver>>,
    close_grace: Duration,
}

impl RelayRoute {
    /// `endpoint: None` means the vendor is not configured; clients are
    /// accepted and closed immediately with an error code.
    pub fn new(kind: RelayKind, endpoint: Option<Arc<dyn EndpointResolver>>, close_grace: Duration) -> Self {
        Self {
            kind,
            endpoint,
            close_grace,
        }
    }

    /// Dial the vendor and relay until the pair ends. `None` if the vendor
    /// could not be reached.
    pub async fn serve(&self, client: WebSocket, shutdown: CancellationToken) -> Option<RelayStats> {
        let label = self.kind.label();

        let Some(resolver) = &self.endpoint else {
            warn!("{} relay requested but the vendor is not configured", label);
            reject(client, "vendor not configured").await;
            return None;
        };

        let endpoint = match resolver.resolve().await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!("{} relay could not resolve vendor endpoint: {}", label, e);
                reject(client, "vendor unavailable").await;
                return None;
            }
        };

        let vendor = match connect_vendor(&endpoint).await {
            Ok(socket) => socket,
            Err(e) => {
                error!("{} relay vendor connection failed: {:#}", label, e);
                reject(client, "vendor unavailable").await;
                return None;
            }
        };

        let stats = match self.kind {
            RelayKind::Stt => {
                run_relay(label, client, vendor, Passthrough, shutdown, self.close_grace).await
            }
            RelayKind::Evi => {
                run_relay(label, client, vendor, EviTranslator, shutdown, self.close_grace).await
            }
        };
        Some(stats)
    }
}

async fn reject(mut client: WebSocket, reason: &'static str) {
    let frame = CloseFrame {
        code: close_code::ERROR,
        reason: reason.into(),
    };
    if let Err(e) = client.send(Message::Close(Some(frame))).await {
        warn!("Failed to send close frame to client: {}", e);
    }
}
