use super::endpoint::VendorSocket;
use super::frame::Inbound;
use super::translate::{Translated, Translator};
use axum::extract::ws::WebSocket;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a relay pair ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseCause {
    ClientClosed,
    VendorClosed,
    ClientError(String),
    VendorError(String),
    Shutdown,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelayStats {
    pub to_vendor: u64,
    pub to_client: u64,
    pub dropped: u64,
    pub cause: Option<CloseCause>,
}

/// Relay frames between `client` and `vendor` until either side ends.
///
/// Whichever side closes, errors, or ends first (or `shutdown` firing)
/// terminates the pair: both sockets are then closed, bounded by
/// `close_grace`.
pub async fn run_relay<T: Translator>(
    label: &str,
    client: WebSocket,
    vendor: VendorSocket,
    mut translator: T,
    shutdown: CancellationToken,
    close_grace: Duration,
) -> RelayStats {
    let (mut client_tx, mut client_rx) = client.split();
    let (mut vendor_tx, mut vendor_rx) = vendor.split();
    let mut stats = RelayStats::default();

    info!("{} relay open", label);

    let cause = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break CloseCause::Shutdown,

            msg = client_rx.next() => {
                let frame = match msg {
                    None => break CloseCause::ClientClosed,
                    Some(Err(e)) => break CloseCause::ClientError(e.to_string()),
                    Some(Ok(msg)) => match Inbound::from(msg) {
                        Inbound::Data(frame) => frame,
                        Inbound::Control => continue,
                        Inbound::Close => break CloseCause::ClientClosed,
                    },
                };

                match translator.to_vendor(frame) {
                    Translated::Forward(frame) => {
                        if let Err(e) = vendor_tx.send(frame.into_vendor()).await {
                            break CloseCause::VendorError(e.to_string());
                        }
                        stats.to_vendor += 1;
                    }
                    Translated::Drop(reason) => {
                        debug!("{} relay dropped client frame: {}", label, reason);
                        stats.dropped += 1;
                    }
                }
            }

            msg = vendor_rx.next() => {
                let frame = match msg {
                    None => break CloseCause::VendorClosed,
                    Some(Err(e)) => break CloseCause::VendorError(e.to_string()),
                    Some(Ok(msg)) => match Inbound::from(msg) {
                        Inbound::Data(frame) => frame,
                        Inbound::Control => continue,
                        Inbound::Close => break CloseCause::VendorClosed,
                    },
                };

                match translator.to_client(frame) {
                    Translated::Forward(frame) => {
                        if let Err(e) = client_tx.send(frame.into_client()).await {
                            break CloseCause::ClientError(e.to_string());
                        }
                        stats.to_client += 1;
                    }
                    Translated::Drop(reason) => {
                        debug!("{} relay dropped vendor frame: {}", label, reason);
                        stats.dropped += 1;
                    }
                }
            }
        }
    };

    // Close both sides; either may already be gone, so failures are expected
    let closing = async {
        let (client_closed, vendor_closed) = tokio::join!(client_tx.close(), vendor_tx.close());
        if let Err(e) = client_closed {
            debug!("{} relay client close: {}", label, e);
        }
        if let Err(e) = vendor_closed {
            debug!("{} relay vendor close: {}", label, e);
        }
    };
    if tokio::time::timeout(close_grace, closing).await.is_err() {
        warn!("{} relay close did not finish within {:?}", label, close_grace);
    }

    info!(
        "{} relay closed ({:?}): {} frames to vendor, {} to client, {} dropped",
        label, cause, stats.to_vendor, stats.to_client, stats.dropped
    );
    stats.cause = Some(cause);
    stats
}
