use axum::extract::ws::Message as ClientMessage;
use tokio_tungstenite::tungstenite::Message as VendorMessage;

/// Data frame as seen by translators, independent of either socket library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// What one received message means to the relay loop
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Data(Frame),
    /// Ping/pong; the socket libraries answer these themselves
    Control,
    Close,
}

impl Frame {
    pub fn into_client(self) -> ClientMessage {
        match self {
            Frame::Text(t) => ClientMessage::Text(t),
            Frame::Binary(b) => ClientMessage::Binary(b),
        }
    }

    pub fn into_vendor(self) -> VendorMessage {
        match self {
            Frame::Text(t) => VendorMessage::Text(t),
            Frame::Binary(b) => VendorMessage::Binary(b),
        }
    }
}

impl From<ClientMessage> for Inbound {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::Text(t) => Inbound::Data(Frame::Text(t)),
            ClientMessage::Binary(b) => Inbound::Data(Frame::Binary(b)),
            ClientMessage::Ping(_) | ClientMessage::Pong(_) => Inbound::Control,
            ClientMessage::Close(_) => Inbound::Close,
        }
    }
}

impl From<VendorMessage> for Inbound {
    fn from(msg: VendorMessage) -> Self {
        match msg {
            VendorMessage::Text(t) => Inbound::Data(Frame::Text(t)),
            VendorMessage::Binary(b) => Inbound::Data(Frame::Binary(b)),
            VendorMessage::Ping(_) | VendorMessage::Pong(_) | VendorMessage::Frame(_) => {
                Inbound::Control
            }
            VendorMessage::Close(_) => Inbound::Close,
        }
    }
}
