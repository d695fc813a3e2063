use crate::vendors::VendorError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

pub type VendorSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Vendor socket url plus the auth headers to send on the handshake
#[derive(Clone, PartialEq, Eq)]
pub struct VendorEndpoint {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl VendorEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// Header values are credentials
impl std::fmt::Debug for VendorEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("VendorEndpoint")
            .field("url", &self.url.split('?').next().unwrap_or_default())
            .field("headers", &names)
            .finish()
    }
}

/// Produces the endpoint for each new relay connection
#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve(&self) -> Result<VendorEndpoint, VendorError>;
}

#[async_trait]
impl EndpointResolver for VendorEndpoint {
    async fn resolve(&self) -> Result<VendorEndpoint, VendorError> {
        Ok(self.clone())
    }
}

/// Open the vendor socket
pub async fn connect_vendor(endpoint: &VendorEndpoint) -> Result<VendorSocket> {
    let mut request = endpoint
        .url
        .as_str()
        .into_client_request()
        .context("Invalid vendor socket url")?;

    for (name, value) in &endpoint.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name {}", name))?;
        let value = HeaderValue::from_str(value).context("Invalid header value")?;
        request.headers_mut().insert(name, value);
    }

    let (socket, response) = tokio_tungstenite::connect_async(request)
        .await
        .with_context(|| format!("Failed to connect to {:?}", endpoint))?;

    debug!("Vendor socket open ({})", response.status());
    Ok(socket)
}
