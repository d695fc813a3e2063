use super::{ensure_success, VendorError};
use crate::config::HumeConfig;
use crate::relay::{EndpointResolver, VendorEndpoint};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const VENDOR: &str = "Hume";
const API_KEY_HEADER: &str = "X-Hume-Api-Key";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Resolves the EVI socket endpoint.
///
/// With a secret key configured, each connection gets a fresh OAuth
/// client-credentials access token in the query string; otherwise the API
/// key goes in a header.
pub struct HumeAuth {
    http: reqwest::Client,
    api_key: String,
    secret_key: Option<String>,
    config: HumeConfig,
}

impl HumeAuth {
    pub fn new(
        config: HumeConfig,
        api_key: String,
        secret_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, VendorError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            secret_key,
            config,
        })
    }

    async fn access_token(&self, secret_key: &str) -> Result<String, VendorError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.api_key, Some(secret_key))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: TokenResponse = ensure_success(VENDOR, response).await?.json().await?;
        debug!("Fetched Hume access token");
        Ok(token.access_token)
    }

    fn evi_url(&self, access_token: Option<&str>) -> Result<Url, VendorError> {
        let mut url = Url::parse(&self.config.evi_url).map_err(|e| VendorError::Unexpected {
            vendor: VENDOR,
            detail: format!("invalid EVI url: {}", e),
        })?;
        let pairs: Vec<(&str, &str)> = [
            ("config_id", self.config.config_id.as_deref()),
            ("access_token", access_token),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect();

        // An untouched query keeps the url free of a dangling '?'
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

#[async_trait]
impl EndpointResolver for HumeAuth {
    async fn resolve(&self) -> Result<VendorEndpoint, VendorError> {
        match &self.secret_key {
            Some(secret) => {
                let token = self.access_token(secret).await?;
                Ok(VendorEndpoint::new(self.evi_url(Some(&token))?.to_string()))
            }
            None => Ok(VendorEndpoint::new(self.evi_url(None)?.to_string())
                .with_header(API_KEY_HEADER, &self.api_key)),
        }
    }
}
