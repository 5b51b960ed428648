//! HTTP balance source
//!
//! Talks to a balance gateway that owns the exchange-specific signing. The
//! credential travels in request headers; the gateway answers with
//! `{"totalBalance": "...", "availableBalance": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::BalanceSourceConfig;
use crate::error::{FetchError, Result};
use crate::models::{Credential, WalletBalance};

use super::BalanceSource;

/// Balance source backed by an HTTP gateway
pub struct HttpBalanceSource {
    client: Client,
    url: String,
}

impl HttpBalanceSource {
    /// Create a source for the configured gateway
    pub fn new(config: &BalanceSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| FetchError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl BalanceSource for HttpBalanceSource {
    async fn fetch(&self, credential: &Credential) -> std::result::Result<WalletBalance, FetchError> {
        debug!(url = %self.url, platform = %credential.platform, "Requesting wallet balance");

        let response = self
            .client
            .get(&self.url)
            .header("X-Exchange", credential.platform.exchange.as_str())
            .header("X-Wallet-Type", credential.platform.wallet_type.as_str())
            .header("X-Api-Key", &credential.api_key)
            .header("X-Api-Secret", &credential.encrypted_secret)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<WalletBalance>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
