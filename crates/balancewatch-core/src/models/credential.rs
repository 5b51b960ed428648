//! Exchange credential data model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Binance
    Binance,
    /// Bybit
    Bybit,
    /// OKX
    Okx,
    /// Bitget
    Bitget,
}

impl Exchange {
    /// Stored identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
            Exchange::Bitget => "bitget",
        }
    }
}

impl FromStr for Exchange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            "okx" => Ok(Exchange::Okx),
            "bitget" => Ok(Exchange::Bitget),
            other => Err(Error::validation(format!("unknown exchange '{other}'"))),
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account / wallet sub-type on an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    /// Spot wallet
    Spot,
    /// Derivatives wallet
    Futures,
    /// Funding wallet
    Funding,
    /// Margin wallet
    Margin,
    /// Unified trading account
    Unified,
}

impl WalletType {
    /// Stored identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Spot => "spot",
            WalletType::Futures => "futures",
            WalletType::Funding => "funding",
            WalletType::Margin => "margin",
            WalletType::Unified => "unified",
        }
    }
}

impl FromStr for WalletType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(WalletType::Spot),
            "futures" => Ok(WalletType::Futures),
            "funding" => Ok(WalletType::Funding),
            "margin" => Ok(WalletType::Margin),
            "unified" => Ok(WalletType::Unified),
            other => Err(Error::validation(format!("unknown wallet type '{other}'"))),
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exchange account: the key the credential store is unique on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Exchange
    pub exchange: Exchange,
    /// Wallet type on that exchange
    pub wallet_type: WalletType,
}

impl Platform {
    /// Create a platform key
    pub fn new(exchange: Exchange, wallet_type: WalletType) -> Self {
        Self {
            exchange,
            wallet_type,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exchange, self.wallet_type)
    }
}

/// Stored exchange API credential
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Unique identifier
    pub id: Uuid,

    /// Exchange and wallet type
    pub platform: Platform,

    /// API key
    pub api_key: String,

    /// Secret, encrypted at rest by whoever writes it
    #[serde(skip_serializing, default)]
    pub encrypted_secret: String,

    /// Whether this is the credential used for balance queries
    pub is_active: bool,

    /// When the credential was created
    pub created_at: DateTime<Utc>,

    /// When the credential was last updated
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("platform", &self.platform)
            .field("api_key", &mask(&self.api_key))
            .field("encrypted_secret", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating or replacing the credential of a platform
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialInput {
    /// Exchange
    pub exchange: Exchange,
    /// Wallet type on that exchange
    pub wallet_type: WalletType,
    /// API key
    pub api_key: String,
    /// Secret, already encrypted by the caller
    pub encrypted_secret: String,
}

impl CredentialInput {
    /// Platform key of this input
    pub fn platform(&self) -> Platform {
        Platform::new(self.exchange, self.wallet_type)
    }

    /// Reject inputs the store must never hold
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::validation("api_key must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("exchange", &self.exchange)
            .field("wallet_type", &self.wallet_type)
            .field("api_key", &mask(&self.api_key))
            .finish_non_exhaustive()
    }
}

/// Keep the last four characters of a key for log correlation
fn mask(key: &str) -> String {
    let visible: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{visible}")
}
