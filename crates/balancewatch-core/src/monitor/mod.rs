//! Balance monitoring core
//!
//! One check cycle resolves the active credential and the current settings,
//! fetches the wallet balance, evaluates it against the threshold and, when a
//! crossing is found and the cooldown allows it, dispatches an alert.

mod debounce;
mod evaluator;
mod notifier;
mod parse;
mod scheduler;
mod service;
mod source;

pub use debounce::NotificationDebouncer;
pub use evaluator::evaluate;
pub use notifier::{
    build_notifier, format_alert_message, LogNotifier, SlackNotifier, WebhookNotifier,
};
pub use parse::parse_balance;
pub use scheduler::{CheckObserver, MonitorHandle, TracingObserver};
pub use service::{Clock, MonitorLoop, SystemClock};
pub use source::HttpBalanceSource;

use async_trait::async_trait;

use crate::error::{DeliveryError, FetchError, Result};
use crate::models::{Credential, MonitoringSettings, WalletBalance};

/// Resolves the single credential authorized for balance queries
#[async_trait]
pub trait CredentialSelector: Send + Sync {
    /// Return the active credential, or `Error::NoActiveCredential` when the
    /// store does not hold exactly one active record
    async fn resolve_active(&self) -> Result<Credential>;
}

/// Resolves the monitoring settings in force
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Return the newest settings record, or the defaults when none exists.
    /// Only storage failures are errors.
    async fn resolve_current(&self) -> Result<MonitoringSettings>;
}

/// Fetches a raw wallet balance for a credential
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Fetch the balance of the account the credential belongs to
    async fn fetch(&self, credential: &Credential) -> std::result::Result<WalletBalance, FetchError>;
}

/// Delivers threshold alerts
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send one alert; `is_below` tells the direction of the crossing
    async fn send_alert(
        &self,
        balance: f64,
        threshold: f64,
        is_below: bool,
    ) -> std::result::Result<(), DeliveryError>;
}
