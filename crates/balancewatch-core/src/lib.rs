//! # BalanceWatch
//!
//! Exchange wallet balance monitor.
//!
//! BalanceWatch periodically samples the balance of the active exchange
//! account, compares it with the configured threshold and sends a rate-limited
//! alert when the balance crosses it.
//!
//! ## Architecture
//!
//! - **Monitor**: threshold evaluation, alert cooldown and the polling loop
//! - **Storage**: PostgreSQL for credentials and settings, or an in-memory store
//! - **API**: REST endpoints for manual checks and configuration
//!
//! ## Quick Start
//!
//! ```bash
//! # Store and activate a credential
//! balancewatch credentials set --exchange binance --wallet-type futures \
//!     --api-key KEY --secret ENCRYPTED --activate
//!
//! # Alert when the balance drops below 1000
//! balancewatch settings set --interval 60 --threshold 1000 --below
//!
//! # Run the monitor and the API
//! balancewatch serve
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod monitor;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::db::{CredentialStore, MemoryStore, SettingsStore};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::monitor::{
        BalanceSource, CheckObserver, CredentialSelector, MonitorHandle, MonitorLoop,
        NotificationSink, SettingsProvider,
    };
}
