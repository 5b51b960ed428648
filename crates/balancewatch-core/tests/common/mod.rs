//! Shared fakes for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use balancewatch::db::{CredentialStore, MemoryStore, SettingsStore};
use balancewatch::error::{DeliveryError, FetchError};
use balancewatch::models::{
    Credential, CredentialInput, Exchange, SettingsInput, WalletBalance, WalletType,
};
use balancewatch::monitor::{BalanceSource, Clock, MonitorLoop, NotificationSink};

/// Balance source returning scripted responses; the last one repeats
pub struct ScriptedSource {
    responses: Mutex<Vec<Result<WalletBalance, FetchError>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn returning(total: &str) -> Arc<Self> {
        Self::script(vec![Ok(WalletBalance::total(total))])
    }

    pub fn failing(error: FetchError) -> Arc<Self> {
        Self::script(vec![Err(error)])
    }

    pub fn script(responses: Vec<Result<WalletBalance, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl BalanceSource for ScriptedSource {
    async fn fetch(&self, _credential: &Credential) -> Result<WalletBalance, FetchError> {
        let mut calls = self.calls.lock();
        let responses = self.responses.lock();
        let index = (*calls).min(responses.len() - 1);
        *calls += 1;

        match &responses[index] {
            Ok(balance) => Ok(balance.clone()),
            Err(FetchError::Http(msg)) => Err(FetchError::Http(msg.clone())),
            Err(FetchError::Status { status, body }) => Err(FetchError::Status {
                status: *status,
                body: body.clone(),
            }),
            Err(FetchError::Decode(msg)) => Err(FetchError::Decode(msg.clone())),
        }
    }
}

/// One delivered alert
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentAlert {
    pub balance: f64,
    pub threshold: f64,
    pub is_below: bool,
}

/// Sink that records alerts and can be told to fail
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentAlert>>,
    attempts: Mutex<usize>,
    fail_next: Mutex<usize>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail the next `n` deliveries
    pub fn fail_next(&self, n: usize) {
        *self.fail_next.lock() = n;
    }

    pub fn sent(&self) -> Vec<SentAlert> {
        self.sent.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_alert(
        &self,
        balance: f64,
        threshold: f64,
        is_below: bool,
    ) -> Result<(), DeliveryError> {
        *self.attempts.lock() += 1;

        let mut fail_next = self.fail_next.lock();
        if *fail_next > 0 {
            *fail_next -= 1;
            return Err(DeliveryError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        self.sent.lock().push(SentAlert {
            balance,
            threshold,
            is_below,
        });
        Ok(())
    }
}

/// Clock the test moves by hand
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Store holding one active Binance futures credential
pub async fn store_with_active_credential() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let credential = store
        .upsert(CredentialInput {
            exchange: Exchange::Binance,
            wallet_type: WalletType::Futures,
            api_key: "test-api-key".to_string(),
            encrypted_secret: "test-secret".to_string(),
        })
        .await
        .unwrap();
    store.activate(credential.id).await.unwrap();
    store
}

pub async fn set_settings(store: &MemoryStore, threshold: f64, below: bool, above: bool) {
    store
        .update_or_create(SettingsInput {
            polling_interval_seconds: 60,
            balance_threshold: threshold,
            notify_on_balance_below: below,
            notify_on_balance_above: above,
        })
        .await
        .unwrap();
}

pub fn monitor(
    store: &Arc<MemoryStore>,
    source: Arc<ScriptedSource>,
    sink: Arc<RecordingSink>,
    cooldown_seconds: u64,
) -> MonitorLoop {
    MonitorLoop::new(store.clone(), store.clone(), source, sink, cooldown_seconds)
}
