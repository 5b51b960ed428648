//! In-process credential and settings store

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Credential, CredentialInput, MonitoringSettings, Platform, SettingsInput};
use crate::monitor::{CredentialSelector, SettingsProvider};

use super::{CredentialStore, SettingsStore};

#[derive(Default)]
struct MemoryState {
    credentials: Vec<Credential>,
    // insertion order; the last element is the newest
    settings: Vec<MonitoringSettings>,
}

/// Store that keeps everything in memory, with the same guarantees as the
/// PostgreSQL repositories. Every operation takes the lock once, so reads of
/// the active credential or current settings see a consistent snapshot.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a credential as-is, bypassing the single-active invariant.
    /// Used to reproduce inconsistent data written by other tools.
    pub fn insert_raw(&self, credential: Credential) {
        self.state.lock().credentials.push(credential);
    }
}

#[async_trait]
impl CredentialSelector for MemoryStore {
    async fn resolve_active(&self) -> Result<Credential> {
        let state = self.state.lock();
        let mut active = state.credentials.iter().filter(|c| c.is_active);

        match (active.next(), active.next()) {
            (Some(credential), None) => Ok(credential.clone()),
            (None, _) => Err(Error::NoActiveCredential),
            (Some(_), Some(_)) => {
                warn!("More than one credential is flagged active; refusing to pick one");
                Err(Error::NoActiveCredential)
            }
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Credential>> {
        Ok(self.state.lock().credentials.clone())
    }

    async fn find_by_platform(&self, platform: Platform) -> Result<Option<Credential>> {
        Ok(self
            .state
            .lock()
            .credentials
            .iter()
            .find(|c| c.platform == platform)
            .cloned())
    }

    async fn upsert(&self, input: CredentialInput) -> Result<Credential> {
        input.validate()?;
        let now = Utc::now();
        let platform = input.platform();
        let mut state = self.state.lock();

        if let Some(existing) = state.credentials.iter_mut().find(|c| c.platform == platform) {
            existing.api_key = input.api_key;
            existing.encrypted_secret = input.encrypted_secret;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let credential = Credential {
            id: Uuid::new_v4(),
            platform,
            api_key: input.api_key,
            encrypted_secret: input.encrypted_secret,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        state.credentials.push(credential.clone());
        Ok(credential)
    }

    async fn activate(&self, id: Uuid) -> Result<Credential> {
        let now = Utc::now();
        let mut state = self.state.lock();

        if !state.credentials.iter().any(|c| c.id == id) {
            return Err(Error::not_found("credential", id.to_string()));
        }

        let mut activated = None;
        for credential in &mut state.credentials {
            let should_be_active = credential.id == id;
            if credential.is_active != should_be_active {
                credential.is_active = should_be_active;
                credential.updated_at = now;
            }
            if should_be_active {
                activated = Some(credential.clone());
            }
        }

        let credential =
            activated.ok_or_else(|| Error::internal("activated credential vanished"))?;
        info!(credential_id = %id, platform = %credential.platform, "Credential activated");
        Ok(credential)
    }
}

#[async_trait]
impl SettingsProvider for MemoryStore {
    async fn resolve_current(&self) -> Result<MonitoringSettings> {
        Ok(self.get_current().await?.unwrap_or_default())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_current(&self) -> Result<Option<MonitoringSettings>> {
        let state = self.state.lock();
        // newest created_at wins; on ties the later insertion wins
        let newest = state
            .settings
            .iter()
            .enumerate()
            .max_by_key(|(index, s)| (s.created_at, *index))
            .map(|(_, s)| s.clone());
        Ok(newest)
    }

    async fn create(&self, input: SettingsInput) -> Result<MonitoringSettings> {
        input.validate()?;
        let settings = new_settings(&input);
        self.state.lock().settings.push(settings.clone());
        Ok(settings)
    }

    async fn update_or_create(&self, input: SettingsInput) -> Result<MonitoringSettings> {
        input.validate()?;
        let mut state = self.state.lock();

        let newest = state
            .settings
            .iter()
            .enumerate()
            .max_by_key(|(index, s)| (s.created_at, *index))
            .map(|(index, _)| index);

        match newest {
            Some(index) => {
                let current = &mut state.settings[index];
                apply(current, &input);
                current.updated_at = Some(Utc::now());
                Ok(current.clone())
            }
            None => {
                let settings = new_settings(&input);
                state.settings.push(settings.clone());
                Ok(settings)
            }
        }
    }
}

fn new_settings(input: &SettingsInput) -> MonitoringSettings {
    let now = Utc::now();
    let mut settings = MonitoringSettings {
        id: Some(Uuid::new_v4()),
        created_at: Some(now),
        updated_at: Some(now),
        ..MonitoringSettings::default()
    };
    apply(&mut settings, input);
    settings
}

// Callers validate first, so the interval is known to be positive
fn apply(settings: &mut MonitoringSettings, input: &SettingsInput) {
    settings.polling_interval_seconds = input.polling_interval_seconds.unsigned_abs();
    settings.balance_threshold = input.balance_threshold;
    settings.notify_on_balance_below = input.notify_on_balance_below;
    settings.notify_on_balance_above = input.notify_on_balance_above;
}
