//! Storage layer for BalanceWatch
//!
//! Credentials and monitoring settings live in PostgreSQL. An in-process store
//! with the same contracts is available for tests and database-less runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{CredentialRepository, PostgresPool, SettingsRepository};

use async_trait::async_trait;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Credential, CredentialInput, MonitoringSettings, Platform, SettingsInput};
use crate::monitor::{CredentialSelector, SettingsProvider};

/// Credential storage, including the write side the monitor never touches
#[async_trait]
pub trait CredentialStore: CredentialSelector {
    /// All credentials, oldest first
    async fn list(&self) -> Result<Vec<Credential>>;

    /// Credential stored for a platform
    async fn find_by_platform(&self, platform: Platform) -> Result<Option<Credential>>;

    /// Insert or replace the key material of a platform. The active flag of
    /// an existing record is left untouched; new records start inactive.
    async fn upsert(&self, input: CredentialInput) -> Result<Credential>;

    /// Make one credential the only active one, atomically
    async fn activate(&self, id: Uuid) -> Result<Credential>;
}

/// Settings storage
#[async_trait]
pub trait SettingsStore: SettingsProvider {
    /// Newest settings record, if any
    async fn get_current(&self) -> Result<Option<MonitoringSettings>>;

    /// Append a new settings record
    async fn create(&self, input: SettingsInput) -> Result<MonitoringSettings>;

    /// Overwrite the current record, creating one if none exists
    async fn update_or_create(&self, input: SettingsInput) -> Result<MonitoringSettings>;
}

/// Database connections bundle
#[derive(Clone)]
pub struct Database {
    /// PostgreSQL connection pool
    pub postgres: PostgresPool,
}

impl Database {
    /// Connect using the configured database
    pub async fn new(config: &Config) -> Result<Self> {
        let postgres = PostgresPool::new(&config.database).await?;
        Ok(Self { postgres })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        self.postgres.migrate().await
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        self.postgres.health_check().await
    }

    /// Credential repository on this database
    pub fn credentials(&self) -> CredentialRepository {
        CredentialRepository::new(&self.postgres)
    }

    /// Settings repository on this database
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(&self.postgres)
    }
}
