//! PostgreSQL connection and repositories

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::models::{
    Credential, CredentialInput, MonitoringSettings, Platform, SettingsInput,
};
use crate::monitor::{CredentialSelector, SettingsProvider};

use super::{CredentialStore, SettingsStore};

/// PostgreSQL connection pool
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Create a new PostgreSQL connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Repository for stored exchange credentials
#[derive(Clone)]
pub struct CredentialRepository {
    pool: PgPool,
}

impl CredentialRepository {
    /// Create a new credential repository
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool.clone(),
        }
    }

    /// The active credential, if exactly one row is flagged active
    pub async fn find_active(&self) -> Result<Credential> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT * FROM stored_exchange_credentials
            WHERE is_active = TRUE
            ORDER BY created_at
            LIMIT 2
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rows = rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => row.try_into(),
            (None, _) => Err(Error::NoActiveCredential),
            (Some(_), Some(_)) => {
                warn!("More than one credential is flagged active; refusing to pick one");
                Err(Error::NoActiveCredential)
            }
        }
    }
}

#[async_trait]
impl CredentialSelector for CredentialRepository {
    async fn resolve_active(&self) -> Result<Credential> {
        self.find_active().await
    }
}

#[async_trait]
impl CredentialStore for CredentialRepository {
    async fn list(&self) -> Result<Vec<Credential>> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            "SELECT * FROM stored_exchange_credentials ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Credential::try_from).collect()
    }

    async fn find_by_platform(&self, platform: Platform) -> Result<Option<Credential>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT * FROM stored_exchange_credentials
            WHERE exchange_name = $1 AND wallet_type = $2
            "#,
        )
        .bind(platform.exchange.as_str())
        .bind(platform.wallet_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Credential::try_from).transpose()
    }

    async fn upsert(&self, input: CredentialInput) -> Result<Credential> {
        input.validate()?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            INSERT INTO stored_exchange_credentials (
                id, exchange_name, wallet_type, api_key, encrypted_secret,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
            ON CONFLICT (exchange_name, wallet_type) DO UPDATE SET
                api_key = EXCLUDED.api_key,
                encrypted_secret = EXCLUDED.encrypted_secret,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.exchange.as_str())
        .bind(input.wallet_type.as_str())
        .bind(&input.api_key)
        .bind(&input.encrypted_secret)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn activate(&self, id: Uuid) -> Result<Credential> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Concurrent activations queue on this lock
        sqlx::query("LOCK TABLE stored_exchange_credentials IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE stored_exchange_credentials
            SET is_active = FALSE, updated_at = $1
            WHERE is_active = TRUE AND id <> $2
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            UPDATE stored_exchange_credentials
            SET is_active = TRUE, updated_at = $1
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(Error::not_found("credential", id.to_string()));
        };

        tx.commit().await?;

        let credential = Credential::try_from(row)?;
        info!(credential_id = %id, platform = %credential.platform, "Credential activated");
        Ok(credential)
    }
}

/// Repository for monitoring settings
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool.clone(),
        }
    }
}

#[async_trait]
impl SettingsProvider for SettingsRepository {
    async fn resolve_current(&self) -> Result<MonitoringSettings> {
        Ok(self.get_current().await?.unwrap_or_default())
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get_current(&self) -> Result<Option<MonitoringSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT * FROM monitoring_settings
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(MonitoringSettings::try_from).transpose()
    }

    async fn create(&self, input: SettingsInput) -> Result<MonitoringSettings> {
        input.validate()?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            INSERT INTO monitoring_settings (
                id, polling_interval_seconds, balance_threshold,
                notify_on_balance_below, notify_on_balance_above,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.polling_interval_seconds)
        .bind(input.balance_threshold)
        .bind(input.notify_on_balance_below)
        .bind(input.notify_on_balance_above)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_or_create(&self, input: SettingsInput) -> Result<MonitoringSettings> {
        input.validate()?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("LOCK TABLE monitoring_settings IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, SettingsRow>(
            r#"
            UPDATE monitoring_settings SET
                polling_interval_seconds = $1,
                balance_threshold = $2,
                notify_on_balance_below = $3,
                notify_on_balance_above = $4,
                updated_at = $5
            WHERE id = (
                SELECT id FROM monitoring_settings
                ORDER BY created_at DESC, seq DESC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(input.polling_interval_seconds)
        .bind(input.balance_threshold)
        .bind(input.notify_on_balance_below)
        .bind(input.notify_on_balance_above)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match updated {
            Some(row) => row,
            None => {
                sqlx::query_as::<_, SettingsRow>(
                    r#"
                    INSERT INTO monitoring_settings (
                        id, polling_interval_seconds, balance_threshold,
                        notify_on_balance_below, notify_on_balance_above,
                        created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $6)
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(input.polling_interval_seconds)
                .bind(input.balance_threshold)
                .bind(input.notify_on_balance_below)
                .bind(input.notify_on_balance_above)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        row.try_into()
    }
}

// Database row types for mapping

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    exchange_name: String,
    wallet_type: String,
    api_key: String,
    encrypted_secret: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CredentialRow> for Credential {
    type Error = Error;

    fn try_from(row: CredentialRow) -> Result<Self> {
        Ok(Credential {
            id: row.id,
            platform: Platform::new(row.exchange_name.parse()?, row.wallet_type.parse()?),
            api_key: row.api_key,
            encrypted_secret: row.encrypted_secret,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    id: Uuid,
    polling_interval_seconds: i32,
    balance_threshold: f64,
    notify_on_balance_below: bool,
    notify_on_balance_above: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SettingsRow> for MonitoringSettings {
    type Error = Error;

    fn try_from(row: SettingsRow) -> Result<Self> {
        let polling_interval_seconds = u32::try_from(row.polling_interval_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                Error::validation(format!(
                    "stored polling interval {} is not positive",
                    row.polling_interval_seconds
                ))
            })?;

        Ok(MonitoringSettings {
            id: Some(row.id),
            polling_interval_seconds,
            balance_threshold: row.balance_threshold,
            notify_on_balance_below: row.notify_on_balance_below,
            notify_on_balance_above: row.notify_on_balance_above,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}
