//! API handlers for the HTTP REST API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::db::{CredentialStore, Database, SettingsStore};
use crate::error::Error;
use crate::models::{CheckResult, Credential, CredentialInput, MonitoringSettings, SettingsInput};
use crate::monitor::MonitorLoop;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Monitor shared with the polling task
    pub monitor: Arc<MonitorLoop>,
    /// Credential store
    pub credentials: Arc<dyn CredentialStore>,
    /// Settings store
    pub settings: Arc<dyn SettingsStore>,
    /// Database pinged by `/health`; `None` when running on the in-memory store
    pub database: Option<Database>,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Wraps crate errors so handlers can use `?`
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NoActiveCredential => StatusCode::CONFLICT,
            Error::UpstreamFetchFailed(_) | Error::Delivery(_) => StatusCode::BAD_GATEWAY,
            Error::InvalidBalance(_) | Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: String,
    /// Crate version
    pub version: String,
    /// Database reachability, absent without a database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Health check endpoint; 503 when the database does not answer
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => match db.health_check().await {
            Ok(()) => Some("ok"),
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                Some("unavailable")
            }
        },
        None => None,
    };

    let healthy = database.map_or(true, |status| status == "ok");
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.map(str::to_string),
        }),
    )
}

/// Run one check cycle now
pub async fn run_check(State(state): State<AppState>) -> ApiResult<CheckResult> {
    Ok(Json(state.monitor.check_once().await?))
}

/// Monitor status response
#[derive(Serialize)]
pub struct StatusResponse {
    /// Minimum seconds between two alerts
    pub cooldown_seconds: i64,
    /// When the last alert was delivered
    pub last_notification_at: Option<DateTime<Utc>>,
    /// Settings in force
    pub settings: MonitoringSettings,
}

/// Current monitor state
pub async fn status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let settings = state.settings.resolve_current().await?;

    Ok(Json(StatusResponse {
        cooldown_seconds: state.monitor.cooldown().num_seconds(),
        last_notification_at: state.monitor.last_notification_at().await,
        settings,
    }))
}

/// Settings in force (defaults when none are stored)
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<MonitoringSettings> {
    Ok(Json(state.settings.resolve_current().await?))
}

/// Replace the current settings
pub async fn put_settings(
    State(state): State<AppState>,
    Json(input): Json<SettingsInput>,
) -> ApiResult<MonitoringSettings> {
    Ok(Json(state.settings.update_or_create(input).await?))
}

/// List stored credentials (secrets omitted)
pub async fn list_credentials(State(state): State<AppState>) -> ApiResult<Vec<Credential>> {
    Ok(Json(state.credentials.list().await?))
}

/// Create or replace the credential of a platform
pub async fn upsert_credential(
    State(state): State<AppState>,
    Json(input): Json<CredentialInput>,
) -> ApiResult<Credential> {
    Ok(Json(state.credentials.upsert(input).await?))
}

/// Make a credential the active one
pub async fn activate_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<Uuid>,
) -> ApiResult<Credential> {
    Ok(Json(state.credentials.activate(credential_id).await?))
}
