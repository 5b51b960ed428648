//! Monitoring settings data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Polling interval reported when no settings record exists
pub const DEFAULT_POLLING_INTERVAL_SECONDS: u32 = 60;

/// Threshold configuration consulted by every check cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Record identifier (`None` for the built-in default)
    pub id: Option<Uuid>,

    /// Seconds between two scheduled checks
    pub polling_interval_seconds: u32,

    /// Balance boundary, same unit as the fetched balance
    pub balance_threshold: f64,

    /// Alert when the balance drops below the threshold
    pub notify_on_balance_below: bool,

    /// Alert when the balance rises above the threshold
    pub notify_on_balance_above: bool,

    /// When the record was created
    pub created_at: Option<DateTime<Utc>>,

    /// When the record was last updated
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            id: None,
            polling_interval_seconds: DEFAULT_POLLING_INTERVAL_SECONDS,
            balance_threshold: 0.0,
            notify_on_balance_below: false,
            notify_on_balance_above: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl MonitoringSettings {
    /// Whether this is the built-in fallback rather than a stored record
    pub fn is_default(&self) -> bool {
        self.id.is_none()
    }
}

/// Input for writing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsInput {
    /// Seconds between checks, must be positive
    pub polling_interval_seconds: i32,
    /// Balance boundary
    pub balance_threshold: f64,
    /// Alert when the balance drops below the threshold
    pub notify_on_balance_below: bool,
    /// Alert when the balance rises above the threshold
    pub notify_on_balance_above: bool,
}

impl SettingsInput {
    /// Reject values the monitor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.polling_interval_seconds <= 0 {
            return Err(Error::validation(
                "polling_interval_seconds must be greater than zero",
            ));
        }
        if !self.balance_threshold.is_finite() {
            return Err(Error::validation("balance_threshold must be a finite number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = MonitoringSettings::default();
        assert!(settings.is_default());
        assert_eq!(settings.balance_threshold, 0.0);
        assert!(!settings.notify_on_balance_below);
        assert!(!settings.notify_on_balance_above);
        assert!(settings.polling_interval_seconds > 0);
    }

    #[test]
    fn test_input_validation() {
        let mut input = SettingsInput {
            polling_interval_seconds: 60,
            balance_threshold: 1000.0,
            notify_on_balance_below: true,
            notify_on_balance_above: false,
        };
        assert!(input.validate().is_ok());

        input.polling_interval_seconds = 0;
        assert!(input.validate().is_err());

        input.polling_interval_seconds = 10;
        input.balance_threshold = f64::NAN;
        assert!(input.validate().is_err());
    }
}
