//! Balance and check-cycle data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw wallet balance as reported by a balance source
///
/// Amounts are kept as text; the monitor owns numeric parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    /// Total balance (equity) of the wallet
    #[serde(alias = "totalEquity")]
    pub total_balance: String,

    /// Balance available for trading, if the source reports it
    #[serde(default, alias = "walletBalance", skip_serializing_if = "Option::is_none")]
    pub available_balance: Option<String>,
}

impl WalletBalance {
    /// Balance with only the total set
    pub fn total(total_balance: impl Into<String>) -> Self {
        Self {
            total_balance: total_balance.into(),
            available_balance: None,
        }
    }
}

/// Direction in which a balance crossed the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrossingDecision {
    /// No alert condition
    #[default]
    None,
    /// Balance is below the threshold and below-alerts are on
    Below,
    /// Balance is above the threshold and above-alerts are on
    Above,
}

impl CrossingDecision {
    /// Whether an alert condition holds
    pub fn is_crossing(self) -> bool {
        self != CrossingDecision::None
    }
}

/// Outcome of one check cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Balance observed
    pub balance: f64,
    /// Threshold the balance was compared against
    pub threshold: f64,
    /// Crossing evaluated for this cycle
    pub decision: CrossingDecision,
    /// Whether an alert was delivered during this cycle
    pub notification_sent: bool,
    /// When the check ran
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_balance_accepts_exchange_field_names() {
        let balance: WalletBalance =
            serde_json::from_str(r#"{"totalEquity":"5000.50","walletBalance":"4200.00"}"#).unwrap();
        assert_eq!(balance.total_balance, "5000.50");
        assert_eq!(balance.available_balance.as_deref(), Some("4200.00"));

        let balance: WalletBalance = serde_json::from_str(r#"{"totalBalance":"12"}"#).unwrap();
        assert_eq!(balance, WalletBalance::total("12"));
    }
}
