//! Threshold evaluation

use crate::models::{CrossingDecision, MonitoringSettings};

/// Compare a balance against the configured threshold.
///
/// Below is checked first. Equality never counts as a crossing.
pub fn evaluate(balance: f64, settings: &MonitoringSettings) -> CrossingDecision {
    let threshold = settings.balance_threshold;

    if settings.notify_on_balance_below && balance < threshold {
        CrossingDecision::Below
    } else if settings.notify_on_balance_above && balance > threshold {
        CrossingDecision::Above
    } else {
        CrossingDecision::None
    }
}
