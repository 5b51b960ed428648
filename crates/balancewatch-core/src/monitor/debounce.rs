//! Notification cooldown tracking

use chrono::{DateTime, Duration, Utc};

/// Suppresses repeat alerts inside a cooldown window.
///
/// A single timestamp is kept regardless of crossing direction, so a swing from
/// below to above inside the window is suppressed as well.
#[derive(Debug, Clone, Default)]
pub struct NotificationDebouncer {
    last_fired_at: Option<DateTime<Utc>>,
}

impl NotificationDebouncer {
    /// Create a debouncer that has never fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an alert may be sent at `now`
    pub fn should_fire(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now - last >= cooldown,
        }
    }

    /// Remember that an alert was delivered at `now`
    pub fn record_fired(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
    }

    /// Time of the last delivered alert
    pub fn last_fired_at(&self) -> Option<DateTime<Utc>> {
        self.last_fired_at
    }
}
