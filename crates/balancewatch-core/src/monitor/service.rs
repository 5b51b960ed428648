//! The check cycle

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{CheckResult, CrossingDecision, DEFAULT_POLLING_INTERVAL_SECONDS};

use super::debounce::NotificationDebouncer;
use super::evaluator::evaluate;
use super::parse::parse_balance;
use super::{BalanceSource, CredentialSelector, NotificationSink, SettingsProvider};

// chrono panics on second counts beyond i64::MAX / 1000
const MAX_COOLDOWN_SECONDS: u64 = (i64::MAX / 1000) as u64;

/// Source of "now" for check timestamps and cooldown decisions
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Orchestrates check cycles for one account.
///
/// The debouncer lives behind an async mutex that is held for the whole cycle,
/// so cycles never overlap no matter how many callers share the loop.
pub struct MonitorLoop {
    credentials: Arc<dyn CredentialSelector>,
    settings: Arc<dyn SettingsProvider>,
    source: Arc<dyn BalanceSource>,
    sink: Arc<dyn NotificationSink>,
    cooldown: Duration,
    default_interval: StdDuration,
    clock: Arc<dyn Clock>,
    debouncer: Mutex<NotificationDebouncer>,
}

impl MonitorLoop {
    /// Create a monitor with the given alert cooldown
    pub fn new(
        credentials: Arc<dyn CredentialSelector>,
        settings: Arc<dyn SettingsProvider>,
        source: Arc<dyn BalanceSource>,
        sink: Arc<dyn NotificationSink>,
        cooldown_seconds: u64,
    ) -> Self {
        Self {
            credentials,
            settings,
            source,
            sink,
            cooldown: Duration::seconds(cooldown_seconds.min(MAX_COOLDOWN_SECONDS) as i64),
            default_interval: StdDuration::from_secs(DEFAULT_POLLING_INTERVAL_SECONDS.into()),
            clock: Arc::new(SystemClock),
            debouncer: Mutex::new(NotificationDebouncer::new()),
        }
    }

    /// Interval used by continuous mode while no settings record exists
    pub fn with_default_interval(mut self, interval: StdDuration) -> Self {
        self.default_interval = interval;
        self
    }

    /// Replace the clock (tests)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured cooldown between alerts
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// When the last alert was delivered
    pub async fn last_notification_at(&self) -> Option<DateTime<Utc>> {
        self.debouncer.lock().await.last_fired_at()
    }

    /// Run one check cycle
    pub async fn check_once(&self) -> Result<CheckResult> {
        let mut debouncer = self.debouncer.lock().await;

        let credential = self.credentials.resolve_active().await?;
        let settings = self.settings.resolve_current().await?;

        debug!(
            platform = %credential.platform,
            credential_id = %credential.id,
            default_settings = settings.is_default(),
            "Fetching balance"
        );

        let raw = self.source.fetch(&credential).await?;
        let balance = parse_balance(&raw.total_balance)?;

        let threshold = settings.balance_threshold;
        let decision = evaluate(balance, &settings);
        let now = self.clock.now();

        debug!(balance, threshold, decision = ?decision, "Evaluated balance");

        let notification_sent = if !decision.is_crossing() {
            false
        } else if debouncer.should_fire(now, self.cooldown) {
            self.sink
                .send_alert(balance, threshold, decision == CrossingDecision::Below)
                .await?;
            debouncer.record_fired(now);

            info!(
                balance,
                threshold,
                direction = ?decision,
                platform = %credential.platform,
                "Balance alert sent"
            );
            true
        } else {
            debug!(
                last_fired_at = ?debouncer.last_fired_at(),
                cooldown_secs = self.cooldown.num_seconds(),
                "Alert suppressed by cooldown"
            );
            false
        };

        Ok(CheckResult {
            balance,
            threshold,
            decision,
            notification_sent,
            timestamp: now,
        })
    }

    /// Polling interval for the next tick, from the current settings
    pub async fn polling_interval(&self) -> StdDuration {
        match self.settings.resolve_current().await {
            Ok(settings) if !settings.is_default() => {
                StdDuration::from_secs(settings.polling_interval_seconds.max(1).into())
            }
            Ok(_) => self.default_interval,
            Err(e) => {
                warn!(error = %e, "Could not read settings, using default polling interval");
                self.default_interval
            }
        }
    }
}
