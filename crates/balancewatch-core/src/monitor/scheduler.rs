//! Continuous polling mode
//!
//! A single task runs `check_once`, sleeps for the interval taken from the
//! current settings, and repeats until stopped. Stop requests are honoured
//! while sleeping and before a tick starts; a cycle already in progress is
//! allowed to finish.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::models::CheckResult;

use super::service::MonitorLoop;

/// Receives the outcome of every scheduled cycle
pub trait CheckObserver: Send + Sync {
    /// A cycle completed
    fn on_check(&self, result: &CheckResult);

    /// A cycle failed; the schedule keeps running
    fn on_error(&self, error: &Error);
}

/// Observer that writes cycle outcomes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CheckObserver for TracingObserver {
    fn on_check(&self, result: &CheckResult) {
        info!(
            balance = result.balance,
            threshold = result.threshold,
            decision = ?result.decision,
            notification_sent = result.notification_sent,
            "Balance check completed"
        );
    }

    fn on_error(&self, error: &Error) {
        match error {
            Error::NoActiveCredential => warn!("Balance check skipped: no active credential"),
            other => error!(error = %other, "Balance check failed"),
        }
    }
}

/// Handle to a running continuous monitor
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Whether the polling task is still alive
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Token that stops the schedule when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the schedule and wait for the task to exit
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Monitor task ended abnormally");
        }
    }
}

impl MonitorLoop {
    /// Start polling in the background
    pub fn start_continuous(self: &Arc<Self>, observer: Arc<dyn CheckObserver>) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let monitor = Arc::clone(self);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!(
                cooldown_secs = monitor.cooldown().num_seconds(),
                "Starting balance monitor"
            );

            while !token.is_cancelled() {
                match monitor.check_once().await {
                    Ok(result) => observer.on_check(&result),
                    Err(e) => observer.on_error(&e),
                }

                let interval = monitor.polling_interval().await;

                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
            }

            info!("Balance monitor stopped");
        });

        MonitorHandle { cancel, task }
    }
}
