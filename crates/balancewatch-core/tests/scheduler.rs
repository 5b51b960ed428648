mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use balancewatch::db::{MemoryStore, SettingsStore};
use balancewatch::error::Error;
use balancewatch::models::{CheckResult, SettingsInput};
use balancewatch::monitor::CheckObserver;

use common::{monitor, store_with_active_credential, RecordingSink, ScriptedSource};

#[derive(Default)]
struct CountingObserver {
    checks: Mutex<Vec<CheckResult>>,
    errors: Mutex<usize>,
}

impl CountingObserver {
    fn checks(&self) -> usize {
        self.checks.lock().len()
    }

    fn errors(&self) -> usize {
        *self.errors.lock()
    }
}

impl CheckObserver for CountingObserver {
    fn on_check(&self, result: &CheckResult) {
        self.checks.lock().push(result.clone());
    }

    fn on_error(&self, _error: &Error) {
        *self.errors.lock() += 1;
    }
}

async fn set_interval(store: &MemoryStore, seconds: i32) {
    store
        .update_or_create(SettingsInput {
            polling_interval_seconds: seconds,
            balance_threshold: 1000.0,
            notify_on_balance_below: true,
            notify_on_balance_above: false,
        })
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_polls_at_settings_interval() {
    let store = store_with_active_credential().await;
    set_interval(&store, 60).await;
    let sink = RecordingSink::new();
    let observer = Arc::new(CountingObserver::default());

    let monitor = Arc::new(monitor(&store, ScriptedSource::returning("500"), sink.clone(), 300));
    let handle = monitor.start_continuous(observer.clone());

    tokio::time::sleep(Duration::from_secs(150)).await;

    assert_eq!(observer.checks(), 3);
    assert_eq!(observer.errors(), 0);
    // one alert, the rest fall inside the cooldown
    assert_eq!(sink.attempts(), 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycles_keep_the_schedule_alive() {
    let store = Arc::new(MemoryStore::new());
    set_interval(&store, 30).await;
    let source = ScriptedSource::returning("500");
    let observer = Arc::new(CountingObserver::default());

    let monitor = Arc::new(monitor(&store, source.clone(), RecordingSink::new(), 300));
    let handle = monitor.start_continuous(observer.clone());

    tokio::time::sleep(Duration::from_secs(75)).await;

    assert_eq!(observer.errors(), 3);
    assert_eq!(observer.checks(), 0);
    assert_eq!(source.calls(), 0);
    assert!(handle.is_running());

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_polling() {
    let store = store_with_active_credential().await;
    set_interval(&store, 10).await;
    let source = ScriptedSource::returning("2000");
    let observer = Arc::new(CountingObserver::default());

    let monitor = Arc::new(monitor(&store, source.clone(), RecordingSink::new(), 300));
    let handle = monitor.start_continuous(observer.clone());

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(observer.checks(), 2);

    handle.stop().await;

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(observer.checks(), 2);
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_interval_changes_apply_to_next_sleep() {
    let store = store_with_active_credential().await;
    set_interval(&store, 10).await;
    let observer = Arc::new(CountingObserver::default());

    let monitor = Arc::new(monitor(
        &store,
        ScriptedSource::returning("2000"),
        RecordingSink::new(),
        300,
    ));
    let handle = monitor.start_continuous(observer.clone());

    // ticks at 0, 10 and 20
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(observer.checks(), 3);

    // the sleep already running ends at 30; the one after lasts 100
    set_interval(&store, 100).await;
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(observer.checks(), 4);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_default_interval_without_settings() {
    let store = store_with_active_credential().await;
    let observer = Arc::new(CountingObserver::default());

    let monitor = Arc::new(
        monitor(
            &store,
            ScriptedSource::returning("2000"),
            RecordingSink::new(),
            300,
        )
        .with_default_interval(Duration::from_secs(5)),
    );
    let handle = monitor.start_continuous(observer.clone());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(observer.checks(), 3);

    handle.stop().await;
}
