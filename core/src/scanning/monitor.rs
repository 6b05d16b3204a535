use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::warn;

use crate::interface::RadioEvents;

/// Per-channel view of what the decoder has reported so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    pub signal_present: bool,
    pub synced: bool,
    pub snr_db: f32,
    pub ensemble_id: u16,
    pub ensemble_label: String,
    pub detected_service_ids: BTreeSet<u32>,
}

/// Lock-protected [`ScanState`] plus the condition the control thread waits on.
///
/// Decoder threads only ever touch the state through the [`RadioEvents`]
/// handlers; presence and sync changes wake every waiter.
#[derive(Debug, Default)]
pub struct ScanMonitor {
    state: Mutex<ScanState>,
    changed: Condvar,
}

impl ScanMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("scan state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Clears every field ahead of a new channel.
    pub fn reset(&self) {
        *self.lock() = ScanState::default();
    }

    pub fn clear_sync(&self) {
        self.lock().synced = false;
    }

    /// Copy of the current state, taken under the lock.
    pub fn snapshot(&self) -> ScanState {
        self.lock().clone()
    }

    /// Runs `read` with the lock held.
    pub fn with_state<T>(&self, read: impl FnOnce(&ScanState) -> T) -> T {
        read(&self.lock())
    }

    /// Blocks until `ready` holds or `timeout` elapses. Spurious wakeups are
    /// re-checked; the return value is the predicate as seen under the lock
    /// on exit, so a signal racing the deadline still counts.
    pub fn wait_until<F>(&self, timeout: Duration, ready: F) -> bool
    where
        F: Fn(&ScanState) -> bool,
    {
        let guard = self.lock();
        let (guard, _timeout) = self
            .changed
            .wait_timeout_while(guard, timeout, |state| !ready(state))
            .unwrap_or_else(PoisonError::into_inner);
        ready(&guard)
    }

    pub fn wait_for_signal(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| state.signal_present)
    }

    pub fn wait_for_sync(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| state.synced)
    }
}

impl RadioEvents for ScanMonitor {
    fn on_snr(&self, snr_db: f32) {
        self.lock().snr_db = snr_db;
    }

    fn on_sync_change(&self, synced: bool) {
        self.lock().synced = synced;
        self.changed.notify_all();
    }

    fn on_signal_presence(&self, present: bool) {
        self.lock().signal_present = present;
        self.changed.notify_all();
    }

    fn on_service_detected(&self, service_id: u32) {
        self.lock().detected_service_ids.insert(service_id);
    }

    fn on_new_ensemble(&self, ensemble_id: u16) {
        self.lock().ensemble_id = ensemble_id;
    }

    fn on_ensemble_label(&self, label: &str) {
        self.lock().ensemble_label = label.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn handlers_update_only_their_field() {
        let monitor = ScanMonitor::new();
        monitor.on_snr(9.5);
        monitor.on_new_ensemble(0x10AB);
        monitor.on_ensemble_label("first");
        monitor.on_ensemble_label("second ");
        monitor.on_service_detected(0xA001);
        monitor.on_service_detected(0xA001);
        monitor.on_service_detected(0xA002);
        monitor.on_frequency_corrector_change(12, -3);

        let state = monitor.snapshot();
        assert_eq!(state.snr_db, 9.5);
        assert_eq!(state.ensemble_id, 0x10AB);
        assert_eq!(state.ensemble_label, "second ");
        assert_eq!(state.detected_service_ids.len(), 2);
        assert!(!state.signal_present);
        assert!(!state.synced);
    }

    #[test]
    fn reset_clears_everything() {
        let monitor = ScanMonitor::new();
        monitor.on_signal_presence(true);
        monitor.on_sync_change(true);
        monitor.on_service_detected(1);
        monitor.reset();
        assert_eq!(monitor.snapshot(), ScanState::default());
    }

    #[test]
    fn wait_returns_true_when_notified_from_another_thread() {
        let monitor = Arc::new(ScanMonitor::new());
        let notifier = monitor.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            notifier.on_signal_presence(true);
        });

        assert!(monitor.wait_for_signal(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn wait_ignores_unrelated_wakeups() {
        let monitor = Arc::new(ScanMonitor::new());
        let notifier = monitor.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            // Wakes the waiter, but sync is still false.
            notifier.on_signal_presence(true);
        });

        let start = Instant::now();
        assert!(!monitor.wait_for_sync(Duration::from_millis(80)));
        assert!(start.elapsed() >= Duration::from_millis(80));
        handle.join().unwrap();
    }

    #[test]
    fn timed_out_wait_leaves_state_untouched() {
        let monitor = ScanMonitor::new();
        monitor.on_snr(4.25);
        monitor.on_new_ensemble(0x1234);
        monitor.on_ensemble_label("Label  ");
        monitor.on_service_detected(7);
        let before = monitor.snapshot();

        assert!(!monitor.wait_for_sync(Duration::from_millis(10)));
        assert_eq!(monitor.snapshot(), before);
    }

    #[test]
    fn already_satisfied_predicate_returns_immediately() {
        let monitor = ScanMonitor::new();
        monitor.on_sync_change(true);
        let start = Instant::now();
        assert!(monitor.wait_for_sync(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
