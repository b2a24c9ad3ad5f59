use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Returned by a recurring callback to keep or drop its registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Cancel,
}

/// Callback run on the host's primary thread.
pub type RecurringCallback = Box<dyn FnMut() -> TickControl + Send>;

/// The host's cooperative scheduler.
///
/// Callbacks registered here must run on the host's primary thread, one at a
/// time, roughly every `interval`.
pub trait HostScheduler {
    fn register_recurring(&self, interval: Duration, callback: RecurringCallback);
}

struct Entry {
    interval: Duration,
    next_due: Instant,
    callback: RecurringCallback,
}

/// Minimal [`HostScheduler`] for hosts without their own timer loop.
///
/// The owning thread calls [`run_pending`](Self::run_pending) from its main
/// loop; callbacks run on that thread. The first run of a new registration is
/// due immediately.
#[derive(Default)]
pub struct TickScheduler {
    entries: Mutex<Vec<Entry>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback that is due. Returns the number that ran.
    ///
    /// Callbacks may register further callbacks; those are first considered
    /// on the next call.
    pub fn run_pending(&self) -> usize {
        self.run_pending_at(Instant::now())
    }

    fn run_pending_at(&self, now: Instant) -> usize {
        let taken = std::mem::take(&mut *self.lock());
        let mut kept = Vec::with_capacity(taken.len());
        let mut ran = 0;

        for mut entry in taken {
            if entry.next_due > now {
                kept.push(entry);
                continue;
            }
            ran += 1;
            match (entry.callback)() {
                TickControl::Continue => {
                    entry.next_due = now + entry.interval;
                    kept.push(entry);
                }
                TickControl::Cancel => debug!("recurring callback cancelled"),
            }
        }

        let mut entries = self.lock();
        // Registrations made by callbacks landed in the emptied vector.
        kept.append(&mut entries);
        *entries = kept;
        ran
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Earliest due time, if anything is registered.
    pub fn next_due(&self) -> Option<Instant> {
        self.lock().iter().map(|entry| entry.next_due).min()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostScheduler for TickScheduler {
    fn register_recurring(&self, interval: Duration, callback: RecurringCallback) {
        self.lock().push(Entry {
            interval,
            next_due: Instant::now(),
            callback,
        });
    }
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("registrations", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>, cancel_after: usize) -> RecurringCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= cancel_after {
                TickControl::Cancel
            } else {
                TickControl::Continue
            }
        })
    }

    #[test]
    fn first_run_is_due_immediately() {
        let scheduler = TickScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler.register_recurring(Duration::from_secs(60), counting(&calls, usize::MAX));

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Next run is a minute away.
        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn runs_again_after_interval() {
        let scheduler = TickScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler.register_recurring(Duration::from_millis(10), counting(&calls, usize::MAX));

        let start = Instant::now();
        assert_eq!(scheduler.run_pending_at(start), 1);
        assert_eq!(scheduler.run_pending_at(start + Duration::from_millis(5)), 0);
        assert_eq!(scheduler.run_pending_at(start + Duration::from_millis(10)), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cancel_removes_registration() {
        let scheduler = TickScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler.register_recurring(Duration::ZERO, counting(&calls, 2));

        scheduler.run_pending();
        assert_eq!(scheduler.len(), 1);
        scheduler.run_pending();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(scheduler.next_due().is_none());
    }

    #[test]
    fn callback_can_register_without_deadlock() {
        let scheduler = Arc::new(TickScheduler::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let inner_calls = Arc::clone(&calls);
        let handle = Arc::clone(&scheduler);

        scheduler.register_recurring(
            Duration::ZERO,
            Box::new(move || {
                handle.register_recurring(Duration::ZERO, counting(&inner_calls, 1));
                TickControl::Cancel
            }),
        );

        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_empty());
    }
}
