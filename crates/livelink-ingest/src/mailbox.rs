use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::warn;

use crate::config::DeliveryPolicy;

/// Hand-off point between the listener thread and the host scheduler.
///
/// With [`DeliveryPolicy::LatestOnly`] this is a single slot: delivering over
/// an unconsumed payload replaces it. Every replacement is counted and
/// logged so dropped payloads are visible.
#[derive(Debug)]
pub struct Mailbox {
    policy: DeliveryPolicy,
    slots: Mutex<VecDeque<Bytes>>,
    dropped: AtomicU64,
}

impl Mailbox {
    /// Create an empty mailbox.
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self {
            policy,
            slots: Mutex::new(VecDeque::with_capacity(policy.capacity())),
            dropped: AtomicU64::new(0),
        }
    }

    /// Store a payload. Returns the payload evicted to make room, if any.
    pub fn deliver(&self, payload: Bytes) -> Option<Bytes> {
        let mut slots = self.slots();
        let evicted = if slots.len() >= self.policy.capacity() {
            slots.pop_front()
        } else {
            None
        };
        slots.push_back(payload);
        drop(slots);

        if let Some(old) = &evicted {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                dropped_size = old.len(),
                policy = ?self.policy,
                "dropping unconsumed payload"
            );
        }
        evicted
    }

    /// Take the oldest pending payload, leaving its slot empty.
    pub fn take(&self) -> Option<Bytes> {
        self.slots().pop_front()
    }

    /// Discard everything pending. Returns how many payloads were discarded.
    pub fn clear(&self) -> usize {
        let mut slots = self.slots();
        let discarded = slots.len();
        slots.clear();
        discarded
    }

    /// Number of pending payloads.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    /// Payloads evicted before anyone consumed them.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Policy this mailbox was created with.
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    fn slots(&self) -> MutexGuard<'_, VecDeque<Bytes>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn latest_payload_wins() {
        let mailbox = Mailbox::new(DeliveryPolicy::LatestOnly);
        assert!(mailbox.deliver(Bytes::from_static(b"A")).is_none());
        let evicted = mailbox.deliver(Bytes::from_static(b"B"));

        assert_eq!(evicted, Some(Bytes::from_static(b"A")));
        assert_eq!(mailbox.take(), Some(Bytes::from_static(b"B")));
        assert_eq!(mailbox.take(), None);
        assert_eq!(mailbox.dropped_count(), 1);
    }

    #[test]
    fn take_on_empty_is_noop() {
        let mailbox = Mailbox::new(DeliveryPolicy::LatestOnly);
        for _ in 0..10 {
            assert_eq!(mailbox.take(), None);
        }
        assert!(mailbox.is_empty());
        assert_eq!(mailbox.dropped_count(), 0);
    }

    #[test]
    fn bounded_keeps_order_and_drops_oldest() {
        let mailbox = Mailbox::new(DeliveryPolicy::Bounded(2));
        mailbox.deliver(Bytes::from_static(b"1"));
        mailbox.deliver(Bytes::from_static(b"2"));
        assert_eq!(mailbox.len(), 2);

        let evicted = mailbox.deliver(Bytes::from_static(b"3"));
        assert_eq!(evicted, Some(Bytes::from_static(b"1")));
        assert_eq!(mailbox.take(), Some(Bytes::from_static(b"2")));
        assert_eq!(mailbox.take(), Some(Bytes::from_static(b"3")));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn clear_discards_pending() {
        let mailbox = Mailbox::new(DeliveryPolicy::Bounded(4));
        mailbox.deliver(Bytes::from_static(b"x"));
        mailbox.deliver(Bytes::from_static(b"y"));
        assert_eq!(mailbox.clear(), 2);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn concurrent_writer_never_yields_torn_payload() {
        let mailbox = Arc::new(Mailbox::new(DeliveryPolicy::LatestOnly));
        let payloads: Vec<Bytes> = (0..200u32)
            .map(|i| Bytes::from(vec![(i % 256) as u8; 1024]))
            .collect();

        let writer = {
            let mailbox = Arc::clone(&mailbox);
            let payloads = payloads.clone();
            thread::spawn(move || {
                for payload in payloads {
                    mailbox.deliver(payload);
                }
            })
        };

        let mut seen = 0usize;
        while !writer.is_finished() || !mailbox.is_empty() {
            if let Some(payload) = mailbox.take() {
                assert_eq!(payload.len(), 1024);
                assert!(payload.iter().all(|b| *b == payload[0]));
                seen += 1;
            }
        }
        writer.join().unwrap();

        assert!(seen >= 1);
        assert_eq!(seen as u64 + mailbox.dropped_count(), 200);
    }
}
