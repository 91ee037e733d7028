//! Debounced autosave with a single in-flight slot.
//!
//! The scheduler performs no I/O and owns no timer. The host drives it:
//! - [`schedule`](AutosaveScheduler::schedule) on every edit, restarting the
//!   quiet period and replacing the waiting snapshot
//! - [`save_now`](AutosaveScheduler::save_now) for an explicit save
//! - [`poll`](AutosaveScheduler::poll) when [`next_deadline`](AutosaveScheduler::next_deadline)
//!   passes and after every completion, to receive the next request
//! - [`complete`](AutosaveScheduler::complete) with the store's answer
//!
//! At most one request is outstanding. A snapshot that becomes due while one
//! is outstanding waits, and is handed out by the first `poll` after the
//! outstanding request completes. The scheduler never drops a snapshot on
//! its own; a waiting one is only superseded by a newer one.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use smol_str::SmolStr;
use web_time::Instant;

/// Identifies one emitted save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveId(u64);

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "save#{}", self.0)
    }
}

/// A save the host must perform and then report with `complete`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest<T> {
    pub id: SaveId,
    pub snapshot: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AutosaveStatus {
    #[default]
    Idle,
    Saving,
    Saved {
        at: DateTime<Utc>,
    },
    Error {
        reason: SmolStr,
    },
}

#[derive(Debug)]
pub struct AutosaveScheduler<T> {
    delay: Duration,
    waiting: Option<T>,
    deadline: Option<Instant>,
    /// The waiting snapshot should go out as soon as the slot is free.
    due: bool,
    in_flight: Option<SaveId>,
    next_id: u64,
    status: AutosaveStatus,
}

impl<T> AutosaveScheduler<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            waiting: None,
            deadline: None,
            due: false,
            in_flight: None,
            next_id: 0,
            status: AutosaveStatus::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn status(&self) -> &AutosaveStatus {
        &self.status
    }

    pub fn in_flight(&self) -> Option<SaveId> {
        self.in_flight
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a snapshot is waiting for its deadline or for the slot.
    pub fn has_waiting(&self) -> bool {
        self.waiting.is_some()
    }

    /// When the host should next call `poll`. `None` when nothing is
    /// waiting on a timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record an edit. Restarts the quiet period unless the waiting snapshot
    /// is already due, in which case it is just replaced.
    pub fn schedule(&mut self, snapshot: T, now: Instant) {
        self.waiting = Some(snapshot);
        if !self.due {
            self.deadline = Some(now + self.delay);
        }
        tracing::trace!(target: "folio::autosave", deadline = ?self.deadline, "autosave scheduled");
    }

    /// Make `snapshot` due immediately, cancelling the pending deadline.
    pub fn save_now(&mut self, snapshot: T) {
        self.waiting = Some(snapshot);
        self.deadline = None;
        self.due = true;
    }

    /// Hand out the next request, if one is due and the slot is free.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest<T>> {
        if self.deadline.is_some_and(|d| now >= d) {
            self.deadline = None;
            self.due = true;
        }
        if !self.due {
            return None;
        }
        if let Some(outstanding) = self.in_flight {
            tracing::debug!(target: "folio::autosave", %outstanding, "save due while another is in flight; queued");
            return None;
        }
        let snapshot = self.waiting.take()?;
        self.due = false;
        self.next_id += 1;
        let id = SaveId(self.next_id);
        self.in_flight = Some(id);
        self.status = AutosaveStatus::Saving;
        tracing::debug!(target: "folio::autosave", %id, "save request emitted");
        Some(SaveRequest { id, snapshot })
    }

    /// Report the outcome of request `id`. Returns false, changing nothing,
    /// when `id` is not the outstanding request (for example after `cancel`).
    pub fn complete(&mut self, id: SaveId, result: Result<DateTime<Utc>, SmolStr>) -> bool {
        if self.in_flight != Some(id) {
            tracing::debug!(target: "folio::autosave", %id, "discarding result of stale save");
            return false;
        }
        self.in_flight = None;
        self.status = match result {
            Ok(at) => AutosaveStatus::Saved { at },
            Err(reason) => {
                tracing::warn!(target: "folio::autosave", %id, %reason, "save failed");
                AutosaveStatus::Error { reason }
            }
        };
        true
    }

    /// Edit the waiting snapshot in place, or drop it when `keep` returns
    /// false.
    pub fn retain_waiting(&mut self, keep: impl FnOnce(&mut T) -> bool) {
        if let Some(snapshot) = self.waiting.as_mut() {
            if !keep(snapshot) {
                self.waiting = None;
                self.deadline = None;
                self.due = false;
            }
        }
    }

    /// Teardown: forget the waiting snapshot and the deadline. A result for
    /// the request already in flight will be discarded.
    pub fn cancel(&mut self) {
        self.waiting = None;
        self.deadline = None;
        self.due = false;
        self.in_flight = None;
        self.status = AutosaveStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(2000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn saved() -> Result<DateTime<Utc>, SmolStr> {
        Ok(DateTime::<Utc>::UNIX_EPOCH)
    }

    #[test]
    fn test_debounce_coalesces() {
        let t0 = Instant::now();
        let mut s = AutosaveScheduler::new(DELAY);
        for (i, at) in [0, 300, 900, 1500].into_iter().enumerate() {
            s.schedule(i, t0 + ms(at));
        }
        assert_eq!(s.next_deadline(), Some(t0 + ms(3500)));
        assert!(s.poll(t0 + ms(3499)).is_none());

        let request = s.poll(t0 + ms(3500)).unwrap();
        assert_eq!(request.snapshot, 3);
        assert!(s.poll(t0 + ms(9000)).is_none());
        assert_eq!(s.status(), &AutosaveStatus::Saving);
    }

    #[test]
    fn test_one_in_flight_then_queued() {
        let t0 = Instant::now();
        let mut s = AutosaveScheduler::new(DELAY);
        s.schedule("a", t0);
        let first = s.poll(t0 + DELAY).unwrap();

        s.schedule("b", t0 + ms(2100));
        assert!(s.poll(t0 + ms(4100)).is_none());
        assert!(s.has_waiting());

        assert!(s.complete(first.id, saved()));
        let second = s.poll(t0 + ms(4200)).unwrap();
        assert_eq!(second.snapshot, "b");
        assert_ne!(second.id, first.id);
    }

    #[test]
    fn test_save_now_skips_delay_but_respects_slot() {
        let t0 = Instant::now();
        let mut s = AutosaveScheduler::new(DELAY);
        s.schedule(1, t0);
        s.save_now(2);
        assert_eq!(s.next_deadline(), None);
        let first = s.poll(t0).unwrap();
        assert_eq!(first.snapshot, 2);

        s.save_now(3);
        assert!(s.poll(t0).is_none());
        // an edit while due replaces the snapshot without restarting the timer
        s.schedule(4, t0);
        assert_eq!(s.next_deadline(), None);
        s.complete(first.id, saved());
        assert_eq!(s.poll(t0).unwrap().snapshot, 4);
    }

    #[test]
    fn test_failure_sets_error_status() {
        let t0 = Instant::now();
        let mut s = AutosaveScheduler::new(DELAY);
        s.save_now(());
        let request = s.poll(t0).unwrap();
        s.complete(request.id, Err("offline".into()));
        assert_eq!(
            s.status(),
            &AutosaveStatus::Error {
                reason: "offline".into()
            }
        );
    }

    #[test]
    fn test_cancel_discards_late_result() {
        let t0 = Instant::now();
        let mut s = AutosaveScheduler::new(DELAY);
        s.save_now(1);
        let request = s.poll(t0).unwrap();
        s.schedule(2, t0);
        s.cancel();
        assert!(!s.complete(request.id, saved()));
        assert!(s.poll(t0 + ms(10_000)).is_none());
        assert_eq!(s.status(), &AutosaveStatus::Idle);
    }
}
