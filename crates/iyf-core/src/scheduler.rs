//! Single-threaded timer queue driving every time-based transition.
//!
//! Timers carry a typed payload rather than a callback; the owner pops due
//! timers with [`TimerQueue::pop_due`] and dispatches on the payload. The
//! queue never reads a clock: callers pass `now`, so tests advance time by
//! handing in later instants.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};

/// Handle for cancelling a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that has come due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    pub deadline: DateTime<Utc>,
    pub payload: T,
}

#[derive(Debug)]
struct Entry<T> {
    deadline: DateTime<Utc>,
    interval: Option<Duration>,
    payload: T,
}

/// The scheduling operations the engine depends on.
pub trait Scheduler<T> {
    /// Runs `payload` once, `delay` after `now`.
    fn schedule_once(&mut self, now: DateTime<Utc>, delay: Duration, payload: T) -> TimerHandle;

    /// Runs `payload` every `interval`, first at `now + interval`.
    fn schedule_repeating(
        &mut self,
        now: DateTime<Utc>,
        interval: Duration,
        payload: T,
    ) -> TimerHandle;

    /// Cancels a timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

/// Deadline-ordered timer queue.
///
/// Timers with equal deadlines fire in the order they were scheduled.
/// Repeating timers re-arm from their own deadline and skip periods that
/// were missed entirely, so a late caller sees one firing, not a burst.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_handle: u64,
    order: BTreeMap<(DateTime<Utc>, TimerHandle), ()>,
    entries: HashMap<TimerHandle, Entry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            order: BTreeMap::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        deadline: DateTime<Utc>,
        interval: Option<Duration>,
        payload: T,
    ) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.order.insert((deadline, handle), ());
        self.entries.insert(
            handle,
            Entry {
                deadline,
                interval,
                payload,
            },
        );
        handle
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.order.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns the earliest timer due at or before `now`.
    ///
    /// Repeating timers are re-armed before being returned.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Option<Fired<T>> {
        let (deadline, handle) = *self.order.keys().next()?;
        if deadline > now {
            return None;
        }
        self.order.remove(&(deadline, handle));

        let interval = self.entries.get(&handle)?.interval;
        let Some(interval) = interval else {
            let entry = self.entries.remove(&handle)?;
            return Some(Fired {
                handle,
                deadline,
                payload: entry.payload,
            });
        };

        let mut next = deadline + interval;
        while next <= now {
            next += interval;
        }
        let entry = self.entries.get_mut(&handle)?;
        entry.deadline = next;
        let payload = entry.payload.clone();
        self.order.insert((next, handle), ());
        Some(Fired {
            handle,
            deadline,
            payload,
        })
    }

    /// Drops every pending timer.
    pub fn cancel_all(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

impl<T: Clone> Scheduler<T> for TimerQueue<T> {
    fn schedule_once(&mut self, now: DateTime<Utc>, delay: Duration, payload: T) -> TimerHandle {
        self.insert(now + delay.max(Duration::zero()), None, payload)
    }

    fn schedule_repeating(
        &mut self,
        now: DateTime<Utc>,
        interval: Duration,
        payload: T,
    ) -> TimerHandle {
        // A zero interval would never advance past `now`.
        let interval = interval.max(Duration::milliseconds(1));
        self.insert(now + interval, Some(interval), payload)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.remove(&handle) {
            Some(entry) => {
                self.order.remove(&(entry.deadline, handle));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, now: DateTime<Utc>) -> Vec<&'static str> {
        std::iter::from_fn(|| queue.pop_due(now).map(|f| f.payload)).collect()
    }

    #[test]
    fn once_fires_at_deadline_only() {
        let mut queue = TimerQueue::new();
        let start = at("2025-01-29T10:00:00Z");
        queue.schedule_once(start, Duration::seconds(2), "check");

        assert!(queue.pop_due(at("2025-01-29T10:00:01Z")).is_none());
        let fired = queue.pop_due(at("2025-01-29T10:00:02Z")).unwrap();
        assert_eq!(fired.payload, "check");
        assert_eq!(fired.deadline, at("2025-01-29T10:00:02Z"));
        assert!(queue.next_deadline().is_none());
    }

    #[test]
    fn ties_fire_in_schedule_order() {
        let mut queue = TimerQueue::new();
        let start = at("2025-01-29T10:00:00Z");
        queue.schedule_once(start, Duration::seconds(1), "a");
        queue.schedule_once(start, Duration::seconds(1), "b");
        queue.schedule_once(start, Duration::zero(), "c");

        assert_eq!(drain(&mut queue, at("2025-01-29T10:00:01Z")), vec!["c", "a", "b"]);
    }

    #[test]
    fn repeating_rearms_from_deadline() {
        let mut queue = TimerQueue::new();
        let start = at("2025-01-29T10:00:00Z");
        queue.schedule_repeating(start, Duration::seconds(30), "poll");

        assert_eq!(drain(&mut queue, at("2025-01-29T10:00:31Z")), vec!["poll"]);
        assert_eq!(queue.next_deadline(), Some(at("2025-01-29T10:01:00Z")));
    }

    #[test]
    fn repeating_skips_missed_periods() {
        let mut queue = TimerQueue::new();
        let start = at("2025-01-29T10:00:00Z");
        queue.schedule_repeating(start, Duration::seconds(30), "poll");

        // Two and a half periods late: one firing, next deadline in the future.
        assert_eq!(drain(&mut queue, at("2025-01-29T10:01:45Z")), vec!["poll"]);
        assert_eq!(queue.next_deadline(), Some(at("2025-01-29T10:02:00Z")));
    }

    #[test]
    fn cancel_removes_timer() {
        let mut queue = TimerQueue::new();
        let start = at("2025-01-29T10:00:00Z");
        let handle = queue.schedule_repeating(start, Duration::seconds(1), "tick");

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(queue.next_deadline().is_none());
        assert!(drain(&mut queue, at("2025-01-29T11:00:00Z")).is_empty());
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut queue = TimerQueue::new();
        let start = at("2025-01-29T10:00:00Z");
        queue.schedule_repeating(start, Duration::seconds(1), "tick");
        queue.schedule_once(start, Duration::minutes(5), "snooze");

        queue.cancel_all();
        assert!(queue.next_deadline().is_none());
        assert!(drain(&mut queue, at("2025-01-29T11:00:00Z")).is_empty());
    }
}
