//! Deferred execution: one-shot timers with cancellable handles.
//!
//! The player never sleeps or spawns threads. It arms timers on a
//! [`Scheduler`] and the host fires whatever is due by calling
//! [`Player::poll`](super::Player::poll).

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that has come due.
#[derive(Debug, Clone, PartialEq)]
pub struct Due<T> {
    pub handle: TimerHandle,
    pub deadline_ms: f64,
    pub task: T,
}

/// The host's deferred-execution primitive.
pub trait Scheduler<T> {
    /// Arm a one-shot timer `delay_ms` after `now_ms`.
    fn defer(&mut self, now_ms: f64, delay_ms: f64, task: T) -> TimerHandle;

    /// Disarm one timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    fn cancel_all(&mut self);

    fn next_deadline(&self) -> Option<f64>;

    /// Remove the earliest timer whose deadline is at or before `now_ms`.
    /// Timers with equal deadlines come out in the order they were armed.
    fn pop_due(&mut self, now_ms: f64) -> Option<Due<T>>;

    fn pending(&self) -> usize;
}

/// Deadline-ordered timer list.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: VecDeque<Due<T>>,
    next_id: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
        }
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> for TimerQueue<T> {
    fn defer(&mut self, now_ms: f64, delay_ms: f64, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let deadline_ms = now_ms + delay_ms.max(0.0);
        // Insert after every entry with an equal or earlier deadline.
        let at = self.entries.partition_point(|e| e.deadline_ms <= deadline_ms);
        self.entries.insert(
            at,
            Due {
                handle,
                deadline_ms,
                task,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|e| e.handle == handle) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    fn cancel_all(&mut self) {
        self.entries.clear();
    }

    fn next_deadline(&self) -> Option<f64> {
        self.entries.front().map(|e| e.deadline_ms)
    }

    fn pop_due(&mut self, now_ms: f64) -> Option<Due<T>> {
        if self.entries.front()?.deadline_ms <= now_ms {
            self.entries.pop_front()
        } else {
            None
        }
    }

    fn pending(&self) -> usize {
        self.entries.len()
    }
}
