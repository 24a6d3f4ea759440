//! Bounded blocking MPMC queue for in-process (inter-thread) communication.
//!
//! A fixed-capacity FIFO using a ring buffer guarded by one mutex and two
//! condition variables (classic monitor discipline: the mutex is released
//! while a thread waits).
//!
//! # Overview
//!
//! - [`BoundedQueue::write`] / [`BoundedQueue::read`] - block until the
//!   queue has room / a value
//! - [`BoundedQueue::try_write`] / [`BoundedQueue::try_read`] - never block
//! - [`BoundedQueue::timed_write`] / [`BoundedQueue::timed_read`] - block up
//!   to a deadline, then report timeout with no state change
//!
//! Any number of threads may produce and consume concurrently through a
//! shared reference. Values are delivered strictly in the order their
//! writes completed; writers racing for the lock are served in
//! lock-acquisition order, with no further fairness guarantee.
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use weft::BoundedQueue;
//!
//! let queue = BoundedQueue::new(2);
//!
//! thread::scope(|scope| {
//!     scope.spawn(|| {
//!         assert_eq!(queue.read(), 1);
//!         assert_eq!(queue.read(), 2);
//!     });
//!
//!     queue.write(1);
//!     queue.write(2);
//! });
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use minstant::Instant;
use thiserror::Error;

/// Returned by [`BoundedQueue::try_write`] when the queue has no free slot.
///
/// Carries the undelivered value so the caller can retry or dispose of it.
#[derive(Debug, Error)]
#[error("queue is full")]
pub struct QueueFull<T>(pub T);

/// Returned by [`BoundedQueue::timed_write`] when the deadline elapses
/// before a slot frees up. Carries the undelivered value.
#[derive(Debug, Error)]
#[error("timed out waiting for queue capacity")]
pub struct WriteTimeout<T>(pub T);

/// Returned by [`BoundedQueue::timed_read`] when the deadline elapses
/// before a value arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out waiting for a value")]
pub struct ReadTimeout;

/// Ring state protected by the queue mutex.
///
/// Invariant: `occupancy` equals completed writes minus completed reads,
/// and whenever `occupancy > 0` the slot at `read_index` holds a value.
struct Ring<T> {
    slots: Box<[Option<T>]>,
    read_index: usize,
    write_index: usize,
    occupancy: usize,
}

impl<T> Ring<T> {
    fn is_full(&self) -> bool {
        self.occupancy == self.slots.len()
    }

    fn is_empty(&self) -> bool {
        self.occupancy == 0
    }

    fn store(&mut self, value: T) {
        debug_assert!(!self.is_full());
        self.slots[self.write_index] = Some(value);
        self.write_index = (self.write_index + 1) % self.slots.len();
        self.occupancy += 1;
    }

    fn take(&mut self) -> T {
        debug_assert!(!self.is_empty());
        let value = self.slots[self.read_index]
            .take()
            .expect("slot at read_index holds a value while occupancy > 0");
        self.read_index = (self.read_index + 1) % self.slots.len();
        self.occupancy -= 1;
        value
    }
}

/// Bounded blocking MPMC queue.
///
/// The capacity is fixed at construction. Ownership of a value moves into
/// the queue on `write` and back out on `read`; non-blocking and timed
/// writes that fail hand the value back inside the error.
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    /// Signalled once per completed write: a value became available.
    readable: Condvar,
    /// Signalled once per completed read: a slot became free.
    writable: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. A zero-capacity queue is a
    /// configuration mistake, not a runtime condition, so construction
    /// refuses to produce one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be greater than 0");

        Self {
            ring: Mutex::new(Ring {
                slots: (0..capacity).map(|_| None).collect(),
                read_index: 0,
                write_index: 0,
                occupancy: 0,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
            capacity,
        }
    }

    /// Moves `value` into the queue, blocking while the queue is full.
    ///
    /// Wakes exactly one waiting reader. Capacity changes by one unit per
    /// operation, so waking a single waiter is always sufficient.
    pub fn write(&self, value: T) {
        let mut ring = self.lock();
        while ring.is_full() {
            ring = self
                .writable
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
        ring.store(value);
        self.readable.notify_one();
    }

    /// Takes the oldest value out of the queue, blocking while the queue
    /// is empty.
    ///
    /// Wakes exactly one waiting writer.
    #[must_use]
    pub fn read(&self) -> T {
        let mut ring = self.lock();
        while ring.is_empty() {
            ring = self
                .readable
                .wait(ring)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let value = ring.take();
        self.writable.notify_one();
        value
    }

    /// Moves `value` into the queue only if a slot is free right now.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] carrying `value` back if the queue is full.
    /// The queue state is untouched in that case.
    pub fn try_write(&self, value: T) -> Result<(), QueueFull<T>> {
        let mut ring = self.lock();
        if ring.is_full() {
            return Err(QueueFull(value));
        }
        ring.store(value);
        self.readable.notify_one();
        Ok(())
    }

    /// Takes the oldest value only if one is available right now.
    ///
    /// Returns `None` if the queue is empty, with no state change.
    #[must_use]
    pub fn try_read(&self) -> Option<T> {
        let mut ring = self.lock();
        if ring.is_empty() {
            return None;
        }
        let value = ring.take();
        self.writable.notify_one();
        Some(value)
    }

    /// Like [`write`](Self::write), but gives up once `timeout` has
    /// elapsed.
    ///
    /// Timeout is reported only after the full duration has passed; a
    /// timed-out call mutates nothing and returns the value for retry.
    ///
    /// # Errors
    ///
    /// Returns [`WriteTimeout`] carrying `value` back on expiry.
    pub fn timed_write(&self, value: T, timeout: Duration) -> Result<(), WriteTimeout<T>> {
        let deadline = Instant::now() + timeout;
        let mut ring = self.lock();
        while ring.is_full() {
            let now = Instant::now();
            if now >= deadline {
                return Err(WriteTimeout(value));
            }
            let (guard, _) = self
                .writable
                .wait_timeout(ring, deadline.duration_since(now))
                .unwrap_or_else(PoisonError::into_inner);
            ring = guard;
        }
        ring.store(value);
        self.readable.notify_one();
        Ok(())
    }

    /// Like [`read`](Self::read), but gives up once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`ReadTimeout`] on expiry, with no state change.
    pub fn timed_read(&self, timeout: Duration) -> Result<T, ReadTimeout> {
        let deadline = Instant::now() + timeout;
        let mut ring = self.lock();
        while ring.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return Err(ReadTimeout);
            }
            let (guard, _) = self
                .readable
                .wait_timeout(ring, deadline.duration_since(now))
                .unwrap_or_else(PoisonError::into_inner);
            ring = guard;
        }
        let value = ring.take();
        self.writable.notify_one();
        Ok(value)
    }

    /// Instantaneous count of stored-but-unread values.
    ///
    /// Advisory only: under concurrency the count can be stale by the time
    /// the caller looks at it. Intended for diagnostics and tests.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.lock().occupancy
    }

    /// Maximum number of values the queue can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // The ring is only ever mutated under the lock and no caller code runs
    // while it is held, so a poisoned guard still protects consistent
    // state; recover it instead of propagating the poison.
    fn lock(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for BoundedQueue<T> {
    /// A queue of capacity 1, the smallest legal configuration.
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn basic_write_read() {
        let queue = BoundedQueue::new(8);

        queue.write(1u64);
        queue.write(2);

        assert_eq!(queue.read(), 1);
        assert_eq!(queue.read(), 2);
        assert_eq!(queue.try_read(), None);
    }

    #[test]
    fn fifo_across_wraparound() {
        let queue = BoundedQueue::new(4);

        for round in 0..5u64 {
            for i in 0..4 {
                queue.write(round * 10 + i);
            }
            for i in 0..4 {
                assert_eq!(queue.read(), round * 10 + i);
            }
            assert_eq!(queue.try_read(), None);
        }
    }

    #[test]
    fn try_write_full_returns_value() {
        let queue = BoundedQueue::new(2);

        assert!(queue.try_write('a').is_ok());
        assert!(queue.try_write('b').is_ok());

        let QueueFull(rejected) = queue.try_write('c').unwrap_err();
        assert_eq!(rejected, 'c');
        assert_eq!(queue.occupancy(), 2);

        assert_eq!(queue.read(), 'a');
        assert!(queue.try_write('c').is_ok());
    }

    #[test]
    fn try_read_empty_returns_none() {
        let queue: BoundedQueue<u64> = BoundedQueue::new(4);

        assert_eq!(queue.try_read(), None);
        assert_eq!(queue.occupancy(), 0);

        queue.write(7);
        assert_eq!(queue.try_read(), Some(7));
        assert_eq!(queue.try_read(), None);
    }

    #[test]
    fn timed_read_empty_times_out() {
        let queue: BoundedQueue<u64> = BoundedQueue::new(1);
        let timeout = Duration::from_millis(20);

        let start = Instant::now();
        let result = queue.timed_read(timeout);
        let elapsed = start.elapsed();

        assert_eq!(result, Err(ReadTimeout));
        assert!(elapsed >= timeout, "woke after {elapsed:?}");
        assert_eq!(queue.occupancy(), 0);
    }

    #[test]
    fn timed_write_full_times_out_and_returns_value() {
        let queue = BoundedQueue::new(1);
        queue.write('a');

        let timeout = Duration::from_millis(20);
        let start = Instant::now();
        let result = queue.timed_write('b', timeout);
        let elapsed = start.elapsed();

        let Err(WriteTimeout(rejected)) = result else {
            panic!("write into a full queue must time out");
        };
        assert_eq!(rejected, 'b');
        assert!(elapsed >= timeout, "woke after {elapsed:?}");
        assert_eq!(queue.occupancy(), 1);
        assert_eq!(queue.read(), 'a');
    }

    #[test]
    fn timed_operations_succeed_without_waiting_when_ready() {
        let queue = BoundedQueue::new(2);

        assert!(queue.timed_write(1u64, Duration::from_millis(5)).is_ok());
        assert_eq!(queue.timed_read(Duration::from_millis(5)), Ok(1));
    }

    #[test]
    fn occupancy_tracks_writes_and_reads() {
        let queue = BoundedQueue::new(5);
        assert_eq!(queue.occupancy(), 0);

        // Move the indices first so the counts below cross the wrap point.
        for i in 0..3u64 {
            queue.write(i);
        }
        for _ in 0..3 {
            let _ = queue.read();
        }
        assert_eq!(queue.occupancy(), 0);

        for i in 0..5u64 {
            queue.write(i);
            assert_eq!(queue.occupancy(), i as usize + 1);
        }
        for i in (0..5).rev() {
            let _ = queue.read();
            assert_eq!(queue.occupancy(), i);
        }
    }

    #[test]
    fn capacity_accessor() {
        let queue: BoundedQueue<u8> = BoundedQueue::new(17);
        assert_eq!(queue.capacity(), 17);
    }

    #[test]
    fn default_capacity_is_one() {
        let queue: BoundedQueue<u8> = BoundedQueue::default();
        assert_eq!(queue.capacity(), 1);

        queue.write(1);
        assert!(queue.try_write(2).is_err());
    }

    #[test]
    #[should_panic(expected = "queue capacity must be greater than 0")]
    fn zero_capacity_panics() {
        let _ = BoundedQueue::<u64>::new(0);
    }
}
