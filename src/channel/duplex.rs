//! Bidirectional channel with role-based routing.
//!
//! A channel owns two independent bounded queues:
//!
//! ```text
//! write-owners ──> queue_down ──> workers
//! read-owners  <── queue_up   <── workers
//! ```
//!
//! Which queue an operation touches depends on the calling thread's
//! declared role, so the same `read`/`write` calls wire owners and
//! workers to opposite ends of each pipe. The constructing thread is the
//! implicit owner of both directions; every other thread starts as a
//! worker.
//!
//! Roles are self-service and self-targeted: a thread can only change
//! its own standing. Renouncing a direction with
//! [`Channel::become_a_non_reader`] / [`Channel::become_a_non_writer`]
//! is permanent. Using a renounced direction afterwards, or re-claiming
//! ownership of it, is a broken protocol invariant and panics rather
//! than returning an error.

use std::thread::{self, ThreadId};
use std::time::Duration;

use super::roles::RoleSet;
use crate::queue::{BoundedQueue, QueueFull, ReadTimeout, WriteTimeout};
use crate::trace::{debug, error};

/// Bidirectional MPMC communication medium between owner and worker
/// threads.
///
/// All operations are callable concurrently from any number of threads
/// holding a shared reference; no external locking is needed.
///
/// # Example
///
/// ```
/// use std::thread;
/// use weft::Channel;
///
/// let channel = Channel::new(1, 1);
///
/// thread::scope(|scope| {
///     scope.spawn(|| {
///         // Worker end: drain the down queue, answer on the up queue.
///         let question: u32 = channel.read();
///         channel.write(question + 1);
///     });
///
///     // Owner end: fill the down queue, drain the up queue.
///     channel.write(1);
///     assert_eq!(channel.read(), 2);
/// });
/// ```
pub struct Channel<T> {
    /// Workers -> read-owners.
    queue_up: BoundedQueue<T>,
    /// Write-owners -> workers.
    queue_down: BoundedQueue<T>,

    read_owners: RoleSet,
    write_owners: RoleSet,
    non_readers: RoleSet,
    non_writers: RoleSet,
}

impl<T> Channel<T> {
    /// Creates a channel with independently sized directions.
    ///
    /// `up_capacity` bounds the workers-to-read-owners queue. A
    /// `down_capacity` of 0 is shorthand for "same as `up_capacity`".
    /// The calling thread becomes an implicit read-owner and
    /// write-owner.
    ///
    /// # Panics
    ///
    /// Panics if `up_capacity` is zero.
    #[must_use]
    pub fn new(up_capacity: usize, down_capacity: usize) -> Self {
        let down_capacity = if down_capacity == 0 {
            up_capacity
        } else {
            down_capacity
        };
        let creator = thread::current().id();

        Self {
            queue_up: BoundedQueue::new(up_capacity),
            queue_down: BoundedQueue::new(down_capacity),
            read_owners: RoleSet::with_member(creator),
            write_owners: RoleSet::with_member(creator),
            non_readers: RoleSet::new(),
            non_writers: RoleSet::new(),
        }
    }

    /// Blocking read from the queue this thread's role selects.
    ///
    /// Read-owners drain the up queue; workers drain the down queue.
    ///
    /// # Panics
    ///
    /// Panics if this thread has called
    /// [`become_a_non_reader`](Self::become_a_non_reader).
    #[must_use]
    pub fn read(&self) -> T {
        let id = thread::current().id();
        self.assert_may_read(id);
        self.read_queue(id).read()
    }

    /// Blocking write to the queue this thread's role selects.
    ///
    /// Write-owners fill the down queue; workers fill the up queue.
    ///
    /// # Panics
    ///
    /// Panics if this thread has called
    /// [`become_a_non_writer`](Self::become_a_non_writer).
    pub fn write(&self, value: T) {
        let id = thread::current().id();
        self.assert_may_write(id);
        self.write_queue(id).write(value);
    }

    /// Non-blocking read; `None` if the routed queue is empty right now.
    ///
    /// # Panics
    ///
    /// Panics if this thread is a declared non-reader.
    #[must_use]
    pub fn try_read(&self) -> Option<T> {
        let id = thread::current().id();
        self.assert_may_read(id);
        self.read_queue(id).try_read()
    }

    /// Non-blocking write.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] carrying the value back if the routed queue
    /// has no free slot.
    ///
    /// # Panics
    ///
    /// Panics if this thread is a declared non-writer.
    pub fn try_write(&self, value: T) -> Result<(), QueueFull<T>> {
        let id = thread::current().id();
        self.assert_may_write(id);
        self.write_queue(id).try_write(value)
    }

    /// Blocking read that gives up once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`ReadTimeout`] on expiry, with no state change.
    ///
    /// # Panics
    ///
    /// Panics if this thread is a declared non-reader.
    pub fn timed_read(&self, timeout: Duration) -> Result<T, ReadTimeout> {
        let id = thread::current().id();
        self.assert_may_read(id);
        self.read_queue(id).timed_read(timeout)
    }

    /// Blocking write that gives up once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`WriteTimeout`] carrying the value back on expiry.
    ///
    /// # Panics
    ///
    /// Panics if this thread is a declared non-writer.
    pub fn timed_write(&self, value: T, timeout: Duration) -> Result<(), WriteTimeout<T>> {
        let id = thread::current().id();
        self.assert_may_write(id);
        self.write_queue(id).timed_write(value, timeout)
    }

    /// Occupancy of the queue this thread reads from. Advisory snapshot.
    ///
    /// # Panics
    ///
    /// Panics if this thread is a declared non-reader.
    #[must_use]
    pub fn read_occupancy(&self) -> usize {
        let id = thread::current().id();
        self.assert_may_read(id);
        self.read_queue(id).occupancy()
    }

    /// Occupancy of the queue this thread writes to. Advisory snapshot.
    ///
    /// # Panics
    ///
    /// Panics if this thread is a declared non-writer.
    #[must_use]
    pub fn write_occupancy(&self) -> usize {
        let id = thread::current().id();
        self.assert_may_write(id);
        self.write_queue(id).occupancy()
    }

    /// Declares the calling thread a read-owner: its reads now drain the
    /// up queue.
    ///
    /// # Panics
    ///
    /// Panics if this thread has ever called
    /// [`become_a_non_reader`](Self::become_a_non_reader); that
    /// transition is irrevocable.
    pub fn become_a_read_owner(&self) {
        let id = thread::current().id();
        self.assert_may_read(id);
        self.read_owners.add(id);
        debug!(thread = ?id, "became a read owner");
    }

    /// Declares the calling thread a write-owner: its writes now fill the
    /// down queue.
    ///
    /// # Panics
    ///
    /// Panics if this thread has ever called
    /// [`become_a_non_writer`](Self::become_a_non_writer).
    pub fn become_a_write_owner(&self) {
        let id = thread::current().id();
        self.assert_may_write(id);
        self.write_owners.add(id);
        debug!(thread = ?id, "became a write owner");
    }

    /// Permanently renounces reading on this channel for the calling
    /// thread.
    ///
    /// Any later `read`-family call or
    /// [`become_a_read_owner`](Self::become_a_read_owner) by this thread
    /// panics. Calling this again is a no-op.
    pub fn become_a_non_reader(&self) {
        let id = thread::current().id();
        self.read_owners.remove(id);
        self.non_readers.add(id);
        debug!(thread = ?id, "became a non-reader");
    }

    /// Permanently renounces writing on this channel for the calling
    /// thread.
    pub fn become_a_non_writer(&self) {
        let id = thread::current().id();
        self.write_owners.remove(id);
        self.non_writers.add(id);
        debug!(thread = ?id, "became a non-writer");
    }

    // Roles are self-targeted, so a routing decision made here cannot
    // race with a role change for the calling thread: that thread is
    // busy executing this very operation.
    fn read_queue(&self, id: ThreadId) -> &BoundedQueue<T> {
        if self.read_owners.contains(id) {
            &self.queue_up
        } else {
            &self.queue_down
        }
    }

    fn write_queue(&self, id: ThreadId) -> &BoundedQueue<T> {
        if self.write_owners.contains(id) {
            &self.queue_down
        } else {
            &self.queue_up
        }
    }

    fn assert_may_read(&self, id: ThreadId) {
        if self.non_readers.contains(id) {
            error!(thread = ?id, "read access after become_a_non_reader");
            panic!("thread {id:?} renounced reading on this channel and can never read again");
        }
    }

    fn assert_may_write(&self, id: ThreadId) {
        if self.non_writers.contains(id) {
            error!(thread = ?id, "write access after become_a_non_writer");
            panic!("thread {id:?} renounced writing on this channel and can never write again");
        }
    }
}

impl<T> Default for Channel<T> {
    /// A channel with capacity 1 in both directions.
    fn default() -> Self {
        Self::new(1, 0)
    }
}
