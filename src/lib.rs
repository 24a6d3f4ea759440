//! Blocking communication primitives for threads within one process.
//!
//! Two building blocks:
//!
//! - [`BoundedQueue`] - a fixed-capacity blocking FIFO that moves owned
//!   values between any threads holding a shared reference
//! - [`Channel`] - a bidirectional medium built from two such queues,
//!   routing "owner" threads and undeclared "worker" threads to opposite
//!   ends of each direction
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use weft::Channel;
//!
//! // The constructing thread is the implicit owner of both directions.
//! let channel = Channel::new(4, 4);
//!
//! thread::scope(|scope| {
//!     // A thread with no declared role is a worker: it drains what the
//!     // owner writes and sends results back.
//!     scope.spawn(|| {
//!         let n: u32 = channel.read();
//!         channel.write(n * 2);
//!     });
//!
//!     channel.write(21);
//!     assert_eq!(channel.read(), 42);
//! });
//! ```
//!
//! There is no intrinsic shutdown state: by convention, an
//! `Option`-typed payload uses `None` as the "no more work" sentinel,
//! and the primitives transport it like any other value.

pub mod channel;
pub mod queue;
mod trace;

pub use channel::Channel;
pub use queue::{BoundedQueue, QueueFull, ReadTimeout, WriteTimeout};
pub use trace::init_tracing;
