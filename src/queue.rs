//! Bounded blocking FIFO transport between threads.
//!
//! This module provides the one-directional building block: a
//! fixed-capacity ring buffer guarded by a mutex and a pair of
//! condition variables, usable from any number of producer and
//! consumer threads at once.

pub mod bounded;

pub use bounded::{BoundedQueue, QueueFull, ReadTimeout, WriteTimeout};
