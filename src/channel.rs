//! Bidirectional owner/worker communication channels.
//!
//! A [`Channel`] pairs two independent [`BoundedQueue`](crate::queue::BoundedQueue)s
//! with a per-thread role protocol: threads that declare ownership of a
//! direction sit at the outer end of that direction's pipe, while
//! undeclared worker threads sit at the inner end of both. The result is
//! a fan-out/fan-in worker-pool topology with no extra configuration.

pub mod duplex;
mod roles;

pub use duplex::Channel;
