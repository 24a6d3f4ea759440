//! Fan-out/fan-in worker-pool demo over a single channel.
//!
//! Producers declare write-ownership and push work into the down queue;
//! workers (no declared role) drain it and push results into the up
//! queue; collectors declare read-ownership and drain the results. The
//! main thread only builds the channel, renounces both directions, and
//! joins.
//!
//! Usage:
//!     cargo run --release --bin pipeline
//!
//! Environment variables:
//!     PRODUCERS=4      Producer thread count
//!     COLLECTORS=4     Collector thread count
//!     WORKERS=8        Worker thread count
//!     BASE_UNIT=10000  Messages per producer-collector pair

use std::env;
use std::thread;
use std::time::Instant;

use weft::Channel;

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn producer(channel: &Channel<Option<u64>>, quota: usize, sentinels: usize) {
    channel.become_a_write_owner();
    channel.become_a_non_reader();

    for i in 0..quota {
        channel.write(Some(i as u64));
    }

    // Shut the workers down once the work runs out. Each sentinel stops
    // exactly one worker.
    for _ in 0..sentinels {
        channel.write(None);
    }
}

fn worker(channel: &Channel<Option<u64>>) {
    loop {
        let Some(value) = channel.read() else {
            break;
        };
        channel.write(Some(value));
    }
}

fn collector(channel: &Channel<Option<u64>>, quota: usize) -> u64 {
    channel.become_a_read_owner();
    channel.become_a_non_writer();

    let mut checksum = 0u64;
    for _ in 0..quota {
        let value = channel.read().expect("collectors never receive sentinels");
        checksum = checksum.wrapping_add(value);
    }
    checksum
}

fn main() {
    weft::init_tracing();

    let producers = env_usize("PRODUCERS", 4);
    let collectors = env_usize("COLLECTORS", 4);
    let workers = env_usize("WORKERS", 2 * producers);
    let base_unit = env_usize("BASE_UNIT", 10_000);

    let total = producers * collectors * base_unit;
    let per_producer = total / producers;
    let per_collector = total / collectors;

    let channel: Channel<Option<u64>> = Channel::new(8192, 1024);
    channel.become_a_non_reader();
    channel.become_a_non_writer();
    let channel = &channel;

    let start = Instant::now();

    let checksum: u64 = thread::scope(|scope| {
        let handles: Vec<_> = (0..collectors)
            .map(|_| scope.spawn(|| collector(channel, per_collector)))
            .collect();

        for _ in 0..workers {
            scope.spawn(|| worker(channel));
        }

        for p in 0..producers {
            // Spread the worker-shutdown sentinels across the producers.
            let sentinels = workers / producers + usize::from(p < workers % producers);
            scope.spawn(move || producer(channel, per_producer, sentinels));
        }

        handles
            .into_iter()
            .map(|handle| handle.join().expect("collector threads never panic"))
            .fold(0u64, u64::wrapping_add)
    });

    let elapsed = start.elapsed();
    println!("{total} messages through {workers} workers in {elapsed:?} (checksum {checksum})");
}
