//! Round-trip echo demo: the owner thread bounces messages off one worker.
//!
//! Usage:
//!     cargo run --release --bin ping_pong
//!
//! Environment variables:
//!     MESSAGES=100000  Number of round trips

use std::env;
use std::thread;
use std::time::Instant;

use weft::Channel;

fn main() {
    weft::init_tracing();

    let messages: u64 = env::var("MESSAGES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);

    // The main thread is the implicit owner of both directions; the
    // spawned worker has no declared role. `None` is the shutdown
    // sentinel by convention.
    let channel: Channel<Option<u64>> = Channel::new(1, 0);

    let start = Instant::now();
    let mut checksum = 0u64;

    thread::scope(|scope| {
        scope.spawn(|| {
            loop {
                let Some(value) = channel.read() else {
                    break;
                };
                channel.write(Some(value));
            }
        });

        for i in 0..messages {
            channel.write(Some(i));
            let echoed = channel.read().expect("worker echoes before shutdown");
            checksum = checksum.wrapping_add(echoed);
        }

        channel.write(None);
    });

    let elapsed = start.elapsed();
    let expected = (0..messages).sum::<u64>();
    assert_eq!(checksum, expected, "echoed values must match sent values");

    println!("{messages} round trips in {elapsed:?} (checksum {checksum})");
}
