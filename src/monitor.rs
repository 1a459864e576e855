//! Fixed-interval polling loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

/// Granularity at which a sleeping loop notices cancellation.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Calls `tick` with a 1-based counter every `interval`, until `running`
/// becomes false. Returns the number of ticks run.
///
/// Ticks start at a fixed rate: the time spent inside `tick` is subtracted
/// from the following sleep. Ticks never overlap; one that outlasts the
/// interval is followed immediately by the next. The sleep is cut into
/// short slices so cancellation takes effect within [`SLEEP_SLICE`].
pub fn run_every<F>(interval: Duration, running: &AtomicBool, mut tick: F) -> u64
where
    F: FnMut(u64),
{
    let mut count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        count += 1;
        let started = Instant::now();
        tick(count);

        let mut remaining = interval.saturating_sub(started.elapsed());
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(SLEEP_SLICE);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    debug!(ticks = count, "polling loop stopped");
    count
}
