use std::thread;
use std::time::{Duration, Instant};

/// Keeps successive requests at least `interval` apart.
///
/// The first call never waits; every later call sleeps off whatever is left
/// of the interval since the previous one.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next request may go out and returns the time slept.
    pub fn wait(&mut self) -> Duration {
        let slept = match self.last {
            Some(last) => {
                let remaining = self.interval.saturating_sub(last.elapsed());
                if !remaining.is_zero() {
                    thread::sleep(remaining);
                }
                remaining
            }
            None => Duration::ZERO,
        };
        self.last = Some(Instant::now());
        slept
    }
}
