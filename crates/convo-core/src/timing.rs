//! Wall-clock timing for any unit of work.
//!
//! Purely observational: wrapping a call in [`measure`] or a [`Stopwatch`]
//! does not change what the call does.
//!
//! ```rust
//! use convo_core::timing::measure;
//!
//! let (sum, elapsed) = measure(|| (0..1000u64).sum::<u64>());
//! assert_eq!(sum, 499_500);
//! assert!(elapsed.as_secs() < 1);
//! ```

use std::time::{Duration, Instant};

use tracing::debug;

/// Runs `work` and returns its result together with the elapsed time.
pub fn measure<T, F>(work: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = work();
    (value, start.elapsed())
}

/// Named timer started at construction.
///
/// [`finish`](Self::finish) logs the elapsed time at `debug` level.
#[derive(Debug)]
pub struct Stopwatch {
    label: String,
    start: Instant,
}

impl Stopwatch {
    /// Starts a new stopwatch.
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    /// Label given at start.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whole milliseconds since start.
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed().as_millis()
    }

    /// Stops the watch, logs and returns the elapsed time.
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        debug!(label = %self.label, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "timed");
        elapsed
    }
}

/// Formats a duration as milliseconds with two decimals, e.g. `"12.34"`.
pub fn format_ms(duration: Duration) -> String {
    format!("{:.2}", duration.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_returns_value() {
        let (v, elapsed) = measure(|| "done");
        assert_eq!(v, "done");
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_measure_sees_sleep() {
        let ((), elapsed) = measure(|| std::thread::sleep(Duration::from_millis(5)));
        assert!(elapsed >= Duration::from_millis(5));
    }

    #[test]
    fn test_stopwatch() {
        let sw = Stopwatch::start("blur");
        assert_eq!(sw.label(), "blur");
        std::thread::sleep(Duration::from_millis(2));
        assert!(sw.elapsed() >= Duration::from_millis(2));
        assert!(sw.finish() >= Duration::from_millis(2));
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(Duration::from_micros(12_346)), "12.35");
        assert_eq!(format_ms(Duration::ZERO), "0.00");
    }
}
