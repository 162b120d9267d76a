use std::time::Instant;

/// Wall-clock stopwatch started on construction.
#[derive(Debug, Clone, Copy)]
pub struct TimeInterval {
    start: Instant,
}

impl TimeInterval {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Seconds since construction.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for TimeInterval {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` and returns its output with the elapsed seconds.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let interval = TimeInterval::new();
    let out = f();
    (out, interval.elapsed())
}
