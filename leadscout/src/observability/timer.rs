use std::time::Instant;

/// Measures the wall time of a named unit of work.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer, logs the duration and returns it.
    pub fn finish(self) -> f64 {
        let duration_ms = self.elapsed_ms();
        tracing::debug!(span = %self.name, duration_ms, "Finished");
        duration_ms
    }
}
