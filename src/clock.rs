use std::time::Instant;

use crate::types::Value;

/// Monotonic source of elapsed seconds.
pub trait Clock {
    fn elapsed_seconds(&self) -> Value;
}

/// Wall clock started at construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed_seconds(&self) -> Value {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock advanced by hand, for hosts with their own time source and for tests.
///
/// Never runs backwards: [`set`](Self::set) ignores earlier times.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    elapsed: Value,
}

impl ManualClock {
    pub fn new(elapsed: Value) -> Self {
        Self {
            elapsed: if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 },
        }
    }

    pub fn set(&mut self, elapsed: Value) {
        if elapsed.is_finite() && elapsed > self.elapsed {
            self.elapsed = elapsed;
        }
    }

    pub fn advance(&mut self, dt: Value) {
        self.set(self.elapsed + dt);
    }
}

impl Clock for ManualClock {
    fn elapsed_seconds(&self) -> Value {
        self.elapsed
    }
}
