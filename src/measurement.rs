use std::time::Duration;

use crate::error::BenchError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Timestamps taken around `iterations` toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurement {
    pub iterations: u32,
    pub start: Duration,
    pub end: Duration,
}

impl Measurement {
    pub fn elapsed(&self) -> Result<Duration, BenchError> {
        match self.end.checked_sub(self.start) {
            Some(elapsed) if !elapsed.is_zero() => Ok(elapsed),
            _ => Err(BenchError::Measurement {
                start: self.start,
                end: self.end,
            }),
        }
    }

    /// Toggles per second, truncated.
    pub fn rate(&self) -> Result<u64, BenchError> {
        let nanos = self.elapsed()?.as_nanos();
        let rate = u128::from(self.iterations) * NANOS_PER_SEC / nanos;
        Ok(u64::try_from(rate).unwrap_or(u64::MAX))
    }
}
