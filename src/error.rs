use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::service::ServiceError;

/// Everything that can end a benchmark run. None of these are retried.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The pin-control service could not be reached.
    #[error("cannot connect to {service}")]
    Connection {
        service: String,
        #[source]
        source: ServiceError,
    },

    /// A pin write was rejected or lost.
    #[error("writing {value} to pin {pin} failed")]
    Write {
        pin: usize,
        value: u8,
        #[source]
        source: ServiceError,
    },

    /// The clock did not advance across the write loop.
    #[error("elapsed time is not positive (start {start:?}, end {end:?})")]
    Measurement { start: Duration, end: Duration },

    #[error("cannot write report")]
    Report(#[from] io::Error),
}
