//! The toggle loop and its report.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use log::debug;

use crate::clock::Clock;
use crate::error::BenchError;
use crate::measurement::Measurement;
use crate::service::{Connection, PinService};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    pub pin: usize,
    /// Number of on/off pairs; the loop issues twice as many writes.
    pub toggles: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub tool: String,
    pub toggles: u32,
    pub elapsed: Duration,
    pub rate: u64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} did {} toggles per second", self.tool, self.rate)
    }
}

/// Connects to `service`, toggles `config.pin` `config.toggles` times and
/// writes the report line to `out`.
///
/// The session is released before returning, also when any step fails. On
/// failure nothing is written to `out`.
pub fn run<P, C, W>(
    service: &mut P,
    clock: &mut C,
    config: &BenchConfig,
    out: &mut W,
) -> Result<Report, BenchError>
where
    P: PinService,
    C: Clock,
    W: Write,
{
    let tool = service.name().to_owned();
    let mut connection = Connection::open(service)?;

    debug!("toggling pin {} {} times", config.pin, config.toggles);
    let start = clock.now();
    for _ in 0..config.toggles {
        connection.write(config.pin, true)?;
        connection.write(config.pin, false)?;
    }
    let end = clock.now();

    let measurement = Measurement {
        iterations: config.toggles,
        start,
        end,
    };
    let report = Report {
        tool,
        toggles: config.toggles,
        elapsed: measurement.elapsed()?,
        rate: measurement.rate()?,
    };
    debug!("{} toggles took {:?}", report.toggles, report.elapsed);

    writeln!(out, "{report}")?;
    connection.release();
    Ok(report)
}
