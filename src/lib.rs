//! Measures how many on/off toggles per second a pin-control service can
//! sustain. The service is injected through [`PinService`]; [`PicoService`]
//! drives a PicoGPIO board over its serial port.

mod clock;
mod error;
mod harness;
mod measurement;
mod pico;
mod service;

pub use clock::*;
pub use error::*;
pub use harness::*;
pub use measurement::*;
pub use pico::*;
pub use service::*;

pub use serialport;
