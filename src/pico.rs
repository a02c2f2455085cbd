use std::io;
use std::time::Duration;

use log::{debug, trace};
use readformat::{readf, readf1};
use serialport::SerialPort;
use thiserror::Error;

use crate::service::{PinService, PinSession, ServiceError};

/// Serial port type returned by `open_native` on this platform.
#[cfg(unix)]
pub type NativePort = serialport::TTYPort;
#[cfg(windows)]
pub type NativePort = serialport::COMPort;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PicoGPIOVersion {
    V1_0,
    Unknown,
}

#[derive(Debug, Error)]
pub enum PicoError {
    #[error(transparent)]
    Serial(#[from] serialport::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("PicoGPIO reported an error: {0}")]
    Device(String),
    #[error("invalid data from PicoGPIO: {0:?}")]
    Malformed(String),
    #[error("pin {pin} is outside the {pins} pins this client tracks")]
    PinOutOfRange { pin: usize, pins: usize },
}

/// One line sent back by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Version(PicoGPIOVersion),
    Error(String),
    Digital { pin: usize, high: bool },
    /// Floating, analog, PWM and settings reports. The benchmark never asks
    /// for these but a device may still emit them.
    Ignored,
}

impl Reply {
    pub fn parse(line: &str) -> Result<Self, PicoError> {
        if line.is_empty() || line == "!OK" {
            return Ok(Reply::Ok);
        }
        if let Some(v) = readf1("+PICO_GPIO {}", line) {
            return Ok(Reply::Version(match v.as_str() {
                "V1.0" => PicoGPIOVersion::V1_0,
                _ => PicoGPIOVersion::Unknown,
            }));
        }
        if let Some(err) = readf1("!ERROR:{}", line) {
            return Ok(Reply::Error(err));
        }
        if line.starts_with(['!', '~', '/', '#']) {
            return Ok(Reply::Ignored);
        }
        if let Some([pin, val]) = readf("{}={}", line).as_deref() {
            let malformed = || PicoError::Malformed(line.to_owned());
            let pin = pin.parse::<usize>().map_err(|_| malformed())?;
            let val = val.parse::<u8>().map_err(|_| malformed())?;
            return Ok(Reply::Digital {
                pin,
                high: val != 0,
            });
        }
        Err(PicoError::Malformed(line.to_owned()))
    }
}

pub struct PicoGPIO<Port: SerialPort, const PINS: usize = 256> {
    port: Port,
    // Pin states as last reported by the device
    actual: [Option<bool>; PINS],
}

impl<Port: SerialPort, const PINS: usize> PicoGPIO<Port, PINS> {
    pub fn new(mut serial_port: Port) -> Result<Self, PicoError> {
        serial_port.set_timeout(Duration::from_millis(500))?;
        serial_port.write_all("\r\n".as_bytes())?;
        Ok(Self {
            port: serial_port,
            actual: [None; PINS],
        })
    }

    /// Reads replies until at least `min_lines` non-empty lines were handled
    /// and nothing more is buffered.
    pub fn poll(&mut self, mut min_lines: usize) -> Result<(), PicoError> {
        loop {
            if self.port.bytes_to_read()? == 0 && min_lines == 0 {
                break;
            }
            let mut buf = [0u8; 1];
            self.port.read_exact(&mut buf)?;
            let mut line = vec![buf[0]];
            while line.last() != Some(&b'\n') {
                let mut buf = [0u8; 1024];
                let amt = self.port.read(&mut buf)?;
                if amt == 0 {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
                }
                line.extend_from_slice(&buf[..amt]);
            }
            let text = String::from_utf8(line).map_err(|e| {
                PicoError::Malformed(String::from_utf8_lossy(e.as_bytes()).into_owned())
            })?;
            for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
                trace!("pico <- {line}");
                self.apply(Reply::parse(line)?)?;
                min_lines = min_lines.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn apply(&mut self, reply: Reply) -> Result<(), PicoError> {
        match reply {
            Reply::Ok | Reply::Ignored => {}
            Reply::Version(v) => debug!("PicoGPIO firmware {v:?}"),
            Reply::Error(err) => return Err(PicoError::Device(err)),
            Reply::Digital { pin, high } => *self.slot(pin)? = Some(high),
        }
        Ok(())
    }

    fn slot(&mut self, pin: usize) -> Result<&mut Option<bool>, PicoError> {
        self.actual
            .get_mut(pin)
            .ok_or(PicoError::PinOutOfRange { pin, pins: PINS })
    }

    pub fn d_out(&mut self, pin: usize, val: bool) -> Result<(), PicoError> {
        self.slot(pin)?;
        self.port
            .write_all(format!("out {pin}={}\r\n", u8::from(val)).as_bytes())?;
        self.poll(0)?;
        while self.actual[pin] != Some(val) {
            self.poll(1)?;
        }
        Ok(())
    }

    /// Flushes pending requests and handles whatever the device still has
    /// buffered. The port itself closes when `self` is dropped.
    pub fn close(&mut self) -> Result<(), PicoError> {
        self.port.flush()?;
        self.poll(0)
    }
}

impl<Port: SerialPort, const PINS: usize> PinSession for PicoGPIO<Port, PINS> {
    fn write(&mut self, pin: usize, high: bool) -> Result<(), ServiceError> {
        Ok(self.d_out(pin, high)?)
    }

    fn disconnect(&mut self) -> Result<(), ServiceError> {
        Ok(self.close()?)
    }
}

/// A PicoGPIO board reachable through a serial device.
#[derive(Clone, Debug)]
pub struct PicoService {
    device: String,
    baud: u32,
}

impl PicoService {
    pub fn new(device: impl Into<String>, baud: u32) -> Self {
        Self {
            device: device.into(),
            baud,
        }
    }
}

impl PinService for PicoService {
    type Session = PicoGPIO<NativePort>;

    fn name(&self) -> &str {
        "pico_gpio"
    }

    fn connect(&mut self) -> Result<Self::Session, ServiceError> {
        debug!("opening {} at {} baud", self.device, self.baud);
        let port = serialport::new(&self.device, self.baud).open_native()?;
        Ok(PicoGPIO::new(port)?)
    }
}
