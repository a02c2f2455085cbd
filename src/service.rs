//! The pin-control capability the benchmark drives.
//!
//! A [`PinService`] hands out sessions; a [`Connection`] owns one session
//! and guarantees it is disconnected exactly once, whichever way the caller
//! leaves its scope.

use log::{debug, warn};

use crate::error::BenchError;

/// Error type returned by pin-control implementations.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub trait PinService {
    type Session: PinSession;

    /// Name printed in the report line.
    fn name(&self) -> &str;

    fn connect(&mut self) -> Result<Self::Session, ServiceError>;
}

pub trait PinSession {
    /// Drives `pin` high or low, blocking until the service has accepted it.
    fn write(&mut self, pin: usize, high: bool) -> Result<(), ServiceError>;

    fn disconnect(&mut self) -> Result<(), ServiceError>;
}

pub struct Connection<S: PinSession> {
    session: S,
    service: String,
    released: bool,
}

impl<S: PinSession> Connection<S> {
    pub fn open<P>(service: &mut P) -> Result<Self, BenchError>
    where
        P: PinService<Session = S>,
    {
        let name = service.name().to_owned();
        match service.connect() {
            Ok(session) => {
                debug!("connected to {name}");
                Ok(Self {
                    session,
                    service: name,
                    released: false,
                })
            }
            Err(source) => Err(BenchError::Connection {
                service: name,
                source,
            }),
        }
    }

    pub fn write(&mut self, pin: usize, high: bool) -> Result<(), BenchError> {
        self.session
            .write(pin, high)
            .map_err(|source| BenchError::Write {
                pin,
                value: u8::from(high),
                source,
            })
    }

    /// Disconnects now instead of at the end of the scope.
    pub fn release(mut self) {
        self.disconnect();
    }

    fn disconnect(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match self.session.disconnect() {
            Ok(()) => debug!("disconnected from {}", self.service),
            Err(e) => warn!("disconnecting from {} failed: {e}", self.service),
        }
    }
}

impl<S: PinSession> Drop for Connection<S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counting {
        disconnects: Rc<Cell<usize>>,
        fail_disconnect: bool,
    }

    impl PinSession for Counting {
        fn write(&mut self, _pin: usize, _high: bool) -> Result<(), ServiceError> {
            Err("stuck".into())
        }

        fn disconnect(&mut self) -> Result<(), ServiceError> {
            self.disconnects.set(self.disconnects.get() + 1);
            if self.fail_disconnect {
                Err("already gone".into())
            } else {
                Ok(())
            }
        }
    }

    struct Fixed(Option<Counting>);

    impl PinService for Fixed {
        type Session = Counting;

        fn name(&self) -> &str {
            "fixed"
        }

        fn connect(&mut self) -> Result<Counting, ServiceError> {
            self.0.take().ok_or_else(|| "no session left".into())
        }
    }

    fn service(fail_disconnect: bool) -> (Fixed, Rc<Cell<usize>>) {
        let disconnects = Rc::new(Cell::new(0));
        let session = Counting {
            disconnects: disconnects.clone(),
            fail_disconnect,
        };
        (Fixed(Some(session)), disconnects)
    }

    #[test]
    fn drop_disconnects_once() {
        let (mut svc, disconnects) = service(false);
        {
            let _conn = Connection::open(&mut svc).unwrap();
        }
        assert_eq!(disconnects.get(), 1);
    }

    #[test]
    fn explicit_release_is_not_repeated_on_drop() {
        let (mut svc, disconnects) = service(false);
        Connection::open(&mut svc).unwrap().release();
        assert_eq!(disconnects.get(), 1);
    }

    #[test]
    fn failed_disconnect_is_not_retried() {
        let (mut svc, disconnects) = service(true);
        Connection::open(&mut svc).unwrap().release();
        assert_eq!(disconnects.get(), 1);
    }

    #[test]
    fn write_error_carries_pin_and_value() {
        let (mut svc, _) = service(false);
        let mut conn = Connection::open(&mut svc).unwrap();
        match conn.write(7, true) {
            Err(BenchError::Write { pin: 7, value: 1, .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn connect_error_names_service() {
        let (mut svc, _) = service(false);
        svc.0 = None;
        match Connection::open(&mut svc) {
            Err(BenchError::Connection { service, .. }) => assert_eq!(service, "fixed"),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("connected without a session"),
        }
    }
}
