//! Delivery of light commands to peripherals.
//!
//! Delivery is fire-and-forget: a failed send is logged and forgotten, the
//! next observation produces a fresher command anyway.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub mod udp;
pub use self::udp::UdpTransport;

/// Something that can put a datagram on the wire.
pub trait Transport: Send {
    /// Send one payload to `dest`, returning the number of bytes written.
    fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> io::Result<usize>;
}

/// Opens the transport for a session.
pub type Connector = Box<dyn Fn() -> io::Result<Box<dyn Transport>> + Send + Sync>;

/// What happened to a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the OS.
    Sent(usize),
    /// The transport reported an error.
    Failed,
    /// No session is open, or opening it failed.
    NoTransport,
}

/// Owns the outbound transport for a scanning session.
pub struct Dispatcher {
    /// Peripheral port.
    port: u16,
    connector: Connector,
    /// Open transport; writes are serialized through this lock.
    transport: Mutex<Option<Box<dyn Transport>>>,
}

impl Dispatcher {
    /// A dispatcher that opens a UDP socket with `send_timeout` per session.
    pub fn new(port: u16, send_timeout: Duration) -> Dispatcher {
        Dispatcher::with_connector(
            port,
            Box::new(move || -> io::Result<Box<dyn Transport>> {
                let transport = UdpTransport::bind(send_timeout)?;
                Ok(Box::new(transport))
            }),
        )
    }

    pub fn with_connector(port: u16, connector: Connector) -> Dispatcher {
        Dispatcher {
            port,
            connector,
            transport: Mutex::new(None),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start a session. Opening an open dispatcher does nothing.
    pub fn open(&self) -> io::Result<()> {
        let mut transport = self.lock();
        if transport.is_some() {
            return Ok(());
        }
        match (self.connector)() {
            Ok(opened) => {
                info!("[dispatch] Session opened, peripherals on port {}", self.port);
                *transport = Some(opened);
                Ok(())
            }
            Err(err) => {
                error!("[dispatch] Unable to open command socket, light updates disabled: {}", err);
                Err(err)
            }
        }
    }

    /// End the session. Returns whether a session was open.
    pub fn close(&self) -> bool {
        let closed = self.lock().take().is_some();
        if closed {
            info!("[dispatch] Session closed");
        }
        closed
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Send a payload to a peripheral. Never fails; the result is for
    /// callers that want to count.
    pub fn send(&self, ip: Ipv4Addr, payload: &[u8]) -> Delivery {
        let dest = SocketAddr::from((ip, self.port));
        let mut transport = self.lock();
        let transport = match transport.as_mut() {
            Some(transport) => transport,
            None => {
                warn!("[dispatch] No open session, dropping command for {}", dest);
                return Delivery::NoTransport;
            }
        };

        match transport.send_to(payload, dest) {
            Ok(len) => {
                debug!("[dispatch] {} B -> {}", len, dest);
                Delivery::Sent(len)
            }
            Err(err) => {
                warn!("[dispatch] Send to {} failed: {}", dest, err);
                Delivery::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Transport>>> {
        // A panicking sender can't leave the socket half-written.
        self.transport
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;

    #[test]
    fn sends_to_peripheral_port() {
        let recorder = Recorder::default();
        let dispatcher = Dispatcher::with_connector(55555, recorder.connector());
        dispatcher.open().unwrap();

        let delivery = dispatcher.send(Ipv4Addr::new(10, 0, 0, 7), b"32 10 0 0");
        assert_eq!(delivery, Delivery::Sent(9));
        assert_eq!(
            recorder.sent(),
            vec![("10.0.0.7:55555".parse().unwrap(), b"32 10 0 0".to_vec())]
        );
    }

    #[test]
    fn failure_does_not_end_session() {
        let recorder = Recorder::failing(1);
        let dispatcher = Dispatcher::with_connector(55555, recorder.connector());
        dispatcher.open().unwrap();

        assert_eq!(dispatcher.send(Ipv4Addr::new(10, 0, 0, 7), b"1 1 1 1"), Delivery::Failed);
        assert!(dispatcher.is_open());
        assert_eq!(dispatcher.send(Ipv4Addr::new(10, 0, 0, 7), b"2 1 1 1"), Delivery::Sent(7));
        assert_eq!(recorder.sent().len(), 1);
    }

    #[test]
    fn closed_dispatcher_drops_commands() {
        let recorder = Recorder::default();
        let dispatcher = Dispatcher::with_connector(55555, recorder.connector());
        assert_eq!(dispatcher.send(Ipv4Addr::LOCALHOST, b"0 0 0 0"), Delivery::NoTransport);

        dispatcher.open().unwrap();
        assert!(dispatcher.close());
        assert!(!dispatcher.close());
        assert_eq!(dispatcher.send(Ipv4Addr::LOCALHOST, b"0 0 0 0"), Delivery::NoTransport);
        assert!(recorder.sent().is_empty());
    }

    #[test]
    fn open_failure_is_reported() {
        let dispatcher = Dispatcher::with_connector(
            55555,
            Box::new(|| -> io::Result<Box<dyn Transport>> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "no sockets"))
            }),
        );
        assert!(dispatcher.open().is_err());
        assert!(!dispatcher.is_open());
        assert_eq!(dispatcher.send(Ipv4Addr::LOCALHOST, b"0 0 0 0"), Delivery::NoTransport);
    }
}
