use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use super::Transport;

/// Unconnected UDP socket shared by every peripheral in a session.
pub struct UdpTransport {
    /// UDP socket reused between calls.
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind an ephemeral port on all interfaces.
    ///
    /// A zero `send_timeout` means blocking writes.
    pub fn bind(send_timeout: Duration) -> io::Result<UdpTransport> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        if send_timeout > Duration::from_secs(0) {
            socket.set_write_timeout(Some(send_timeout))?;
        }
        Ok(UdpTransport { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send_to(&mut self, payload: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(payload, dest)
    }
}
