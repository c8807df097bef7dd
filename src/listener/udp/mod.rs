//! UDP message input, for scanners running as a separate process.

use crossbeam::channel::Sender;
use std::net::UdpSocket;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::{parse_message, InputMessage, ListenerError};

const MAX_PACKET_SIZE: usize = 4096;

/// Start a thread that will accept JSON datagrams and message them
/// to the pipeline's event loop.
pub fn start_udp_thread(
    udp_addr: &str,
    sender: Sender<InputMessage>,
) -> Result<JoinHandle<()>, ListenerError> {
    let socket = UdpSocket::bind(udp_addr).map_err(|source| ListenerError::Bind {
        addr: udp_addr.to_owned(),
        source,
    })?;
    match socket.local_addr() {
        Ok(addr) => info!("[udp] Accepting messages at {}", addr),
        Err(_) => info!("[udp] Accepting messages at {}", udp_addr),
    }

    Ok(thread::spawn(move || {
        let mut buf = [0; MAX_PACKET_SIZE];
        loop {
            let (len, source) = match socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(err) => {
                    error!("[udp] Receive failed, closing: {}", err);
                    break;
                }
            };
            debug!("[udp] recv {} B from {}", len, source);

            let message = match parse_message(&buf[..len]) {
                Ok(message) => message,
                Err(err) => {
                    warn!("[udp] {} from {}", err, source);
                    continue;
                }
            };

            if sender.send(message).is_err() {
                info!("[udp] Message receiver gone. Exiting thread.");
                break;
            }
        }
    }))
}
