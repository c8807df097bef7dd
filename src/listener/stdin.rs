//! Line-oriented message input.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crossbeam::channel::Sender;
use tracing::{info, warn};

use super::{parse_message, InputMessage};

/// Read JSON messages from standard input, one per line.
pub fn start_stdin_thread(sender: Sender<InputMessage>) -> JoinHandle<()> {
    info!("[stdin] Reading messages from standard input");
    start_reader_thread("stdin", io::BufReader::new(io::stdin()), sender)
}

/// Read JSON messages from any line source until it ends or the receiver
/// goes away. Blank lines are skipped; bad lines are logged and skipped.
pub fn start_reader_thread<R>(name: &'static str, reader: R, sender: Sender<InputMessage>) -> JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = reader;
        let mut line = Vec::with_capacity(256);
        let mut number = 0;
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => number += 1,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!("[{}] Read failed: {}", name, err);
                    break;
                }
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            // Bytes go straight to the JSON parser, which rejects bad UTF-8
            // as just another malformed line.
            let message = match parse_message(&line) {
                Ok(message) => message,
                Err(err) => {
                    warn!("[{}] line {}: {}", name, number, err);
                    continue;
                }
            };

            if sender.send(message).is_err() {
                // Message loop gone.
                break;
            }
        }
        info!("[{}] Input closed", name);
    })
}
