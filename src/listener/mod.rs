//! Accepts observations and control messages from the scanner and the
//! user controls.
//!
//! Every source runs on its own thread and feeds a single channel; one loop
//! drains it, so the pipeline only ever sees one message at a time.

use crossbeam::channel::Receiver;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::identity::BeaconObservation;
use crate::pipeline::{Outcome, Pipeline};

mod stdin;
mod udp;

pub use self::stdin::{start_reader_thread, start_stdin_thread};
pub use self::udp::start_udp_thread;

/// Message formats accepted from the outside, one JSON object each.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputMessage {
    /// A scanned advertisement.
    Observation(BeaconObservation),
    /// Colour channel magnitude.
    Brightness { value: u32 },
    /// Distance at which strips go dark.
    MaxDistance { value: f64 },
    /// Scan toggle.
    Scan { enabled: bool },
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

pub fn parse_message(data: &[u8]) -> Result<InputMessage, ListenerError> {
    Ok(serde_json::from_slice(data)?)
}

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub observations: usize,
    pub sent: usize,
    pub dropped: usize,
    pub controls: usize,
}

/// Feed messages to the pipeline until every source has hung up.
pub fn serve(pipeline: &Pipeline, receiver: Receiver<InputMessage>) -> Summary {
    let mut summary = Summary::default();

    for message in receiver.iter() {
        match message {
            InputMessage::Observation(obs) => {
                summary.observations += 1;
                match pipeline.take_observation(&obs) {
                    Outcome::Sent { .. } => summary.sent += 1,
                    outcome => {
                        debug!("[listener] {:?}: {:?}", obs.name, outcome);
                        summary.dropped += 1;
                    }
                }
            }
            InputMessage::Brightness { value } => {
                summary.controls += 1;
                pipeline.set_brightness(value);
            }
            InputMessage::MaxDistance { value } => {
                summary.controls += 1;
                if let Err(err) = pipeline.set_max_distance(value) {
                    warn!("[listener] {}", err);
                }
            }
            InputMessage::Scan { enabled } => {
                summary.controls += 1;
                pipeline.set_scan_enabled(enabled);
            }
        }
    }

    info!(
        "[listener] All sources closed after {} observations ({} sent, {} dropped)",
        summary.observations, summary.sent, summary.dropped
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::StaticAddress;
    use crate::color::ColorTable;
    use crate::host::testing::Recorder;
    use crate::host::Dispatcher;
    use crate::settings::Settings;
    use crossbeam::channel;
    use std::sync::Arc;

    #[test]
    fn parses_message_types() {
        assert_eq!(
            parse_message(br#"{"type":"observation","name":"X-B3-27","rssi":-60,"distance":1.5}"#)
                .unwrap(),
            InputMessage::Observation(BeaconObservation::new("X-B3-27", -60.0, 1.5))
        );
        assert_eq!(
            parse_message(br#"{"type":"brightness","value":10}"#).unwrap(),
            InputMessage::Brightness { value: 10 }
        );
        assert_eq!(
            parse_message(br#"{"type":"maxDistance","value":4.5}"#).unwrap(),
            InputMessage::MaxDistance { value: 4.5 }
        );
        assert_eq!(
            parse_message(br#"{"type":"scan","enabled":true}"#).unwrap(),
            InputMessage::Scan { enabled: true }
        );
    }

    #[test]
    fn rejects_junk() {
        assert!(parse_message(b"not json").is_err());
        assert!(parse_message(br#"{"type":"reboot"}"#).is_err());
        assert!(parse_message(br#"{"type":"brightness","value":-1}"#).is_err());
    }

    #[test]
    fn serve_applies_messages_in_order() {
        let recorder = Recorder::default();
        let pipeline = Pipeline::new(
            ColorTable::default(),
            Arc::new(Settings::default()),
            Box::new(StaticAddress(Some("10.0.0.5".parse().unwrap()))),
            Dispatcher::with_connector(55555, recorder.connector()),
            64,
        );

        let (sender, receiver) = channel::unbounded();
        let obs = BeaconObservation::new("X-B3-7", -60.0, 2.5);
        for message in vec![
            // Scanning starts off.
            InputMessage::Observation(obs.clone()),
            InputMessage::Scan { enabled: true },
            InputMessage::Brightness { value: 7 },
            InputMessage::MaxDistance { value: 0.0 },
            InputMessage::Observation(obs.clone()),
            InputMessage::Observation(BeaconObservation::new("junk", 0.0, 0.0)),
        ] {
            sender.send(message).unwrap();
        }
        drop(sender);

        let summary = serve(&pipeline, receiver);
        assert_eq!(
            summary,
            Summary {
                observations: 3,
                sent: 1,
                dropped: 2,
                controls: 3
            }
        );
        assert_eq!(recorder.sent().len(), 1);
        assert_eq!(recorder.sent()[0].1, b"32 7 0 0".to_vec());
    }
}
