use std::io::Cursor;
use std::net::{Ipv4Addr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel;

use beaconlight_rs::address::StaticAddress;
use beaconlight_rs::color::ColorTable;
use beaconlight_rs::command;
use beaconlight_rs::host::Dispatcher;
use beaconlight_rs::intensity::NUM_LEDS;
use beaconlight_rs::listener;
use beaconlight_rs::settings::Settings;
use beaconlight_rs::{BeaconObservation, LightCommand, Outcome, Pipeline};

/// A peripheral on 127.0.0.1 with an ephemeral port.
fn peripheral() -> (UdpSocket, u16) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind peripheral");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    let port = socket.local_addr().expect("local addr").port();
    (socket, port)
}

fn receive(socket: &UdpSocket) -> LightCommand {
    let mut buf = [0; 64];
    let (len, _) = socket.recv_from(&mut buf).expect("command");
    command::decode(&buf[..len]).expect("valid command")
}

fn loopback_pipeline(port: u16, brightness: u32) -> Pipeline {
    Pipeline::new(
        ColorTable::default(),
        Arc::new(Settings::new(brightness, 5.0, true).unwrap()),
        // Fragment "1" turns 127.0.0.5 into 127.0.0.1.
        Box::new(StaticAddress(Some(Ipv4Addr::new(127, 0, 0, 5)))),
        Dispatcher::new(port, Duration::from_millis(100)),
        NUM_LEDS,
    )
}

#[test]
fn peripheral_receives_command() {
    let (socket, port) = peripheral();
    let pipeline = loopback_pipeline(port, 10);

    let outcome = pipeline.take_observation(&BeaconObservation::new("PI-B3-1", -58.0, 2.5));
    assert_eq!(
        outcome,
        Outcome::Sent {
            destination: Ipv4Addr::LOCALHOST,
            command: LightCommand::new(32, 10, 0, 0),
        }
    );
    assert_eq!(receive(&socket), LightCommand::new(32, 10, 0, 0));
}

#[test]
fn each_observation_is_independent() {
    let (socket, port) = peripheral();
    let pipeline = loopback_pipeline(port, 3);

    for (name, distance, expected) in vec![
        ("PI-39-1", 0.0, LightCommand::new(64, 0, 3, 0)),
        ("PI-unknown-1", 5.0, LightCommand::new(0, 3, 3, 3)),
        ("PI-27-1", 9.0, LightCommand::new(0, 0, 0, 3)),
    ] {
        let outcome = pipeline.take_observation(&BeaconObservation::new(name, -70.0, distance));
        assert!(matches!(outcome, Outcome::Sent { .. }), "{}: {:?}", name, outcome);
        assert_eq!(receive(&socket), expected, "{}", name);
    }
}

#[test]
fn json_lines_drive_the_pipeline() {
    let (socket, port) = peripheral();
    let pipeline = loopback_pipeline(port, 0);

    let input = concat!(
        "{\"type\":\"brightness\",\"value\":25}\n",
        "{\"type\":\"maxDistance\",\"value\":2.0}\n",
        "{\"type\":\"observation\",\"name\":\"PI-27-1\",\"rssi\":-61,\"distance\":1.0}\n",
        "{\"type\":\"observation\",\"name\":\"not-ours\",\"rssi\":-61,\"distance\":1.0}\n",
        "{\"type\":\"scan\",\"enabled\":false}\n",
        "{\"type\":\"observation\",\"name\":\"PI-27-1\",\"rssi\":-61,\"distance\":1.0}\n",
    );
    let (sender, receiver) = channel::unbounded();
    listener::start_reader_thread("test", Cursor::new(input), sender);

    let summary = listener::serve(&pipeline, receiver);
    assert_eq!(summary.observations, 3);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.dropped, 2);
    assert_eq!(summary.controls, 3);

    assert_eq!(receive(&socket), LightCommand::new(32, 0, 0, 25));
    assert!(!pipeline.dispatcher().is_open());
}
