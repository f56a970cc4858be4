// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end listener tests over a loopback UDP socket.
//!
//! Each test binds a listener on an ephemeral port, sends real
//! WeatherFlow datagrams at it and asserts on the resulting events and
//! device state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

use tempest_lib::event::{EventFilter, EventKind};
use tempest_lib::{Event, WeatherFlowListener};

const TEMPEST_STATUS: &[u8] = br#"{"serial_number":"ST-00000512","type":"device_status","hub_sn":"HB-00013030","timestamp":1510855923,"uptime":2189,"voltage":3.50,"firmware_revision":129,"rssi":-17,"hub_rssi":-87,"sensor_status":0,"debug":0}"#;

const TEMPEST_OBSERVATION: &[u8] = br#"{"serial_number":"ST-00000512","type":"obs_st","hub_sn":"HB-00013030","obs":[[1588948614,0.18,0.22,0.27,144,6,1017.57,22.37,50.26,328,0.03,3,0.000000,0,0,0,2.410,1]],"firmware_revision":129}"#;

const HUB_STATUS: &[u8] = br#"{"serial_number":"HB-00013030","type":"hub_status","firmware_revision":"35","uptime":1670133,"rssi":-62,"timestamp":1495724691,"reset_flags":"BOR,PIN,POR","seq":48,"fs":[1,0,15675411,524288],"radio_stats":[2,1,0,3,2839],"mqtt_stats":[1,0]}"#;

const RAPID_WIND: &[u8] = br#"{"serial_number":"ST-00000512","type":"rapid_wind","hub_sn":"HB-00013030","ob":[1588948614,2.3,128]}"#;

/// Starts a listener with an event log and returns a sender socket
/// aimed at it.
async fn start_listener() -> (WeatherFlowListener, Arc<Mutex<Vec<Event>>>, UdpSocket) {
    let mut listener = WeatherFlowListener::bind_to("127.0.0.1", 0);
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    listener.subscribe(EventFilter::any(), move |event| {
        log_clone.lock().unwrap().push(event.clone());
    });
    listener.start().await.expect("bind loopback listener");

    let sender = UdpSocket::bind("127.0.0.1:0").await.expect("bind sender");
    sender
        .connect(listener.local_addr().expect("listener address"))
        .await
        .expect("connect sender");
    (listener, log, sender)
}

/// Waits until the log holds at least `count` events.
async fn wait_for_events(log: &Mutex<Vec<Event>>, count: usize) {
    timeout(Duration::from_secs(5), async {
        loop {
            if log.lock().unwrap().len() >= count {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("events did not arrive in time");
}

fn kinds(log: &Mutex<Vec<Event>>) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(Event::kind).collect()
}

#[tokio::test]
async fn new_tempest_full_event_sequence() {
    let (mut listener, log, sender) = start_listener().await;

    sender.send(TEMPEST_STATUS).await.unwrap();
    wait_for_events(&log, 2).await;
    sender.send(TEMPEST_OBSERVATION).await.unwrap();
    wait_for_events(&log, 4).await;

    assert_eq!(
        kinds(&log),
        vec![
            EventKind::DeviceDiscovered,
            EventKind::StatusUpdate,
            EventKind::LoadComplete,
            EventKind::Observation,
        ]
    );

    let sensor = listener
        .device("ST-00000512")
        .and_then(|device| device.as_sensor().cloned())
        .expect("tempest tracked");
    assert!(sensor.load_complete());
    assert_eq!(sensor.air_temperature().unwrap().celsius(), 22.37);
    assert_eq!(sensor.hub_serial_number(), Some("HB-00013030"));

    listener.stop().await;
}

#[tokio::test]
async fn hub_and_sensor_are_tracked_separately() {
    let (mut listener, log, sender) = start_listener().await;

    sender.send(HUB_STATUS).await.unwrap();
    wait_for_events(&log, 3).await;
    sender.send(TEMPEST_STATUS).await.unwrap();
    wait_for_events(&log, 5).await;

    assert_eq!(listener.hubs().len(), 1);
    assert_eq!(listener.sensors().len(), 1);
    assert_eq!(listener.devices().len(), 2);

    let hub = listener
        .device("HB-00013030")
        .and_then(|device| device.as_hub().cloned())
        .expect("hub tracked");
    assert!(hub.load_complete());
    assert_eq!(hub.firmware_revision(), Some("35"));

    listener.stop().await;
}

#[tokio::test]
async fn malformed_datagrams_do_not_stop_the_listener() {
    let (mut listener, log, sender) = start_listener().await;

    sender.send(b"not json at all").await.unwrap();
    sender.send(&[0xff, 0xfe, 0xfd]).await.unwrap();
    sender.send(b"{}").await.unwrap();
    sender
        .send(br#"{"type":"light_debug","serial_number":"ST-00000512"}"#)
        .await
        .unwrap();

    // The listener must still process a valid datagram afterwards
    sender.send(HUB_STATUS).await.unwrap();
    wait_for_events(&log, 3).await;

    assert_eq!(
        kinds(&log),
        vec![
            EventKind::DeviceDiscovered,
            EventKind::LoadComplete,
            EventKind::StatusUpdate,
        ]
    );
    assert!(listener.is_listening());

    listener.stop().await;
}

#[tokio::test]
async fn filtered_subscription_sees_only_its_events() {
    let (mut listener, log, sender) = start_listener().await;

    let wind_log = Arc::new(Mutex::new(Vec::new()));
    let wind_clone = Arc::clone(&wind_log);
    listener.subscribe(EventFilter::kind(EventKind::RapidWind), move |event| {
        wind_clone.lock().unwrap().push(event.clone());
    });

    sender.send(TEMPEST_STATUS).await.unwrap();
    wait_for_events(&log, 2).await;
    sender.send(RAPID_WIND).await.unwrap();
    wait_for_events(&log, 3).await;

    let wind_events = wind_log.lock().unwrap();
    assert_eq!(wind_events.len(), 1);
    match &wind_events[0] {
        Event::RapidWind {
            serial_number,
            speed,
            direction,
            ..
        } => {
            assert_eq!(serial_number, "ST-00000512");
            assert_eq!(speed.unwrap().meters_per_second(), 2.3);
            assert_eq!(*direction, Some(128));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    listener.stop().await;
}

#[tokio::test]
async fn state_survives_stop_and_restart() {
    let (mut listener, log, sender) = start_listener().await;

    sender.send(HUB_STATUS).await.unwrap();
    wait_for_events(&log, 3).await;
    listener.stop().await;
    assert!(!listener.is_listening());
    assert_eq!(listener.hubs().len(), 1);

    listener.start().await.expect("restart");
    assert!(listener.is_listening());

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .connect(listener.local_addr().unwrap())
        .await
        .unwrap();
    sender.send(TEMPEST_STATUS).await.unwrap();
    wait_for_events(&log, 5).await;

    assert_eq!(listener.devices().len(), 2);
    listener.stop().await;
}

#[tokio::test]
async fn stop_without_start_is_a_no_op() {
    let mut listener = WeatherFlowListener::bind_to("127.0.0.1", 0);
    listener.stop().await;
    assert!(!listener.is_listening());
}
