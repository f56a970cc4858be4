// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UDP listener for WeatherFlow station broadcasts.
//!
//! WeatherFlow hubs broadcast JSON datagrams on UDP port 50222. The
//! listener binds a socket, decodes each datagram, routes it to the
//! device registry and publishes the resulting events.
//!
//! Datagrams are processed strictly in arrival order on one task. If
//! subscribers block long enough for the OS socket buffer to overflow,
//! the kernel drops datagrams; the station rebroadcasts state every
//! minute, so a lost datagram only delays an update.
//!
//! # Examples
//!
//! ```no_run
//! use tempest_lib::WeatherFlowListener;
//! use tempest_lib::event::{EventFilter, EventKind};
//!
//! # async fn example() -> tempest_lib::Result<()> {
//! let mut listener = WeatherFlowListener::new();
//!
//! listener.subscribe(EventFilter::kind(EventKind::Observation), |event| {
//!     println!("observation from {}", event.serial_number());
//! });
//!
//! listener.start().await?;
//! tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//! listener.stop().await;
//!
//! for sensor in listener.sensors() {
//!     println!("{}: {:?}", sensor.serial_number(), sensor.air_temperature());
//! }
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::device::{Device, SensorDevice};
use crate::error::{DecodeError, ListenerError};
use crate::event::{Event, EventBus, EventFilter, SubscriptionId};
use crate::protocol;
use crate::registry::{DeviceRegistry, Resolution};

/// The UDP port WeatherFlow hubs broadcast on.
pub const DEFAULT_PORT: u16 = 50_222;

/// The default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Largest datagram the hub is known to emit, with headroom.
const RECV_BUFFER_SIZE: usize = 2048;

/// Listener for WeatherFlow UDP broadcasts.
///
/// Owns the device registry and event bus. A single background task
/// receives datagrams after [`start`](Self::start); registry reads and
/// event subscriptions are available from any task at any time.
pub struct WeatherFlowListener {
    host: String,
    port: u16,
    registry: Arc<RwLock<DeviceRegistry>>,
    bus: EventBus,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl WeatherFlowListener {
    /// Creates a listener for the default host and port.
    #[must_use]
    pub fn new() -> Self {
        Self::bind_to(DEFAULT_HOST, DEFAULT_PORT)
    }

    /// Creates a listener for a specific host and port.
    ///
    /// Binding an ephemeral port (`0`) is useful in tests; the bound
    /// address is available from [`local_addr`](Self::local_addr) after
    /// [`start`](Self::start).
    #[must_use]
    pub fn bind_to(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            registry: Arc::new(RwLock::new(DeviceRegistry::new())),
            bus: EventBus::new(),
            shutdown: Arc::new(Notify::new()),
            task: None,
            local_addr: None,
        }
    }

    /// Registers a callback for events passing `filter`.
    ///
    /// Subscriptions may be added before or after [`start`](Self::start);
    /// events are never replayed to late subscribers.
    pub fn subscribe<F>(&self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(filter, callback)
    }

    /// Unregisters a subscription.
    ///
    /// Returns `true` if a subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Returns `true` while the receive task is running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Returns the bound socket address once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Returns a snapshot of all tracked devices.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.registry.read().devices().into_iter().cloned().collect()
    }

    /// Returns a snapshot of all tracked hubs.
    #[must_use]
    pub fn hubs(&self) -> Vec<Device> {
        self.registry.read().hubs().into_iter().cloned().collect()
    }

    /// Returns a snapshot of all tracked sensors.
    #[must_use]
    pub fn sensors(&self) -> Vec<SensorDevice> {
        self.registry.read().sensors().into_iter().cloned().collect()
    }

    /// Returns a snapshot of the device with the given serial number.
    #[must_use]
    pub fn device(&self, serial_number: &str) -> Option<Device> {
        self.registry.read().get(serial_number).cloned()
    }

    /// Binds the socket and starts the receive task.
    ///
    /// Starting an already listening listener is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::AddressInUse`] when another process holds
    /// the port, and [`ListenerError::Bind`] for any other bind failure.
    pub async fn start(&mut self) -> Result<(), ListenerError> {
        if self.is_listening() {
            return Ok(());
        }

        let address = format!("{}:{}", self.host, self.port);
        let socket = UdpSocket::bind(&address).await.map_err(|err| {
            if err.kind() == ErrorKind::AddrInUse {
                ListenerError::AddressInUse(address.clone())
            } else {
                ListenerError::Bind(err)
            }
        })?;
        self.local_addr = socket.local_addr().ok();

        tracing::info!(address = %address, "Listening for WeatherFlow broadcasts");

        let registry = Arc::clone(&self.registry);
        let bus = self.bus.clone();
        let shutdown = Arc::clone(&self.shutdown);

        self.task = Some(tokio::spawn(async move {
            receive_loop(socket, registry, bus, shutdown).await;
        }));
        Ok(())
    }

    /// Stops the receive task and closes the socket.
    ///
    /// In-flight datagram processing finishes before the task exits.
    /// Device state and subscriptions survive a stop; a later
    /// [`start`](Self::start) resumes with the same registry and bus.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.shutdown.notify_one();
        if task.await.is_err() {
            tracing::warn!("Receive task ended abnormally");
        }
        self.local_addr = None;
        tracing::info!("Stopped listening for WeatherFlow broadcasts");
    }
}

impl Default for WeatherFlowListener {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WeatherFlowListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherFlowListener")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

/// Receives datagrams until shutdown is requested.
///
/// The shutdown check races the socket read, so a stop request takes
/// effect between datagrams without cutting one off mid-application.
async fn receive_loop(
    socket: UdpSocket,
    registry: Arc<RwLock<DeviceRegistry>>,
    bus: EventBus,
    shutdown: Arc<Notify>,
) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        tokio::select! {
            () = shutdown.notified() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, peer)) => {
                    tracing::trace!(bytes = len, peer = %peer, "Datagram received");
                    process_datagram(&buf[..len], &registry, &bus);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Socket receive failed");
                }
            },
        }
    }
}

/// Runs one datagram through decode, resolve, apply and publish.
///
/// Every failure here is logged and dropped; one bad datagram never
/// affects the next.
fn process_datagram(payload: &[u8], registry: &RwLock<DeviceRegistry>, bus: &EventBus) {
    let msg = match protocol::decode(payload) {
        Ok(msg) => msg,
        Err(DecodeError::UnknownMessageType(message_type)) => {
            // Firmware emits kinds this library does not track
            tracing::debug!(message_type = %message_type, "Ignoring untracked message type");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %err, "Dropping undecodable datagram");
            return;
        }
    };

    // Events are collected under the write lock but published after it
    // is released, so subscriber callbacks may read the registry.
    let mut events = Vec::new();
    {
        let mut registry = registry.write();
        let (device, resolution) = match registry.resolve(&msg) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(error = %err, "Dropping unroutable message");
                return;
            }
        };
        if resolution == Resolution::Discovered {
            tracing::info!(
                serial_number = %device.serial_number(),
                model = %device.model(),
                "Discovered device"
            );
            events.push(Event::DeviceDiscovered {
                serial_number: device.serial_number().to_string(),
                epoch: msg.epoch(),
            });
        }
        match device.apply(&msg) {
            Ok(applied) => events.extend(applied),
            Err(err) => {
                tracing::warn!(error = %err, "Dropping mismatched message");
            }
        }
    }

    for event in &events {
        bus.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::event::EventKind;

    fn kinds(log: &Mutex<Vec<EventKind>>) -> Vec<EventKind> {
        log.lock().unwrap().clone()
    }

    fn capture_all(bus: &EventBus) -> Arc<Mutex<Vec<EventKind>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        bus.subscribe(EventFilter::any(), move |event| {
            log_clone.lock().unwrap().push(event.kind());
        });
        log
    }

    #[test]
    fn new_tempest_event_order() {
        let registry = RwLock::new(DeviceRegistry::new());
        let bus = EventBus::new();
        let log = capture_all(&bus);

        let status = br#"{"serial_number":"ST-00000512","type":"device_status","hub_sn":"HB-00013030","timestamp":1510855923,"uptime":2189,"voltage":3.50,"firmware_revision":129,"rssi":-17,"hub_rssi":-87,"sensor_status":0,"debug":0}"#;
        process_datagram(status, &registry, &bus);
        assert_eq!(
            kinds(&log),
            vec![EventKind::DeviceDiscovered, EventKind::StatusUpdate]
        );

        let obs = br#"{"serial_number":"ST-00000512","type":"obs_st","hub_sn":"HB-00013030","obs":[[1588948614,0.18,0.22,0.27,144,6,1017.57,22.37,50.26,328,0.03,3,0.000000,0,0,0,2.410,1]],"firmware_revision":129}"#;
        process_datagram(obs, &registry, &bus);
        assert_eq!(
            kinds(&log),
            vec![
                EventKind::DeviceDiscovered,
                EventKind::StatusUpdate,
                EventKind::LoadComplete,
                EventKind::Observation,
            ]
        );
    }

    #[test]
    fn low_voltage_nulls_clear_stale_wind() {
        let registry = RwLock::new(DeviceRegistry::new());
        let bus = EventBus::new();

        let full = br#"{"serial_number":"ST-00000512","type":"obs_st","hub_sn":"HB-00013030","obs":[[1588948614,0.18,0.22,0.27,144,6,1017.57,22.37,50.26,328,0.03,3,0.000000,0,0,0,2.410,1]]}"#;
        process_datagram(full, &registry, &bus);

        // Low-voltage mode: the next report carries null wind fields
        let low_voltage = br#"{"serial_number":"ST-00000512","type":"obs_st","hub_sn":"HB-00013030","obs":[[1588948700,null,null,null,144,6,1017.57,21.0,50.26,328,0.03,3,0.000000,0,0,0,2.410,1]]}"#;
        process_datagram(low_voltage, &registry, &bus);

        let guard = registry.read();
        let Some(Device::Sensor(sensor)) = guard.get("ST-00000512") else {
            panic!("expected a sensor device");
        };
        assert!(sensor.wind_average().is_none());
        assert!(sensor.wind_gust().is_none());
        assert_eq!(sensor.air_temperature().unwrap().celsius(), 21.0);
        assert_eq!(sensor.station_pressure().unwrap().millibars(), 1017.57);
    }

    #[test]
    fn undecodable_datagram_is_dropped_quietly() {
        let registry = RwLock::new(DeviceRegistry::new());
        let bus = EventBus::new();
        let log = capture_all(&bus);

        process_datagram(b"not json", &registry, &bus);
        process_datagram(&[0xff, 0xfe], &registry, &bus);
        process_datagram(br#"{"type":"light_debug","serial_number":"ST-1"}"#, &registry, &bus);

        assert!(kinds(&log).is_empty());
        assert!(registry.read().is_empty());
    }

    #[test]
    fn hub_discovery_publishes_in_order() {
        let registry = RwLock::new(DeviceRegistry::new());
        let bus = EventBus::new();
        let log = capture_all(&bus);

        let status = br#"{"serial_number":"HB-00000001","type":"hub_status","firmware_revision":"35","uptime":1670133,"rssi":-62,"timestamp":1495724691,"reset_flags":"BOR,PIN,POR","seq":48,"radio_stats":[2,1,0,3,2839]}"#;
        process_datagram(status, &registry, &bus);

        assert_eq!(
            kinds(&log),
            vec![
                EventKind::DeviceDiscovered,
                EventKind::LoadComplete,
                EventKind::StatusUpdate,
            ]
        );
    }

    #[test]
    fn mismatched_message_drops_but_keeps_device() {
        let registry = RwLock::new(DeviceRegistry::new());
        let bus = EventBus::new();
        let log = capture_all(&bus);

        let hub = br#"{"serial_number":"HB-00000001","type":"hub_status","timestamp":1495724691,"uptime":10}"#;
        process_datagram(hub, &registry, &bus);
        // A sensor status claiming a hub serial must not mutate the hub
        let bogus = br#"{"serial_number":"HB-00000001","type":"device_status","timestamp":1495724700,"uptime":20}"#;
        process_datagram(bogus, &registry, &bus);

        assert_eq!(registry.read().len(), 1);
        let log = kinds(&log);
        assert!(!log.contains(&EventKind::Observation));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn subscriber_reads_registry_during_callback() {
        let registry = Arc::new(RwLock::new(DeviceRegistry::new()));
        let bus = EventBus::new();

        let registry_clone = Arc::clone(&registry);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        bus.subscribe(EventFilter::kind(EventKind::DeviceDiscovered), move |event| {
            // Registry lock is released before publish, so this must not deadlock
            let tracked = registry_clone.read().get(event.serial_number()).is_some();
            seen_clone.lock().unwrap().push(tracked);
        });

        let status = br#"{"serial_number":"HB-00000001","type":"hub_status","timestamp":1495724691}"#;
        process_datagram(status, &registry, &bus);
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn listener_defaults() {
        let listener = WeatherFlowListener::new();
        assert!(!listener.is_listening());
        assert!(listener.local_addr().is_none());
        assert!(listener.devices().is_empty());
    }

    #[tokio::test]
    async fn start_binds_and_stop_joins() {
        let mut listener = WeatherFlowListener::bind_to("127.0.0.1", 0);
        listener.start().await.unwrap();
        assert!(listener.is_listening());
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        listener.stop().await;
        assert!(!listener.is_listening());
        assert!(listener.local_addr().is_none());
    }

    #[tokio::test]
    async fn start_twice_is_a_no_op() {
        let mut listener = WeatherFlowListener::bind_to("127.0.0.1", 0);
        listener.start().await.unwrap();
        let addr = listener.local_addr().unwrap();
        listener.start().await.unwrap();
        assert_eq!(listener.local_addr(), Some(addr));
        listener.stop().await;
    }

    #[tokio::test]
    async fn bind_conflict_reports_address_in_use() {
        let mut first = WeatherFlowListener::bind_to("127.0.0.1", 0);
        first.start().await.unwrap();
        let port = first.local_addr().unwrap().port();

        let mut second = WeatherFlowListener::bind_to("127.0.0.1", port);
        let err = second.start().await.unwrap_err();
        assert!(matches!(err, ListenerError::AddressInUse(_)));

        first.stop().await;
    }
}
