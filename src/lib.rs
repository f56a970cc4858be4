// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Tempest` Lib - A Rust library for WeatherFlow weather stations.
//!
//! This library listens for the UDP broadcasts that WeatherFlow hubs emit
//! on the local network, decodes them and maintains live device state for
//! every hub and sensor it hears.
//!
//! # Supported Features
//!
//! - **Passive listening**: No cloud account, no polling — devices appear
//!   as soon as they broadcast
//! - **Device state**: Status, observations and events merged into one
//!   record per serial number
//! - **Derived metrics**: Dew point, feels like, sea level pressure and
//!   friends, computed on demand
//! - **Event subscriptions**: Callback delivery filtered by event kind
//!   and/or device
//!
//! # Supported Devices
//!
//! - Hub (`HB-` serial numbers)
//! - Air (`AR-`): pressure, temperature, humidity, lightning
//! - Sky (`SK-`): wind, rain, light
//! - Tempest (`ST-`): the combined Air and Sky field sets
//!
//! # Quick Start
//!
//! ```no_run
//! use tempest_lib::WeatherFlowListener;
//! use tempest_lib::event::{EventFilter, EventKind};
//!
//! #[tokio::main]
//! async fn main() -> tempest_lib::Result<()> {
//!     let mut listener = WeatherFlowListener::new();
//!
//!     // React to every observation on the network
//!     listener.subscribe(EventFilter::kind(EventKind::Observation), |event| {
//!         println!("observation from {}", event.serial_number());
//!     });
//!
//!     listener.start().await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     listener.stop().await;
//!
//!     // Inspect accumulated device state
//!     for sensor in listener.sensors() {
//!         println!(
//!             "{} ({}): {:?}",
//!             sensor.serial_number(),
//!             sensor.model().name(),
//!             sensor.air_temperature(),
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod calc;
pub mod device;
pub mod error;
pub mod event;
mod listener;
pub mod protocol;
pub mod registry;
pub mod types;

pub use device::{Device, HubDevice, SensorDevice, SensorModel};
pub use error::{DecodeError, DeviceError, Error, ListenerError, Result};
pub use event::{Event, EventBus, EventFilter, EventKind, SubscriptionId};
pub use listener::{DEFAULT_HOST, DEFAULT_PORT, WeatherFlowListener};
pub use protocol::DecodedMessage;
pub use registry::DeviceRegistry;
pub use types::{Distance, Length, PrecipitationType, Pressure, Speed, Temperature};
