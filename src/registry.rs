// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of devices keyed by serial number.
//!
//! The registry never forgets a device: serial numbers are stable and
//! the population on a home network is tiny, so entries live for the
//! registry's lifetime.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::device::{Device, SensorDevice};
use crate::error::DeviceError;
use crate::protocol::DecodedMessage;

/// Outcome of resolving a message's serial number to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The serial number was already tracked.
    Existing,
    /// A device record was created for a first-sighted serial number.
    Discovered,
}

/// Devices tracked by the listener, keyed by serial number.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no device has been sighted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns the device with the given serial number, if tracked.
    #[must_use]
    pub fn get(&self, serial_number: &str) -> Option<&Device> {
        self.devices.get(serial_number)
    }

    /// Returns all tracked devices.
    #[must_use]
    pub fn devices(&self) -> Vec<&Device> {
        self.devices.values().collect()
    }

    /// Returns all tracked hubs.
    #[must_use]
    pub fn hubs(&self) -> Vec<&Device> {
        self.devices
            .values()
            .filter(|device| device.as_hub().is_some())
            .collect()
    }

    /// Returns all tracked sensors.
    #[must_use]
    pub fn sensors(&self) -> Vec<&SensorDevice> {
        self.devices.values().filter_map(Device::as_sensor).collect()
    }

    /// Returns the hub relaying the given sensor, when both the sensor's
    /// back-reference and the hub itself have been sighted.
    #[must_use]
    pub fn hub_of(&self, sensor: &SensorDevice) -> Option<&Device> {
        let hub_serial = sensor.hub_serial_number()?;
        self.devices.get(hub_serial).filter(|device| device.as_hub().is_some())
    }

    /// Resolves the message's serial number to a tracked device,
    /// classifying and inserting a record on first sighting.
    ///
    /// # Errors
    ///
    /// Returns the classification error for a first-sighted serial number
    /// whose message cannot identify a model; nothing is inserted.
    pub fn resolve(
        &mut self,
        msg: &DecodedMessage,
    ) -> Result<(&mut Device, Resolution), DeviceError> {
        match self.devices.entry(msg.serial_number().to_string()) {
            Entry::Occupied(entry) => Ok((entry.into_mut(), Resolution::Existing)),
            Entry::Vacant(entry) => {
                let device = Device::classify(msg)?;
                Ok((entry.insert(device), Resolution::Discovered))
            }
        }
    }
}
