// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device model: hubs and sensors.
//!
//! A [`Device`] is classified once, on first sighting, and its kind never
//! changes afterwards. Later messages that contradict the classification
//! are rejected with a [`DeviceError`] instead of mutating state.

mod hub;
mod sensor;

pub use hub::HubDevice;
pub use sensor::{
    AirCapability, LightningStrike, SensorDevice, SensorModel, SkyCapability, WindSample,
};

use crate::error::DeviceError;
use crate::event::Event;
use crate::protocol::DecodedMessage;

/// Serial number prefix of hubs.
const PREFIX_HUB: &str = "HB-";
/// Serial number prefix of Air units.
const PREFIX_AIR: &str = "AR-";
/// Serial number prefix of Sky units.
const PREFIX_SKY: &str = "SK-";
/// Serial number prefix of Tempest units.
const PREFIX_TEMPEST: &str = "ST-";

/// A tracked WeatherFlow device.
#[derive(Debug, Clone, PartialEq)]
pub enum Device {
    /// A hub (gateway).
    Hub(HubDevice),
    /// An Air, Sky or Tempest sensor.
    Sensor(SensorDevice),
}

impl Device {
    /// Classifies a first-sighted serial number from the message that
    /// revealed it and creates the matching device record.
    ///
    /// Observation and hub status discriminators decide directly; the
    /// remaining kinds (device status, rapid wind, strike, rain start)
    /// fall back to the serial number prefix.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Unclassifiable`] when neither the message
    /// kind nor the serial prefix identifies a model.
    pub fn classify(msg: &DecodedMessage) -> Result<Self, DeviceError> {
        let serial = msg.serial_number();
        match msg {
            DecodedMessage::HubStatus(_) => Ok(Self::Hub(HubDevice::new(serial))),
            DecodedMessage::ObservationAir(_) => {
                Ok(Self::Sensor(SensorDevice::new(serial, SensorModel::Air)))
            }
            DecodedMessage::ObservationSky(_) => {
                Ok(Self::Sensor(SensorDevice::new(serial, SensorModel::Sky)))
            }
            DecodedMessage::ObservationTempest(_) => {
                Ok(Self::Sensor(SensorDevice::new(serial, SensorModel::Tempest)))
            }
            DecodedMessage::DeviceStatus(_)
            | DecodedMessage::RapidWind(_)
            | DecodedMessage::LightningStrike(_)
            | DecodedMessage::RainStart(_) => {
                if serial.starts_with(PREFIX_AIR) {
                    Ok(Self::Sensor(SensorDevice::new(serial, SensorModel::Air)))
                } else if serial.starts_with(PREFIX_SKY) {
                    Ok(Self::Sensor(SensorDevice::new(serial, SensorModel::Sky)))
                } else if serial.starts_with(PREFIX_TEMPEST) {
                    Ok(Self::Sensor(SensorDevice::new(serial, SensorModel::Tempest)))
                } else if serial.starts_with(PREFIX_HUB) {
                    Err(DeviceError::TypeMismatch {
                        serial_number: serial.to_string(),
                        model: "Hub".to_string(),
                        message_type: msg.message_type().to_string(),
                    })
                } else {
                    Err(DeviceError::Unclassifiable {
                        serial_number: serial.to_string(),
                        message_type: msg.message_type().to_string(),
                    })
                }
            }
        }
    }

    /// Returns the serial number.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        match self {
            Self::Hub(hub) => hub.serial_number(),
            Self::Sensor(sensor) => sensor.serial_number(),
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &'static str {
        match self {
            Self::Hub(hub) => hub.model(),
            Self::Sensor(sensor) => sensor.model().name(),
        }
    }

    /// Returns `true` once the device finished its first full load.
    #[must_use]
    pub fn load_complete(&self) -> bool {
        match self {
            Self::Hub(hub) => hub.load_complete(),
            Self::Sensor(sensor) => sensor.load_complete(),
        }
    }

    /// Returns the hub view of this device, if it is a hub.
    #[must_use]
    pub fn as_hub(&self) -> Option<&HubDevice> {
        match self {
            Self::Hub(hub) => Some(hub),
            Self::Sensor(_) => None,
        }
    }

    /// Returns the sensor view of this device, if it is a sensor.
    #[must_use]
    pub fn as_sensor(&self) -> Option<&SensorDevice> {
        match self {
            Self::Hub(_) => None,
            Self::Sensor(sensor) => Some(sensor),
        }
    }

    /// Applies a decoded message to this device and returns the events
    /// to raise, in order.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::TypeMismatch`] when the message kind does
    /// not belong to this device's model, and
    /// [`DeviceError::CapabilityMismatch`] when an event message targets
    /// a capability the sensor does not carry. State is untouched in
    /// both cases.
    pub fn apply(&mut self, msg: &DecodedMessage) -> Result<Vec<Event>, DeviceError> {
        match self {
            Self::Hub(hub) => match msg {
                DecodedMessage::HubStatus(status) => Ok(hub.apply_status(status)),
                _ => Err(type_mismatch(hub.serial_number(), hub.model(), msg)),
            },
            Self::Sensor(sensor) => {
                let events = match (msg, sensor.model()) {
                    (DecodedMessage::DeviceStatus(status), _) => Ok(sensor.apply_status(status)),
                    (DecodedMessage::ObservationAir(obs), SensorModel::Air) => {
                        Ok(sensor.apply_air_observation(obs))
                    }
                    (DecodedMessage::ObservationSky(obs), SensorModel::Sky) => {
                        Ok(sensor.apply_sky_observation(obs))
                    }
                    (DecodedMessage::ObservationTempest(obs), SensorModel::Tempest) => {
                        Ok(sensor.apply_tempest_observation(obs))
                    }
                    (DecodedMessage::LightningStrike(strike), model) => {
                        if model.has_air_capability() {
                            Ok(sensor.apply_strike(strike))
                        } else {
                            Err(capability_mismatch(sensor.serial_number(), model.name(), msg))
                        }
                    }
                    (DecodedMessage::RainStart(rain), model) => {
                        if model.has_sky_capability() {
                            Ok(sensor.apply_rain_start(rain))
                        } else {
                            Err(capability_mismatch(sensor.serial_number(), model.name(), msg))
                        }
                    }
                    (DecodedMessage::RapidWind(wind), model) => {
                        if model.has_sky_capability() {
                            Ok(sensor.apply_rapid_wind(wind))
                        } else {
                            Err(capability_mismatch(sensor.serial_number(), model.name(), msg))
                        }
                    }
                    (_, model) => {
                        Err(type_mismatch(sensor.serial_number(), model.name(), msg))
                    }
                }?;
                if let Some(hub_serial) = msg.hub_serial_number() {
                    sensor.record_hub(hub_serial);
                }
                Ok(events)
            }
        }
    }
}

fn type_mismatch(serial_number: &str, model: &str, msg: &DecodedMessage) -> DeviceError {
    DeviceError::TypeMismatch {
        serial_number: serial_number.to_string(),
        model: model.to_string(),
        message_type: msg.message_type().to_string(),
    }
}

fn capability_mismatch(serial_number: &str, model: &str, msg: &DecodedMessage) -> DeviceError {
    DeviceError::CapabilityMismatch {
        serial_number: serial_number.to_string(),
        model: model.to_string(),
        message_type: msg.message_type().to_string(),
    }
}
