// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded WeatherFlow message types.
//!
//! Each UDP datagram decodes into exactly one [`DecodedMessage`] variant.
//! All kind-specific fields are optional: firmware revisions and low-power
//! modes omit or null individual values, and a missing value must read as
//! unknown rather than zero. Positional observation fields additionally
//! distinguish an explicit wire `null` from a truncated row via [`Field`].
//! Values are always native metric at this layer; unit conversion happens
//! in the consumer-facing quantity types.

use chrono::{DateTime, Utc};

/// A positional observation field.
///
/// The wire distinguishes a field that is present but `null` (the station
/// explicitly reports no value, e.g. wind in low-voltage mode) from one
/// that is absent because the row ended early. Merging treats them
/// differently: an explicit null clears prior state to unknown, a
/// truncated field preserves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// Not on the wire; the row ended before this position.
    #[default]
    Absent,
    /// Present but null.
    Unknown,
    /// Present with a value.
    Value(T),
}

impl<T> Field<T> {
    /// Returns the value, if one is present.
    #[must_use]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent | Self::Unknown => None,
        }
    }

    /// Merges this field into prior state: a value overwrites, an
    /// explicit null clears, an absent field leaves the prior value.
    pub(crate) fn apply_to(self, state: &mut Option<T>) {
        match self {
            Self::Absent => {}
            Self::Unknown => *state = None,
            Self::Value(value) => *state = Some(value),
        }
    }
}

/// Wire discriminator for hub status messages.
pub const TYPE_HUB_STATUS: &str = "hub_status";
/// Wire discriminator for sensor device status messages.
pub const TYPE_DEVICE_STATUS: &str = "device_status";
/// Wire discriminator for Air observations.
pub const TYPE_OBS_AIR: &str = "obs_air";
/// Wire discriminator for Sky observations.
pub const TYPE_OBS_SKY: &str = "obs_sky";
/// Wire discriminator for Tempest observations.
pub const TYPE_OBS_TEMPEST: &str = "obs_st";
/// Wire discriminator for rapid wind samples.
pub const TYPE_RAPID_WIND: &str = "rapid_wind";
/// Wire discriminator for lightning strike events.
pub const TYPE_STRIKE: &str = "evt_strike";
/// Wire discriminator for rain start events.
pub const TYPE_RAIN_START: &str = "evt_precip";

/// A decoded WeatherFlow UDP message.
///
/// Closed set of message kinds; dispatch on this enum is exhaustive and
/// checked at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedMessage {
    /// Periodic hub health/telemetry.
    HubStatus(HubStatusMessage),
    /// Periodic sensor health/telemetry.
    DeviceStatus(DeviceStatusMessage),
    /// Periodic Air observation.
    ObservationAir(AirObservation),
    /// Periodic Sky observation.
    ObservationSky(SkyObservation),
    /// Periodic Tempest observation.
    ObservationTempest(TempestObservation),
    /// Rapid (3 second) wind sample.
    RapidWind(RapidWindMessage),
    /// Lightning strike event.
    LightningStrike(LightningStrikeMessage),
    /// Rain start event.
    RainStart(RainStartMessage),
}

impl DecodedMessage {
    /// Returns the serial number of the originating device.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        match self {
            Self::HubStatus(msg) => &msg.serial_number,
            Self::DeviceStatus(msg) => &msg.serial_number,
            Self::ObservationAir(msg) => &msg.serial_number,
            Self::ObservationSky(msg) => &msg.serial_number,
            Self::ObservationTempest(msg) => &msg.serial_number,
            Self::RapidWind(msg) => &msg.serial_number,
            Self::LightningStrike(msg) => &msg.serial_number,
            Self::RainStart(msg) => &msg.serial_number,
        }
    }

    /// Returns the serial number of the relaying hub, if the message
    /// carries one (hub status messages do not).
    #[must_use]
    pub fn hub_serial_number(&self) -> Option<&str> {
        match self {
            Self::HubStatus(_) => None,
            Self::DeviceStatus(msg) => msg.hub_serial_number.as_deref(),
            Self::ObservationAir(msg) => msg.hub_serial_number.as_deref(),
            Self::ObservationSky(msg) => msg.hub_serial_number.as_deref(),
            Self::ObservationTempest(msg) => msg.hub_serial_number.as_deref(),
            Self::RapidWind(msg) => msg.hub_serial_number.as_deref(),
            Self::LightningStrike(msg) => msg.hub_serial_number.as_deref(),
            Self::RainStart(msg) => msg.hub_serial_number.as_deref(),
        }
    }

    /// Returns the wire discriminator for this message kind.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::HubStatus(_) => TYPE_HUB_STATUS,
            Self::DeviceStatus(_) => TYPE_DEVICE_STATUS,
            Self::ObservationAir(_) => TYPE_OBS_AIR,
            Self::ObservationSky(_) => TYPE_OBS_SKY,
            Self::ObservationTempest(_) => TYPE_OBS_TEMPEST,
            Self::RapidWind(_) => TYPE_RAPID_WIND,
            Self::LightningStrike(_) => TYPE_STRIKE,
            Self::RainStart(_) => TYPE_RAIN_START,
        }
    }

    /// Returns the message timestamp as Unix epoch seconds.
    #[must_use]
    pub fn epoch(&self) -> i64 {
        match self {
            Self::HubStatus(msg) => msg.epoch,
            Self::DeviceStatus(msg) => msg.epoch,
            Self::ObservationAir(msg) => msg.epoch,
            Self::ObservationSky(msg) => msg.epoch,
            Self::ObservationTempest(msg) => msg.epoch,
            Self::RapidWind(msg) => msg.epoch,
            Self::LightningStrike(msg) => msg.epoch,
            Self::RainStart(msg) => msg.epoch,
        }
    }

    /// Returns the message timestamp in UTC.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.epoch(), 0)
    }
}

/// Periodic hub health/telemetry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HubStatusMessage {
    /// Hub serial number (`HB-...`).
    pub serial_number: String,
    /// Unix epoch seconds.
    pub epoch: i64,
    /// Firmware revision (string on the wire for hubs).
    pub firmware_revision: Option<String>,
    /// Seconds since boot.
    pub uptime: Option<i64>,
    /// Wi-Fi signal strength in dB.
    pub rssi: Option<i64>,
    /// Comma-separated reset flag codes, e.g. `"BOR,PIN,POR"`.
    pub reset_flags: Option<String>,
    /// Status message sequence counter.
    pub seq: Option<i64>,
    /// Raw radio statistics array.
    pub radio_stats: Option<Vec<i64>>,
}

/// Periodic sensor health/telemetry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceStatusMessage {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds.
    pub epoch: i64,
    /// Seconds since boot.
    pub uptime: Option<i64>,
    /// Battery voltage in volts.
    pub voltage: Option<f64>,
    /// Firmware revision.
    pub firmware_revision: Option<String>,
    /// Sensor radio signal strength in dB.
    pub rssi: Option<i64>,
    /// Hub-side radio signal strength in dB.
    pub hub_rssi: Option<i64>,
    /// Sensor fault bitmask (see `SensorDevice::sensor_faults`).
    pub sensor_status: Option<u32>,
    /// Debug mode flag.
    pub debug: Option<bool>,
}

/// Periodic Air observation. Native units: mbar, °C, %, km, V, minutes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AirObservation {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds of the report.
    pub epoch: i64,
    /// Station pressure in millibars.
    pub station_pressure: Field<f64>,
    /// Air temperature in degrees Celsius.
    pub air_temperature: Field<f64>,
    /// Relative humidity in percent.
    pub relative_humidity: Field<f64>,
    /// Lightning strikes in the reporting period.
    pub lightning_strike_count: Field<i64>,
    /// Average lightning strike distance in kilometers.
    pub lightning_strike_average_distance: Field<f64>,
    /// Battery voltage in volts.
    pub battery: Field<f64>,
    /// Reporting interval in minutes.
    pub report_interval: Field<i64>,
}

/// Periodic Sky observation. Native units: lx, mm, m/s, degrees, V, W/m².
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkyObservation {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds of the report.
    pub epoch: i64,
    /// Illuminance in lux.
    pub illuminance: Field<i64>,
    /// UV index.
    pub uv: Field<f64>,
    /// Rain over the previous minute in millimeters.
    pub rain_amount_previous_minute: Field<f64>,
    /// Wind lull in meters per second.
    pub wind_lull: Field<f64>,
    /// Wind average in meters per second.
    pub wind_average: Field<f64>,
    /// Wind gust in meters per second.
    pub wind_gust: Field<f64>,
    /// Wind direction in degrees.
    pub wind_direction: Field<i64>,
    /// Battery voltage in volts.
    pub battery: Field<f64>,
    /// Reporting interval in minutes.
    pub report_interval: Field<i64>,
    /// Solar radiation in watts per square meter.
    pub solar_radiation: Field<i64>,
    /// Raw precipitation type value.
    pub precipitation_type: Field<i64>,
    /// Wind sample interval in seconds.
    pub wind_sample_interval: Field<i64>,
}

/// Periodic Tempest observation, combining the Air and Sky field sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TempestObservation {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds of the report.
    pub epoch: i64,
    /// Wind lull in meters per second.
    pub wind_lull: Field<f64>,
    /// Wind average in meters per second.
    pub wind_average: Field<f64>,
    /// Wind gust in meters per second.
    pub wind_gust: Field<f64>,
    /// Wind direction in degrees.
    pub wind_direction: Field<i64>,
    /// Wind sample interval in seconds.
    pub wind_sample_interval: Field<i64>,
    /// Station pressure in millibars.
    pub station_pressure: Field<f64>,
    /// Air temperature in degrees Celsius.
    pub air_temperature: Field<f64>,
    /// Relative humidity in percent.
    pub relative_humidity: Field<f64>,
    /// Illuminance in lux.
    pub illuminance: Field<i64>,
    /// UV index.
    pub uv: Field<f64>,
    /// Solar radiation in watts per square meter.
    pub solar_radiation: Field<i64>,
    /// Rain over the previous minute in millimeters.
    pub rain_amount_previous_minute: Field<f64>,
    /// Raw precipitation type value.
    pub precipitation_type: Field<i64>,
    /// Average lightning strike distance in kilometers.
    pub lightning_strike_average_distance: Field<f64>,
    /// Lightning strikes in the reporting period.
    pub lightning_strike_count: Field<i64>,
    /// Battery voltage in volts.
    pub battery: Field<f64>,
    /// Reporting interval in minutes.
    pub report_interval: Field<i64>,
}

/// Rapid (3 second) wind sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RapidWindMessage {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds of the sample.
    pub epoch: i64,
    /// Wind speed in meters per second.
    ///
    /// `None` in low-power modes, where the station suppresses the value.
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees.
    pub wind_direction: Option<i64>,
}

/// Lightning strike event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightningStrikeMessage {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds of the strike.
    pub epoch: i64,
    /// Strike distance in kilometers.
    pub distance: Option<f64>,
    /// Strike energy (dimensionless, no physical meaning).
    pub energy: Option<i64>,
}

/// Rain start event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RainStartMessage {
    /// Sensor serial number.
    pub serial_number: String,
    /// Serial number of the relaying hub.
    pub hub_serial_number: Option<String>,
    /// Unix epoch seconds of the rain onset.
    pub epoch: i64,
}
