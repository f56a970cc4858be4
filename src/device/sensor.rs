// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WeatherFlow sensor devices (Air, Sky, Tempest).
//!
//! Sensor capabilities are composed by value: an Air unit carries an
//! [`AirCapability`], a Sky unit a [`SkyCapability`], and a Tempest both.
//! Message handling checks capability presence instead of relying on an
//! inheritance hierarchy, so dispatch stays an exhaustive match.

use chrono::{DateTime, Utc};

use crate::calc;
use crate::event::Event;
use crate::protocol::{
    AirObservation, DeviceStatusMessage, Field, LightningStrikeMessage, RainStartMessage,
    RapidWindMessage, SkyObservation, TempestObservation,
};
use crate::types::{Distance, Length, PrecipitationType, Pressure, Speed, Temperature};

/// Tempest status/uptime clocks oscillate a few seconds between reports.
/// Up-since shifts smaller than this window are folded into the uptime
/// instead of moving the boot time.
const UP_SINCE_JITTER_SECONDS: i64 = 60;

/// Sensor fault bits reported in the device status bitmask.
const SENSOR_FAULTS: &[(u32, &str)] = &[
    (0b0_0000_0001, "Lightning Failed"),
    (0b0_0000_0010, "Lightning Noise"),
    (0b0_0000_0100, "Lightning Disturber"),
    (0b0_0000_1000, "Pressure Failed"),
    (0b0_0001_0000, "Temperature Failed"),
    (0b0_0010_0000, "Relative Humidity Failed"),
    (0b0_0100_0000, "Wind Failed"),
    (0b0_1000_0000, "Precipitation Failed"),
    (0b1_0000_0000, "Light/UV Failed"),
    (0x0000_8000, "Power Booster Depleted"),
    (0x0001_0000, "Power Booster Shore Power"),
];

/// The sensor model, fixed at discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorModel {
    /// Air unit: pressure, temperature, humidity, lightning.
    Air,
    /// Sky unit: wind, rain, light.
    Sky,
    /// Tempest unit: the combined Air and Sky field sets.
    Tempest,
}

impl SensorModel {
    /// Returns the model name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Air => "Air",
            Self::Sky => "Sky",
            Self::Tempest => "Tempest",
        }
    }

    /// Returns `true` if this model carries the Air capability.
    #[must_use]
    pub fn has_air_capability(self) -> bool {
        matches!(self, Self::Air | Self::Tempest)
    }

    /// Returns `true` if this model carries the Sky capability.
    #[must_use]
    pub fn has_sky_capability(self) -> bool {
        matches!(self, Self::Sky | Self::Tempest)
    }
}

/// The last lightning strike a sensor reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightningStrike {
    /// Unix epoch seconds of the strike.
    pub epoch: i64,
    /// Strike distance.
    pub distance: Option<Distance>,
    /// Strike energy (dimensionless, no physical meaning).
    pub energy: Option<i64>,
}

/// The last rapid wind sample a sensor reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSample {
    /// Unix epoch seconds of the sample.
    pub epoch: i64,
    /// Wind speed.
    pub speed: Option<Speed>,
    /// Wind direction in degrees.
    pub direction: Option<i64>,
}

/// Air measurement state: pressure, temperature, humidity, lightning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AirCapability {
    station_pressure: Option<f64>,
    air_temperature: Option<f64>,
    relative_humidity: Option<f64>,
    lightning_strike_count: Option<i64>,
    lightning_strike_average_distance: Option<f64>,
    last_strike: Option<LightningStrike>,
}

/// Sky measurement state: wind, rain, light.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkyCapability {
    illuminance: Option<i64>,
    uv: Option<f64>,
    rain_amount_previous_minute: Option<f64>,
    wind_lull: Option<f64>,
    wind_average: Option<f64>,
    wind_gust: Option<f64>,
    wind_direction: Option<i64>,
    solar_radiation: Option<i64>,
    precipitation_type: Option<i64>,
    wind_sample_interval: Option<i64>,
    last_rain_start_epoch: Option<i64>,
    last_wind: Option<WindSample>,
}

/// A WeatherFlow sensor device.
///
/// Holds the device-level status fields shared by every sensor plus the
/// capability state for its model. All mutation happens through the
/// `apply_*` methods, which merge a decoded message last-write-wins per
/// field and return the events to raise, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorDevice {
    serial_number: String,
    model: SensorModel,
    hub_serial_number: Option<String>,
    epoch: Option<i64>,
    uptime: Option<i64>,
    voltage: Option<f64>,
    firmware_revision: Option<String>,
    rssi: Option<i64>,
    hub_rssi: Option<i64>,
    sensor_status: Option<u32>,
    debug: Option<bool>,
    battery: Option<f64>,
    last_report_epoch: Option<i64>,
    report_interval: Option<i64>,
    air: Option<AirCapability>,
    sky: Option<SkyCapability>,
    status_complete: bool,
    observation_complete: bool,
}

impl SensorDevice {
    /// Creates a sensor record for a newly sighted serial number.
    #[must_use]
    pub(crate) fn new(serial_number: impl Into<String>, model: SensorModel) -> Self {
        Self {
            serial_number: serial_number.into(),
            model,
            hub_serial_number: None,
            epoch: None,
            uptime: None,
            voltage: None,
            firmware_revision: None,
            rssi: None,
            hub_rssi: None,
            sensor_status: None,
            debug: None,
            battery: None,
            last_report_epoch: None,
            report_interval: None,
            air: model.has_air_capability().then(AirCapability::default),
            sky: model.has_sky_capability().then(SkyCapability::default),
            status_complete: false,
            observation_complete: false,
        }
    }

    // ========== Identity and status ==========

    /// Returns the serial number.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Returns the sensor model.
    #[must_use]
    pub fn model(&self) -> SensorModel {
        self.model
    }

    /// Returns the serial number of the hub relaying this sensor, if any
    /// message has carried it yet.
    #[must_use]
    pub fn hub_serial_number(&self) -> Option<&str> {
        self.hub_serial_number.as_deref()
    }

    /// Returns `true` once the sensor has received both a status message
    /// and an observation.
    #[must_use]
    pub fn load_complete(&self) -> bool {
        self.status_complete && self.observation_complete
    }

    /// Returns the timestamp of the last status message in UTC.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.epoch.and_then(|epoch| DateTime::from_timestamp(epoch, 0))
    }

    /// Returns the uptime in seconds.
    #[must_use]
    pub fn uptime(&self) -> Option<i64> {
        self.uptime
    }

    /// Returns the moment the sensor booted, in UTC.
    #[must_use]
    pub fn up_since(&self) -> Option<DateTime<Utc>> {
        match (self.epoch, self.uptime) {
            (Some(epoch), Some(uptime)) => DateTime::from_timestamp(epoch - uptime, 0),
            _ => None,
        }
    }

    /// Returns the status battery voltage in volts.
    #[must_use]
    pub fn voltage(&self) -> Option<f64> {
        self.voltage
    }

    /// Returns the firmware revision.
    #[must_use]
    pub fn firmware_revision(&self) -> Option<&str> {
        self.firmware_revision.as_deref()
    }

    /// Returns the sensor radio signal strength in dB.
    #[must_use]
    pub fn rssi(&self) -> Option<i64> {
        self.rssi
    }

    /// Returns the hub-side radio signal strength in dB.
    #[must_use]
    pub fn hub_rssi(&self) -> Option<i64> {
        self.hub_rssi
    }

    /// Returns `true` if the sensor reports debug mode.
    #[must_use]
    pub fn debug(&self) -> Option<bool> {
        self.debug
    }

    /// Returns the decoded sensor fault descriptions from the status
    /// bitmask, empty when no faults are flagged.
    #[must_use]
    pub fn sensor_faults(&self) -> Vec<&'static str> {
        let Some(status) = self.sensor_status else {
            return Vec::new();
        };
        SENSOR_FAULTS
            .iter()
            .filter(|(mask, _)| status & mask != 0)
            .map(|(_, description)| *description)
            .collect()
    }

    /// Returns the observation battery voltage in volts.
    #[must_use]
    pub fn battery(&self) -> Option<f64> {
        self.battery
    }

    /// Returns the timestamp of the last observation report in UTC.
    #[must_use]
    pub fn last_report(&self) -> Option<DateTime<Utc>> {
        self.last_report_epoch
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
    }

    /// Returns the observation report interval in minutes.
    #[must_use]
    pub fn report_interval(&self) -> Option<i64> {
        self.report_interval
    }

    // ========== Air capability ==========

    /// Returns the station pressure.
    #[must_use]
    pub fn station_pressure(&self) -> Option<Pressure> {
        self.air.as_ref()?.station_pressure.map(Pressure::from_millibars)
    }

    /// Returns the air temperature.
    #[must_use]
    pub fn air_temperature(&self) -> Option<Temperature> {
        self.air.as_ref()?.air_temperature.map(Temperature::from_celsius)
    }

    /// Returns the relative humidity in percent.
    #[must_use]
    pub fn relative_humidity(&self) -> Option<f64> {
        self.air.as_ref()?.relative_humidity
    }

    /// Returns the lightning strike count for the reporting period.
    #[must_use]
    pub fn lightning_strike_count(&self) -> Option<i64> {
        self.air.as_ref()?.lightning_strike_count
    }

    /// Returns the average lightning strike distance.
    #[must_use]
    pub fn lightning_strike_average_distance(&self) -> Option<Distance> {
        self.air
            .as_ref()?
            .lightning_strike_average_distance
            .map(Distance::from_kilometers)
    }

    /// Returns the last lightning strike event, if one has been seen.
    #[must_use]
    pub fn last_lightning_strike(&self) -> Option<&LightningStrike> {
        self.air.as_ref()?.last_strike.as_ref()
    }

    // ========== Sky capability ==========

    /// Returns the illuminance in lux.
    #[must_use]
    pub fn illuminance(&self) -> Option<i64> {
        self.sky.as_ref()?.illuminance
    }

    /// Returns the UV index.
    #[must_use]
    pub fn uv(&self) -> Option<f64> {
        self.sky.as_ref()?.uv
    }

    /// Returns the rain amount over the previous minute in millimeters.
    #[must_use]
    pub fn rain_amount_previous_minute(&self) -> Option<f64> {
        self.sky.as_ref()?.rain_amount_previous_minute
    }

    /// Returns the wind lull.
    #[must_use]
    pub fn wind_lull(&self) -> Option<Speed> {
        self.sky.as_ref()?.wind_lull.map(Speed::from_meters_per_second)
    }

    /// Returns the wind average.
    #[must_use]
    pub fn wind_average(&self) -> Option<Speed> {
        self.sky.as_ref()?.wind_average.map(Speed::from_meters_per_second)
    }

    /// Returns the wind gust.
    #[must_use]
    pub fn wind_gust(&self) -> Option<Speed> {
        self.sky.as_ref()?.wind_gust.map(Speed::from_meters_per_second)
    }

    /// Returns the wind direction in degrees.
    #[must_use]
    pub fn wind_direction(&self) -> Option<i64> {
        self.sky.as_ref()?.wind_direction
    }

    /// Returns the current wind speed: the latest rapid wind sample when
    /// one exists, else the observation wind average.
    #[must_use]
    pub fn wind_speed(&self) -> Option<Speed> {
        let sky = self.sky.as_ref()?;
        sky.last_wind
            .as_ref()
            .and_then(|sample| sample.speed)
            .or_else(|| sky.wind_average.map(Speed::from_meters_per_second))
    }

    /// Returns the solar radiation in watts per square meter.
    #[must_use]
    pub fn solar_radiation(&self) -> Option<i64> {
        self.sky.as_ref()?.solar_radiation
    }

    /// Returns the precipitation type.
    #[must_use]
    pub fn precipitation_type(&self) -> Option<PrecipitationType> {
        self.sky
            .as_ref()?
            .precipitation_type
            .map(PrecipitationType::from_raw)
    }

    /// Returns the wind sample interval in seconds.
    #[must_use]
    pub fn wind_sample_interval(&self) -> Option<i64> {
        self.sky.as_ref()?.wind_sample_interval
    }

    /// Returns the last rain start, if one has been seen.
    #[must_use]
    pub fn last_rain_start(&self) -> Option<DateTime<Utc>> {
        self.sky
            .as_ref()?
            .last_rain_start_epoch
            .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
    }

    /// Returns the last rapid wind sample, if one has been seen.
    #[must_use]
    pub fn last_wind_sample(&self) -> Option<&WindSample> {
        self.sky.as_ref()?.last_wind.as_ref()
    }

    // ========== Derived metrics ==========
    //
    // Computed on read from the raw decoded fields, never cached.

    /// Returns the dew point temperature.
    #[must_use]
    pub fn dew_point_temperature(&self) -> Option<Temperature> {
        Some(calc::dew_point_temperature(
            self.air_temperature()?,
            self.relative_humidity()?,
        ))
    }

    /// Returns the heat index, when conditions produce one.
    #[must_use]
    pub fn heat_index(&self) -> Option<Temperature> {
        calc::heat_index(self.air_temperature()?, self.relative_humidity()?)
    }

    /// Returns the wind chill temperature, when conditions produce one.
    #[must_use]
    pub fn wind_chill_temperature(&self) -> Option<Temperature> {
        calc::wind_chill(self.air_temperature()?, self.wind_speed()?)
    }

    /// Returns the "feels like" temperature: heat index when it applies,
    /// else wind chill, else the plain air temperature.
    #[must_use]
    pub fn feels_like_temperature(&self) -> Option<Temperature> {
        if let Some(heat_index) = self.heat_index() {
            return Some(heat_index);
        }
        if let Some(wind_chill) = self.wind_chill_temperature() {
            return Some(wind_chill);
        }
        self.air_temperature()
    }

    /// Returns the wet bulb temperature.
    #[must_use]
    pub fn wet_bulb_temperature(&self) -> Option<Temperature> {
        Some(calc::wet_bulb_temperature(
            self.air_temperature()?,
            self.relative_humidity()?,
        ))
    }

    /// Returns the vapor pressure.
    #[must_use]
    pub fn vapor_pressure(&self) -> Option<Pressure> {
        Some(calc::vapor_pressure(
            self.air_temperature()?,
            self.relative_humidity()?,
        ))
    }

    /// Returns the air density in kilograms per cubic meter.
    #[must_use]
    pub fn air_density(&self) -> Option<f64> {
        Some(calc::air_density(
            self.air_temperature()?,
            self.station_pressure()?,
        ))
    }

    /// Returns the sea level pressure for a station at `altitude`.
    #[must_use]
    pub fn sea_level_pressure(&self, altitude: Length) -> Option<Pressure> {
        Some(calc::sea_level_pressure(self.station_pressure()?, altitude))
    }

    /// Returns the estimated cloud base altitude for a station at
    /// `altitude`.
    #[must_use]
    pub fn cloud_base(&self, altitude: Length) -> Option<Length> {
        Some(calc::cloud_base(
            self.air_temperature()?,
            self.relative_humidity()?,
            altitude,
        ))
    }

    /// Returns the estimated freezing level altitude for a station at
    /// `altitude`.
    #[must_use]
    pub fn freezing_level(&self, altitude: Length) -> Option<Length> {
        Some(calc::freezing_level(self.air_temperature()?, altitude))
    }

    // ========== Message application ==========

    /// Records the hub back-reference carried by a message.
    pub(crate) fn record_hub(&mut self, hub_serial_number: &str) {
        if self.hub_serial_number.as_deref() != Some(hub_serial_number) {
            self.hub_serial_number = Some(hub_serial_number.to_string());
        }
    }

    /// Merges a device status message and returns the events to raise.
    pub(crate) fn apply_status(&mut self, msg: &DeviceStatusMessage) -> Vec<Event> {
        let old_up_since = self.epoch.unwrap_or(0) - self.uptime.unwrap_or(0);

        self.epoch = Some(msg.epoch);
        if let Some(uptime) = msg.uptime {
            self.uptime = Some(uptime);
        }

        // Tempest timestamp/uptime combos oscillate a few seconds between
        // reports; fold small shifts into the uptime so up_since stays
        // stable instead of flapping on every status.
        if self.status_complete
            && let Some(uptime) = self.uptime
        {
            let dif = (msg.epoch - uptime) - old_up_since;
            if dif != 0 && dif.abs() < UP_SINCE_JITTER_SECONDS {
                self.uptime = Some(uptime + dif);
            }
        }

        if let Some(voltage) = msg.voltage {
            self.voltage = Some(voltage);
        }
        if msg.firmware_revision.is_some() {
            self.firmware_revision.clone_from(&msg.firmware_revision);
        }
        if let Some(rssi) = msg.rssi {
            self.rssi = Some(rssi);
        }
        if let Some(hub_rssi) = msg.hub_rssi {
            self.hub_rssi = Some(hub_rssi);
        }
        if let Some(status) = msg.sensor_status {
            self.sensor_status = Some(status);
        }
        if let Some(debug) = msg.debug {
            self.debug = Some(debug);
        }

        let mut events = Vec::with_capacity(2);
        if !self.status_complete {
            self.status_complete = true;
            self.push_load_complete(&mut events);
        }
        events.push(Event::StatusUpdate {
            serial_number: self.serial_number.clone(),
            epoch: msg.epoch,
        });
        events
    }

    /// Merges an Air observation and returns the events to raise.
    pub(crate) fn apply_air_observation(&mut self, msg: &AirObservation) -> Vec<Event> {
        self.last_report_epoch = Some(msg.epoch);
        msg.battery.apply_to(&mut self.battery);
        msg.report_interval.apply_to(&mut self.report_interval);

        if let Some(air) = &mut self.air {
            msg.station_pressure.apply_to(&mut air.station_pressure);
            msg.air_temperature.apply_to(&mut air.air_temperature);
            msg.relative_humidity.apply_to(&mut air.relative_humidity);
            msg.lightning_strike_count
                .apply_to(&mut air.lightning_strike_count);
            msg.lightning_strike_average_distance
                .apply_to(&mut air.lightning_strike_average_distance);
        }

        self.finish_observation(msg.epoch)
    }

    /// Merges a Sky observation and returns the events to raise.
    pub(crate) fn apply_sky_observation(&mut self, msg: &SkyObservation) -> Vec<Event> {
        self.last_report_epoch = Some(msg.epoch);
        msg.battery.apply_to(&mut self.battery);
        msg.report_interval.apply_to(&mut self.report_interval);

        if let Some(sky) = &mut self.sky {
            msg.illuminance.apply_to(&mut sky.illuminance);
            msg.uv.apply_to(&mut sky.uv);
            msg.rain_amount_previous_minute
                .apply_to(&mut sky.rain_amount_previous_minute);
            msg.wind_lull.apply_to(&mut sky.wind_lull);
            msg.wind_average.apply_to(&mut sky.wind_average);
            msg.wind_gust.apply_to(&mut sky.wind_gust);
            msg.wind_direction.apply_to(&mut sky.wind_direction);
            msg.solar_radiation.apply_to(&mut sky.solar_radiation);
            msg.precipitation_type.apply_to(&mut sky.precipitation_type);
            msg.wind_sample_interval
                .apply_to(&mut sky.wind_sample_interval);
        }

        self.finish_observation(msg.epoch)
    }

    /// Merges a Tempest observation and returns the events to raise.
    pub(crate) fn apply_tempest_observation(&mut self, msg: &TempestObservation) -> Vec<Event> {
        self.last_report_epoch = Some(msg.epoch);
        msg.battery.apply_to(&mut self.battery);
        msg.report_interval.apply_to(&mut self.report_interval);

        if let Some(air) = &mut self.air {
            msg.station_pressure.apply_to(&mut air.station_pressure);
            msg.air_temperature.apply_to(&mut air.air_temperature);
            msg.relative_humidity.apply_to(&mut air.relative_humidity);
            msg.lightning_strike_count
                .apply_to(&mut air.lightning_strike_count);
            msg.lightning_strike_average_distance
                .apply_to(&mut air.lightning_strike_average_distance);
        }
        if let Some(sky) = &mut self.sky {
            msg.wind_lull.apply_to(&mut sky.wind_lull);
            msg.wind_average.apply_to(&mut sky.wind_average);
            msg.wind_gust.apply_to(&mut sky.wind_gust);
            msg.wind_direction.apply_to(&mut sky.wind_direction);
            msg.wind_sample_interval
                .apply_to(&mut sky.wind_sample_interval);
            msg.illuminance.apply_to(&mut sky.illuminance);
            msg.uv.apply_to(&mut sky.uv);
            msg.solar_radiation.apply_to(&mut sky.solar_radiation);
            msg.rain_amount_previous_minute
                .apply_to(&mut sky.rain_amount_previous_minute);
            msg.precipitation_type.apply_to(&mut sky.precipitation_type);
        }

        self.finish_observation(msg.epoch)
    }

    /// Records a lightning strike event and returns the events to raise.
    ///
    /// A strike older than the last accepted one is logged and dropped.
    pub(crate) fn apply_strike(&mut self, msg: &LightningStrikeMessage) -> Vec<Event> {
        let Some(air) = &mut self.air else {
            return Vec::new();
        };

        let last_epoch = air.last_strike.map_or(0, |strike| strike.epoch);
        if msg.epoch < last_epoch {
            tracing::warn!(
                serial_number = %self.serial_number,
                epoch = msg.epoch,
                "Received an old strike event"
            );
            return Vec::new();
        }

        air.last_strike = Some(LightningStrike {
            epoch: msg.epoch,
            distance: msg.distance.map(Distance::from_kilometers),
            energy: msg.energy,
        });

        vec![Event::Strike {
            serial_number: self.serial_number.clone(),
            epoch: msg.epoch,
            distance: msg.distance.map(Distance::from_kilometers),
            energy: msg.energy,
        }]
    }

    /// Records a rain start event and returns the events to raise.
    pub(crate) fn apply_rain_start(&mut self, msg: &RainStartMessage) -> Vec<Event> {
        let Some(sky) = &mut self.sky else {
            return Vec::new();
        };

        let last_epoch = sky.last_rain_start_epoch.unwrap_or(0);
        if msg.epoch < last_epoch {
            tracing::warn!(
                serial_number = %self.serial_number,
                epoch = msg.epoch,
                "Received an old rain start event"
            );
            return Vec::new();
        }

        sky.last_rain_start_epoch = Some(msg.epoch);

        vec![Event::RainStart {
            serial_number: self.serial_number.clone(),
            epoch: msg.epoch,
        }]
    }

    /// Records a rapid wind sample and returns the events to raise.
    pub(crate) fn apply_rapid_wind(&mut self, msg: &RapidWindMessage) -> Vec<Event> {
        let Some(sky) = &mut self.sky else {
            return Vec::new();
        };

        let last_epoch = sky.last_wind.map_or(0, |sample| sample.epoch);
        if msg.epoch < last_epoch {
            tracing::warn!(
                serial_number = %self.serial_number,
                epoch = msg.epoch,
                "Received an old wind report"
            );
            return Vec::new();
        }

        sky.last_wind = Some(WindSample {
            epoch: msg.epoch,
            speed: msg.wind_speed.map(Speed::from_meters_per_second),
            direction: msg.wind_direction,
        });

        vec![Event::RapidWind {
            serial_number: self.serial_number.clone(),
            epoch: msg.epoch,
            speed: msg.wind_speed.map(Speed::from_meters_per_second),
            direction: msg.wind_direction,
        }]
    }

    /// Completes an observation merge: handles the load-complete
    /// transition and appends the `Observation` event after it.
    fn finish_observation(&mut self, epoch: i64) -> Vec<Event> {
        let mut events = Vec::with_capacity(2);
        if !self.observation_complete {
            self.observation_complete = true;
            self.push_load_complete(&mut events);
        }
        events.push(Event::Observation {
            serial_number: self.serial_number.clone(),
            epoch,
        });
        events
    }

    /// Appends `LoadComplete` if both halves of the first load are done.
    fn push_load_complete(&self, events: &mut Vec<Event>) {
        if self.load_complete() {
            let epoch = self.epoch.unwrap_or(0).max(self.last_report_epoch.unwrap_or(0));
            events.push(Event::LoadComplete {
                serial_number: self.serial_number.clone(),
                epoch,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    const SERIAL: &str = "ST-00000512";

    fn status(epoch: i64) -> DeviceStatusMessage {
        DeviceStatusMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: Some("HB-00013030".to_string()),
            epoch,
            uptime: Some(2189),
            voltage: Some(3.5),
            firmware_revision: Some("129".to_string()),
            rssi: Some(-17),
            hub_rssi: Some(-87),
            sensor_status: Some(0),
            debug: Some(false),
        }
    }

    fn observation(epoch: i64) -> TempestObservation {
        TempestObservation {
            serial_number: SERIAL.to_string(),
            hub_serial_number: Some("HB-00013030".to_string()),
            epoch,
            wind_lull: Field::Value(0.18),
            wind_average: Field::Value(0.22),
            wind_gust: Field::Value(0.27),
            wind_direction: Field::Value(144),
            wind_sample_interval: Field::Value(6),
            station_pressure: Field::Value(1017.57),
            air_temperature: Field::Value(22.37),
            relative_humidity: Field::Value(50.26),
            illuminance: Field::Value(328),
            uv: Field::Value(0.03),
            solar_radiation: Field::Value(3),
            rain_amount_previous_minute: Field::Value(0.0),
            precipitation_type: Field::Value(0),
            lightning_strike_average_distance: Field::Value(0.0),
            lightning_strike_count: Field::Value(0),
            battery: Field::Value(2.41),
            report_interval: Field::Value(1),
        }
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(Event::kind).collect()
    }

    #[test]
    fn model_capabilities() {
        assert!(SensorModel::Air.has_air_capability());
        assert!(!SensorModel::Air.has_sky_capability());
        assert!(!SensorModel::Sky.has_air_capability());
        assert!(SensorModel::Sky.has_sky_capability());
        assert!(SensorModel::Tempest.has_air_capability());
        assert!(SensorModel::Tempest.has_sky_capability());
    }

    #[test]
    fn status_alone_does_not_complete_load() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        let events = sensor.apply_status(&status(100));
        assert_eq!(kinds(&events), vec![EventKind::StatusUpdate]);
        assert!(!sensor.load_complete());
    }

    #[test]
    fn observation_alone_does_not_complete_load() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        let events = sensor.apply_tempest_observation(&observation(100));
        assert_eq!(kinds(&events), vec![EventKind::Observation]);
        assert!(!sensor.load_complete());
    }

    #[test]
    fn load_complete_precedes_observation_when_status_came_first() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_status(&status(100));

        let events = sensor.apply_tempest_observation(&observation(200));
        assert_eq!(
            kinds(&events),
            vec![EventKind::LoadComplete, EventKind::Observation]
        );
        assert!(sensor.load_complete());
    }

    #[test]
    fn load_complete_precedes_status_when_observation_came_first() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_tempest_observation(&observation(100));

        let events = sensor.apply_status(&status(200));
        assert_eq!(
            kinds(&events),
            vec![EventKind::LoadComplete, EventKind::StatusUpdate]
        );
    }

    #[test]
    fn load_complete_fires_exactly_once() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_status(&status(100));
        sensor.apply_tempest_observation(&observation(200));

        let events = sensor.apply_status(&status(300));
        assert_eq!(kinds(&events), vec![EventKind::StatusUpdate]);
        let events = sensor.apply_tempest_observation(&observation(400));
        assert_eq!(kinds(&events), vec![EventKind::Observation]);
    }

    #[test]
    fn load_complete_epoch_is_latest_of_status_and_report() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_status(&status(300));
        let events = sensor.apply_tempest_observation(&observation(200));
        assert_eq!(
            events[0],
            Event::LoadComplete {
                serial_number: SERIAL.to_string(),
                epoch: 300,
            }
        );
    }

    #[test]
    fn observation_fields_are_unit_tagged() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_tempest_observation(&observation(100));

        assert_eq!(sensor.air_temperature().unwrap().celsius(), 22.37);
        assert_eq!(sensor.station_pressure().unwrap().millibars(), 1017.57);
        assert_eq!(sensor.wind_gust().unwrap().meters_per_second(), 0.27);
        assert_eq!(sensor.relative_humidity(), Some(50.26));
        assert_eq!(sensor.precipitation_type(), Some(PrecipitationType::None));
        assert_eq!(sensor.battery(), Some(2.41));
    }

    #[test]
    fn null_wind_fields_stay_unknown_not_zero() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        // Low-voltage mode: wind fields arrive as explicit unknowns
        let msg = TempestObservation {
            serial_number: SERIAL.to_string(),
            epoch: 100,
            wind_lull: Field::Unknown,
            wind_average: Field::Unknown,
            wind_gust: Field::Unknown,
            air_temperature: Field::Value(20.0),
            ..TempestObservation::default()
        };
        sensor.apply_tempest_observation(&msg);

        assert!(sensor.wind_average().is_none());
        assert!(sensor.wind_gust().is_none());
        assert_eq!(sensor.air_temperature().unwrap().celsius(), 20.0);
    }

    #[test]
    fn truncated_fields_preserve_previous_values() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_tempest_observation(&observation(100));

        let sparse = TempestObservation {
            serial_number: SERIAL.to_string(),
            epoch: 200,
            air_temperature: Field::Value(23.0),
            ..TempestObservation::default()
        };
        sensor.apply_tempest_observation(&sparse);

        assert_eq!(sensor.air_temperature().unwrap().celsius(), 23.0);
        // Fields past the end of the row keep their previous values
        assert_eq!(sensor.station_pressure().unwrap().millibars(), 1017.57);
        assert_eq!(sensor.wind_average().unwrap().meters_per_second(), 0.22);
    }

    #[test]
    fn explicit_null_clears_previous_value() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_tempest_observation(&observation(100));
        assert_eq!(sensor.wind_average().unwrap().meters_per_second(), 0.22);

        // The station drops to low-voltage mode and reports the wind
        // fields as null: the stale readings must not survive.
        let low_voltage = TempestObservation {
            serial_number: SERIAL.to_string(),
            epoch: 200,
            wind_lull: Field::Unknown,
            wind_average: Field::Unknown,
            wind_gust: Field::Unknown,
            air_temperature: Field::Value(21.0),
            ..TempestObservation::default()
        };
        sensor.apply_tempest_observation(&low_voltage);

        assert!(sensor.wind_lull().is_none());
        assert!(sensor.wind_average().is_none());
        assert!(sensor.wind_gust().is_none());
        assert_eq!(sensor.air_temperature().unwrap().celsius(), 21.0);
        // Fields the row did not reach are untouched
        assert_eq!(sensor.station_pressure().unwrap().millibars(), 1017.57);
    }

    #[test]
    fn up_since_jitter_is_damped() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);

        let mut first = status(100_000);
        first.uptime = Some(1000);
        sensor.apply_status(&first);
        let up_since = sensor.up_since().unwrap();

        // 100 seconds later the uptime oscillates 3 seconds
        let mut second = status(100_100);
        second.uptime = Some(1103);
        sensor.apply_status(&second);

        assert_eq!(sensor.up_since().unwrap(), up_since);
    }

    #[test]
    fn up_since_large_shift_is_not_damped() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);

        let mut first = status(100_000);
        first.uptime = Some(1000);
        sensor.apply_status(&first);

        // A reboot: uptime resets, up_since moves far forward
        let mut second = status(100_100);
        second.uptime = Some(10);
        sensor.apply_status(&second);

        assert_eq!(
            sensor.up_since().unwrap().timestamp(),
            100_100 - 10
        );
    }

    #[test]
    fn strike_event_updates_state_and_raises() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        let events = sensor.apply_strike(&LightningStrikeMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: None,
            epoch: 100,
            distance: Some(27.0),
            energy: Some(3848),
        });

        assert_eq!(kinds(&events), vec![EventKind::Strike]);
        let strike = sensor.last_lightning_strike().unwrap();
        assert_eq!(strike.distance.unwrap().kilometers(), 27.0);
        assert_eq!(strike.energy, Some(3848));
    }

    #[test]
    fn stale_strike_event_is_dropped() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_strike(&LightningStrikeMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: None,
            epoch: 200,
            distance: Some(27.0),
            energy: Some(3848),
        });

        let events = sensor.apply_strike(&LightningStrikeMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: None,
            epoch: 100,
            distance: Some(5.0),
            energy: Some(1),
        });

        assert!(events.is_empty());
        assert_eq!(sensor.last_lightning_strike().unwrap().epoch, 200);
    }

    #[test]
    fn events_do_not_complete_load() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_status(&status(100));
        sensor.apply_strike(&LightningStrikeMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: None,
            epoch: 200,
            distance: None,
            energy: None,
        });
        // Strike events are not observations
        assert!(!sensor.load_complete());
    }

    #[test]
    fn rapid_wind_low_power_sample_reads_unknown() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        let events = sensor.apply_rapid_wind(&RapidWindMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: None,
            epoch: 100,
            wind_speed: None,
            wind_direction: None,
        });

        assert_eq!(kinds(&events), vec![EventKind::RapidWind]);
        let sample = sensor.last_wind_sample().unwrap();
        assert!(sample.speed.is_none());
        assert!(sample.direction.is_none());
    }

    #[test]
    fn rain_start_records_epoch() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Sky);
        let events = sensor.apply_rain_start(&RainStartMessage {
            serial_number: "SK-00008453".to_string(),
            hub_serial_number: None,
            epoch: 1_493_322_445,
        });
        assert_eq!(kinds(&events), vec![EventKind::RainStart]);
        assert_eq!(
            sensor.last_rain_start().unwrap().timestamp(),
            1_493_322_445
        );
    }

    #[test]
    fn sensor_faults_decode_from_bitmask() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        let mut msg = status(100);
        msg.sensor_status = Some(0b0000_1001);
        sensor.apply_status(&msg);

        assert_eq!(
            sensor.sensor_faults(),
            vec!["Lightning Failed", "Pressure Failed"]
        );
    }

    #[test]
    fn no_faults_for_clean_status() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_status(&status(100));
        assert!(sensor.sensor_faults().is_empty());
    }

    #[test]
    fn derived_metrics_need_their_inputs() {
        let sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        assert!(sensor.dew_point_temperature().is_none());
        assert!(sensor.feels_like_temperature().is_none());
        assert!(sensor.sea_level_pressure(Length::from_meters(1000.0)).is_none());
    }

    #[test]
    fn derived_metrics_from_observation() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_tempest_observation(&observation(100));

        let dew_point = sensor.dew_point_temperature().unwrap();
        assert!(dew_point.celsius() < sensor.air_temperature().unwrap().celsius());

        // Mild conditions: feels-like falls back to the air temperature
        assert_eq!(
            sensor.feels_like_temperature(),
            sensor.air_temperature()
        );

        assert!(sensor.air_density().unwrap() > 1.0);
        assert!(
            sensor.sea_level_pressure(Length::from_meters(100.0)).unwrap().millibars()
                > 1017.57
        );
    }

    #[test]
    fn wind_speed_prefers_rapid_wind_sample() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        sensor.apply_tempest_observation(&observation(100));
        assert_eq!(sensor.wind_speed().unwrap().meters_per_second(), 0.22);

        sensor.apply_rapid_wind(&RapidWindMessage {
            serial_number: SERIAL.to_string(),
            hub_serial_number: None,
            epoch: 200,
            wind_speed: Some(2.3),
            wind_direction: Some(128),
        });
        assert_eq!(sensor.wind_speed().unwrap().meters_per_second(), 2.3);
    }

    #[test]
    fn air_model_has_no_sky_state() {
        let sensor = SensorDevice::new("AR-00004049", SensorModel::Air);
        assert!(sensor.illuminance().is_none());
        assert!(sensor.wind_average().is_none());
        assert!(sensor.last_wind_sample().is_none());
    }

    #[test]
    fn hub_back_reference_is_recorded() {
        let mut sensor = SensorDevice::new(SERIAL, SensorModel::Tempest);
        assert!(sensor.hub_serial_number().is_none());
        sensor.record_hub("HB-00013030");
        assert_eq!(sensor.hub_serial_number(), Some("HB-00013030"));
    }
}
