// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Derived meteorological metrics.
//!
//! Pure functions over unit-tagged observation fields. Nothing here is
//! cached or stateful — sensors call these on demand from their derived
//! property accessors.
//!
//! Formula references:
//! <https://weatherflow.github.io/Tempest/api/derived-metric-formulas.html>

use crate::types::{Length, Pressure, Speed, Temperature};

/// Specific gas constant for dry air, J/(kg·K).
const DRY_AIR_GAS_CONSTANT: f64 = 287.05;

/// Standard atmosphere lapse rate, K/m.
const STANDARD_LAPSE_RATE: f64 = 0.0065;

/// Standard gravity, m/s².
const GRAVITY: f64 = 9.806_65;

/// Standard sea level pressure, mbar.
const STANDARD_SEA_LEVEL_PRESSURE: f64 = 1013.25;

/// Standard sea level temperature, K.
const STANDARD_SEA_LEVEL_TEMPERATURE: f64 = 288.15;

/// Calculates the air density in kilograms per cubic meter (kg/m³).
#[must_use]
pub fn air_density(air_temperature: Temperature, station_pressure: Pressure) -> f64 {
    station_pressure.pascals() / (DRY_AIR_GAS_CONSTANT * air_temperature.kelvin())
}

/// Calculates the estimated altitude above mean sea level to the cloud base.
///
/// Reference: <https://holfuy.com/en/support/cloud-base-calculations>
#[must_use]
pub fn cloud_base(
    air_temperature: Temperature,
    relative_humidity: f64,
    altitude: Length,
) -> Length {
    let spread =
        air_temperature.celsius() - dew_point_temperature(air_temperature, relative_humidity).celsius();
    Length::from_meters(spread * 126.0 + altitude.meters())
}

/// Calculates the dew point temperature.
///
/// Uses the Magnus approximation over water, accurate to well under a
/// tenth of a degree across the sensor's operating range.
#[must_use]
pub fn dew_point_temperature(air_temperature: Temperature, relative_humidity: f64) -> Temperature {
    let temp = air_temperature.celsius();
    let gamma = (relative_humidity / 100.0).ln() + (17.62 * temp) / (243.12 + temp);
    Temperature::from_celsius(243.12 * gamma / (17.62 - gamma))
}

/// Calculates the "feels like" temperature.
///
/// Heat index when it applies, else wind chill, else the plain air
/// temperature.
#[must_use]
pub fn feels_like_temperature(
    air_temperature: Temperature,
    relative_humidity: f64,
    wind_speed: Speed,
) -> Temperature {
    if let Some(temp) = heat_index(air_temperature, relative_humidity) {
        return temp;
    }
    if let Some(temp) = wind_chill(air_temperature, wind_speed) {
        return temp;
    }
    air_temperature
}

/// Calculates the estimated altitude above mean sea level where the
/// temperature is at the freezing point (0 °C / 32 °F).
#[must_use]
pub fn freezing_level(air_temperature: Temperature, altitude: Length) -> Length {
    Length::from_meters(air_temperature.celsius() * 192.0 + altitude.meters())
}

/// Calculates the heat index.
///
/// Only temperatures >= 80 °F (26.66 °C) and relative humidity >= 40 %
/// have a heat index; otherwise returns `None`.
#[must_use]
pub fn heat_index(air_temperature: Temperature, relative_humidity: f64) -> Option<Temperature> {
    let temp_f = air_temperature.fahrenheit();
    let rh = relative_humidity;
    if temp_f < 80.0 || rh < 40.0 {
        return None;
    }

    let heat_idx = -42.379 + 2.049_015_23 * temp_f + 10.143_331_27 * rh
        - 0.224_755_41 * temp_f * rh
        - 0.006_837_83 * temp_f * temp_f
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * temp_f * temp_f * rh
        + 0.000_852_82 * temp_f * rh * rh
        - 0.000_001_99 * temp_f * temp_f * rh * rh;

    Some(Temperature::from_fahrenheit(heat_idx))
}

/// Calculates the sea level pressure in millibars (mbar).
///
/// Reference:
/// <https://weatherflow.github.io/Tempest/api/derived-metric-formulas.html#sea-level-pressure>
#[must_use]
pub fn sea_level_pressure(station_pressure: Pressure, altitude: Length) -> Pressure {
    let p = station_pressure.millibars();
    let h = altitude.meters();
    let exponent = DRY_AIR_GAS_CONSTANT * STANDARD_LAPSE_RATE / GRAVITY;
    let slp = p * (1.0
        + (STANDARD_SEA_LEVEL_PRESSURE / p).powf(exponent)
            * (STANDARD_LAPSE_RATE * h / STANDARD_SEA_LEVEL_TEMPERATURE))
        .powf(1.0 / exponent);
    Pressure::from_millibars(slp)
}

/// Calculates the vapor pressure in millibars (mbar).
#[must_use]
pub fn vapor_pressure(air_temperature: Temperature, relative_humidity: f64) -> Pressure {
    let temp = air_temperature.celsius();
    let saturation = 6.112 * ((17.67 * temp) / (temp + 243.5)).exp();
    Pressure::from_millibars(relative_humidity / 100.0 * saturation)
}

/// Calculates the wet bulb temperature.
///
/// Uses the Stull (2011) approximation, valid for relative humidity
/// between 5 % and 99 % and temperatures between -20 °C and 50 °C.
#[must_use]
pub fn wet_bulb_temperature(air_temperature: Temperature, relative_humidity: f64) -> Temperature {
    let temp = air_temperature.celsius();
    let rh = relative_humidity;
    let wet_bulb = temp * (0.151_977 * (rh + 8.313_659).sqrt()).atan() + (temp + rh).atan()
        - (rh - 1.676_331).atan()
        + 0.003_918_38 * rh.powf(1.5) * (0.023_101 * rh).atan()
        - 4.686_035;
    Temperature::from_celsius(wet_bulb)
}

/// Calculates the wind chill temperature.
///
/// Only temperatures <= 50 °F (10 °C) and winds >= 3 mph (1.34112 m/s)
/// have a wind chill; otherwise returns `None`.
#[must_use]
pub fn wind_chill(air_temperature: Temperature, wind_speed: Speed) -> Option<Temperature> {
    let temp_f = air_temperature.fahrenheit();
    let wind_mph = wind_speed.miles_per_hour();
    if temp_f > 50.0 || wind_mph < 3.0 {
        return None;
    }

    let chill = 35.74 + 0.6215 * temp_f - 35.75 * wind_mph.powf(0.16)
        + 0.4275 * temp_f * wind_mph.powf(0.16);

    Some(Temperature::from_fahrenheit(chill))
}
