// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wind speed quantity.

use std::fmt;

use serde::Serialize;

/// A speed, stored natively in meters per second.
///
/// # Examples
///
/// ```
/// use tempest_lib::types::Speed;
///
/// let speed = Speed::from_meters_per_second(10.0);
/// assert_eq!(speed.kilometers_per_hour(), 36.0);
/// assert!((speed.miles_per_hour() - 22.369).abs() < 0.001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Speed(f64);

/// Miles per hour per meter per second.
const MPH_PER_MPS: f64 = 2.236_936_292_054_402;

/// Knots per meter per second.
const KNOTS_PER_MPS: f64 = 1.943_844_492_440_605;

impl Speed {
    /// Creates a speed from meters per second.
    #[must_use]
    pub fn from_meters_per_second(mps: f64) -> Self {
        Self(mps)
    }

    /// Returns the speed in meters per second.
    #[must_use]
    pub fn meters_per_second(&self) -> f64 {
        self.0
    }

    /// Returns the speed in kilometers per hour.
    #[must_use]
    pub fn kilometers_per_hour(&self) -> f64 {
        self.0 * 3.6
    }

    /// Returns the speed in miles per hour.
    #[must_use]
    pub fn miles_per_hour(&self) -> f64 {
        self.0 * MPH_PER_MPS
    }

    /// Returns the speed in knots.
    #[must_use]
    pub fn knots(&self) -> f64 {
        self.0 * KNOTS_PER_MPS
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m/s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mps_round_trip() {
        let speed = Speed::from_meters_per_second(2.3);
        assert_eq!(speed.meters_per_second(), 2.3);
    }

    #[test]
    fn kph_conversion() {
        let speed = Speed::from_meters_per_second(5.0);
        assert_eq!(speed.kilometers_per_hour(), 18.0);
    }

    #[test]
    fn mph_conversion() {
        let speed = Speed::from_meters_per_second(1.0);
        assert!((speed.miles_per_hour() - 2.236_936).abs() < 0.000_001);
    }

    #[test]
    fn knots_conversion() {
        let speed = Speed::from_meters_per_second(1.0);
        assert!((speed.knots() - 1.943_844).abs() < 0.000_001);
    }

    #[test]
    fn display() {
        assert_eq!(Speed::from_meters_per_second(2.3).to_string(), "2.30 m/s");
    }
}
