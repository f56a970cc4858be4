// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Length quantity for altitudes.

use std::fmt;

use serde::Serialize;

/// A length, stored natively in meters.
///
/// Used for station altitude and altitude-derived metrics (cloud base,
/// freezing level).
///
/// # Examples
///
/// ```
/// use tempest_lib::types::Length;
///
/// let altitude = Length::from_meters(1000.0);
/// assert!((altitude.feet() - 3280.84).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Length(f64);

/// Feet per meter.
const FEET_PER_METER: f64 = 3.280_839_895_013_123;

impl Length {
    /// Creates a length from meters.
    #[must_use]
    pub fn from_meters(meters: f64) -> Self {
        Self(meters)
    }

    /// Creates a length from feet.
    #[must_use]
    pub fn from_feet(feet: f64) -> Self {
        Self(feet / FEET_PER_METER)
    }

    /// Returns the length in meters.
    #[must_use]
    pub fn meters(&self) -> f64 {
        self.0
    }

    /// Returns the length in feet.
    #[must_use]
    pub fn feet(&self) -> f64 {
        self.0 * FEET_PER_METER
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m", self.0)
    }
}
