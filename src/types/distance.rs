// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Distance quantity.

use std::fmt;

use serde::Serialize;

/// A distance, stored natively in kilometers.
///
/// Used for lightning strike distances, which WeatherFlow reports in
/// kilometers.
///
/// # Examples
///
/// ```
/// use tempest_lib::types::Distance;
///
/// let distance = Distance::from_kilometers(27.0);
/// assert_eq!(distance.meters(), 27000.0);
/// assert!((distance.miles() - 16.777).abs() < 0.001);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Distance(f64);

/// Miles per kilometer.
const MILES_PER_KILOMETER: f64 = 0.621_371_192_237_334;

impl Distance {
    /// Creates a distance from kilometers.
    #[must_use]
    pub fn from_kilometers(kilometers: f64) -> Self {
        Self(kilometers)
    }

    /// Returns the distance in kilometers.
    #[must_use]
    pub fn kilometers(&self) -> f64 {
        self.0
    }

    /// Returns the distance in meters.
    #[must_use]
    pub fn meters(&self) -> f64 {
        self.0 * 1000.0
    }

    /// Returns the distance in miles.
    #[must_use]
    pub fn miles(&self) -> f64 {
        self.0 * MILES_PER_KILOMETER
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} km", self.0)
    }
}
