// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature quantity.

use std::fmt;

use serde::Serialize;

/// A temperature, stored natively in degrees Celsius.
///
/// # Examples
///
/// ```
/// use tempest_lib::types::Temperature;
///
/// let temp = Temperature::from_celsius(10.0);
/// assert_eq!(temp.celsius(), 10.0);
/// assert_eq!(temp.fahrenheit(), 50.0);
/// assert_eq!(temp.kelvin(), 283.15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Temperature(f64);

impl Temperature {
    /// Creates a temperature from degrees Celsius.
    #[must_use]
    pub fn from_celsius(degrees: f64) -> Self {
        Self(degrees)
    }

    /// Creates a temperature from degrees Fahrenheit.
    #[must_use]
    pub fn from_fahrenheit(degrees: f64) -> Self {
        Self((degrees - 32.0) * 5.0 / 9.0)
    }

    /// Returns the temperature in degrees Celsius.
    #[must_use]
    pub fn celsius(&self) -> f64 {
        self.0
    }

    /// Returns the temperature in degrees Fahrenheit.
    #[must_use]
    pub fn fahrenheit(&self) -> f64 {
        self.0 * 9.0 / 5.0 + 32.0
    }

    /// Returns the temperature in kelvins.
    #[must_use]
    pub fn kelvin(&self) -> f64 {
        self.0 + 273.15
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} °C", self.0)
    }
}
