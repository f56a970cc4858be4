// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Atmospheric pressure quantity.

use std::fmt;

use serde::Serialize;

/// An atmospheric pressure, stored natively in millibars.
///
/// One millibar equals one hectopascal, so [`Pressure::hectopascals`] is
/// an alias for the native magnitude.
///
/// # Examples
///
/// ```
/// use tempest_lib::types::Pressure;
///
/// let pressure = Pressure::from_millibars(1013.25);
/// assert_eq!(pressure.hectopascals(), 1013.25);
/// assert!((pressure.inches_of_mercury() - 29.92).abs() < 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Pressure(f64);

/// Pascals per millibar.
const PASCALS_PER_MILLIBAR: f64 = 100.0;

/// Inches of mercury per millibar.
const INHG_PER_MILLIBAR: f64 = 0.029_529_983_071_445;

impl Pressure {
    /// Creates a pressure from millibars.
    #[must_use]
    pub fn from_millibars(millibars: f64) -> Self {
        Self(millibars)
    }

    /// Creates a pressure from pascals.
    #[must_use]
    pub fn from_pascals(pascals: f64) -> Self {
        Self(pascals / PASCALS_PER_MILLIBAR)
    }

    /// Returns the pressure in millibars.
    #[must_use]
    pub fn millibars(&self) -> f64 {
        self.0
    }

    /// Returns the pressure in hectopascals.
    #[must_use]
    pub fn hectopascals(&self) -> f64 {
        self.0
    }

    /// Returns the pressure in pascals.
    #[must_use]
    pub fn pascals(&self) -> f64 {
        self.0 * PASCALS_PER_MILLIBAR
    }

    /// Returns the pressure in inches of mercury.
    #[must_use]
    pub fn inches_of_mercury(&self) -> f64 {
        self.0 * INHG_PER_MILLIBAR
    }
}

impl fmt::Display for Pressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} mbar", self.0)
    }
}
