// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Precipitation type reported by Sky and Tempest observations.

use std::fmt;

use serde::Serialize;

/// The kind of precipitation a sensor detected.
///
/// Wire values outside the documented range map to
/// [`PrecipitationType::Unknown`] so future firmware additions never
/// break decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PrecipitationType {
    /// No precipitation.
    #[default]
    None,
    /// Rain.
    Rain,
    /// Hail.
    Hail,
    /// Rain and hail mixed.
    RainHail,
    /// An unrecognized wire value.
    Unknown,
}

impl PrecipitationType {
    /// Maps a raw wire value to a precipitation type.
    #[must_use]
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Rain,
            2 => Self::Hail,
            3 => Self::RainHail,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for PrecipitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Rain => "rain",
            Self::Hail => "hail",
            Self::RainHail => "rain and hail",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}
