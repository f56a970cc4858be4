// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event types raised by the listener pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Distance, Speed};

/// The kind of an [`Event`], used for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A serial number was seen for the first time.
    DeviceDiscovered,
    /// A device finished its first full load.
    LoadComplete,
    /// A status message was applied.
    StatusUpdate,
    /// An observation was applied.
    Observation,
    /// A lightning strike was detected.
    Strike,
    /// Rain started.
    RainStart,
    /// A rapid wind sample arrived.
    RapidWind,
}

/// A notification raised by the pipeline.
///
/// Events are plain values: they are delivered synchronously to current
/// subscribers and never buffered or replayed. Each carries the serial
/// number of the originating device and the epoch timestamp of the
/// triggering message.
///
/// Events serialize as JSON objects tagged with an `event` field, so
/// subscribers can forward them to other systems as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A serial number was seen for the first time. Published before the
    /// first message is applied, so subscribers can attach per-device
    /// filters before any `StatusUpdate`, `Observation` or `LoadComplete`
    /// fires for that device.
    DeviceDiscovered {
        /// Serial number of the new device.
        serial_number: String,
        /// Epoch of the message that revealed the device.
        epoch: i64,
    },

    /// The device has received enough initial data to be considered fully
    /// initialized. Fired exactly once per device.
    LoadComplete {
        /// Serial number of the device.
        serial_number: String,
        /// Epoch at which the load completed.
        epoch: i64,
    },

    /// A status message was merged into device state.
    StatusUpdate {
        /// Serial number of the device.
        serial_number: String,
        /// Epoch of the status message.
        epoch: i64,
    },

    /// An observation was merged into sensor state.
    Observation {
        /// Serial number of the sensor.
        serial_number: String,
        /// Epoch of the observation report.
        epoch: i64,
    },

    /// A lightning strike event.
    Strike {
        /// Serial number of the sensor.
        serial_number: String,
        /// Epoch of the strike.
        epoch: i64,
        /// Strike distance, unknown if suppressed.
        distance: Option<Distance>,
        /// Strike energy (dimensionless).
        energy: Option<i64>,
    },

    /// A rain start event.
    RainStart {
        /// Serial number of the sensor.
        serial_number: String,
        /// Epoch of the rain onset.
        epoch: i64,
    },

    /// A rapid wind sample.
    RapidWind {
        /// Serial number of the sensor.
        serial_number: String,
        /// Epoch of the sample.
        epoch: i64,
        /// Wind speed, unknown in low-power modes.
        speed: Option<Speed>,
        /// Wind direction in degrees, unknown in low-power modes.
        direction: Option<i64>,
    },
}

impl Event {
    /// Returns the kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::DeviceDiscovered { .. } => EventKind::DeviceDiscovered,
            Self::LoadComplete { .. } => EventKind::LoadComplete,
            Self::StatusUpdate { .. } => EventKind::StatusUpdate,
            Self::Observation { .. } => EventKind::Observation,
            Self::Strike { .. } => EventKind::Strike,
            Self::RainStart { .. } => EventKind::RainStart,
            Self::RapidWind { .. } => EventKind::RapidWind,
        }
    }

    /// Returns the serial number of the originating device.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        match self {
            Self::DeviceDiscovered { serial_number, .. }
            | Self::LoadComplete { serial_number, .. }
            | Self::StatusUpdate { serial_number, .. }
            | Self::Observation { serial_number, .. }
            | Self::Strike { serial_number, .. }
            | Self::RainStart { serial_number, .. }
            | Self::RapidWind { serial_number, .. } => serial_number,
        }
    }

    /// Returns the event timestamp as Unix epoch seconds.
    #[must_use]
    pub fn epoch(&self) -> i64 {
        match self {
            Self::DeviceDiscovered { epoch, .. }
            | Self::LoadComplete { epoch, .. }
            | Self::StatusUpdate { epoch, .. }
            | Self::Observation { epoch, .. }
            | Self::Strike { epoch, .. }
            | Self::RainStart { epoch, .. }
            | Self::RapidWind { epoch, .. } => *epoch,
        }
    }

    /// Returns the event timestamp in UTC.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.epoch(), 0)
    }
}
