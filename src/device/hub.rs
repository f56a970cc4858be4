// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WeatherFlow Hub device.

use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::protocol::HubStatusMessage;

/// Reset flag codes and their descriptions, as documented for hub status
/// messages.
const RESET_FLAGS: &[(&str, &str)] = &[
    ("BOR", "Brownout reset"),
    ("PIN", "PIN reset"),
    ("POR", "Power reset"),
    ("SFT", "Software reset"),
    ("WDG", "Watchdog reset"),
    ("WWD", "Window watchdog reset"),
    ("LPW", "Low-power reset"),
    ("HRDFLT", "Hard fault detected"),
];

/// A WeatherFlow Hub: the gateway that relays sensor broadcasts.
///
/// Hubs have status only, no observations, so a hub is fully loaded
/// after its first status message.
#[derive(Debug, Clone, PartialEq)]
pub struct HubDevice {
    serial_number: String,
    firmware_revision: Option<String>,
    epoch: Option<i64>,
    uptime: Option<i64>,
    rssi: Option<i64>,
    reset_flags: Option<String>,
    seq: Option<i64>,
    radio_stats: Option<Vec<i64>>,
    load_complete: bool,
}

impl HubDevice {
    /// Creates a hub record for a newly sighted serial number.
    #[must_use]
    pub(crate) fn new(serial_number: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            firmware_revision: None,
            epoch: None,
            uptime: None,
            rssi: None,
            reset_flags: None,
            seq: None,
            radio_stats: None,
            load_complete: false,
        }
    }

    /// Returns the serial number.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &'static str {
        "Hub"
    }

    /// Returns `true` once the hub has received its first status message.
    #[must_use]
    pub fn load_complete(&self) -> bool {
        self.load_complete
    }

    /// Returns the firmware revision.
    #[must_use]
    pub fn firmware_revision(&self) -> Option<&str> {
        self.firmware_revision.as_deref()
    }

    /// Returns the Wi-Fi signal strength in dB.
    #[must_use]
    pub fn rssi(&self) -> Option<i64> {
        self.rssi
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

    /// Returns the moment the hub booted, in UTC.
    #[must_use]
    pub fn up_since(&self) -> Option<DateTime<Utc>> {
        match (self.epoch, self.uptime) {
            (Some(epoch), Some(uptime)) => DateTime::from_timestamp(epoch - uptime, 0),
            _ => None,
        }
    }

    /// Returns the decoded reset flags, skipping unrecognized codes.
    #[must_use]
    pub fn reset_flags(&self) -> Vec<&'static str> {
        let Some(raw) = &self.reset_flags else {
            return Vec::new();
        };
        raw.split(',')
            .filter_map(|code| {
                RESET_FLAGS
                    .iter()
                    .find(|(flag, _)| *flag == code)
                    .map(|(_, description)| *description)
            })
            .collect()
    }

    /// Returns the status sequence counter.
    #[must_use]
    pub fn seq(&self) -> Option<i64> {
        self.seq
    }

    /// Returns the raw radio statistics array.
    #[must_use]
    pub fn radio_stats(&self) -> Option<&[i64]> {
        self.radio_stats.as_deref()
    }

    /// Merges a hub status message and returns the events to raise.
    ///
    /// Absent fields preserve the previous state. The first status
    /// message completes the hub's load, and the `LoadComplete` event
    /// precedes the `StatusUpdate` for that same message.
    pub(crate) fn apply_status(&mut self, msg: &HubStatusMessage) -> Vec<Event> {
        self.epoch = Some(msg.epoch);
        if msg.firmware_revision.is_some() {
            self.firmware_revision.clone_from(&msg.firmware_revision);
        }
        if let Some(uptime) = msg.uptime {
            self.uptime = Some(uptime);
        }
        if let Some(rssi) = msg.rssi {
            self.rssi = Some(rssi);
        }
        if msg.reset_flags.is_some() {
            self.reset_flags.clone_from(&msg.reset_flags);
        }
        if let Some(seq) = msg.seq {
            self.seq = Some(seq);
        }
        if msg.radio_stats.is_some() {
            self.radio_stats.clone_from(&msg.radio_stats);
        }

        let mut events = Vec::with_capacity(2);
        if !self.load_complete {
            self.load_complete = true;
            events.push(Event::LoadComplete {
                serial_number: self.serial_number.clone(),
                epoch: msg.epoch,
            });
        }
        events.push(Event::StatusUpdate {
            serial_number: self.serial_number.clone(),
            epoch: msg.epoch,
        });
        events
    }
}
