// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire protocol: message types and the datagram codec.
//!
//! WeatherFlow stations broadcast one UTF-8 JSON object per UDP datagram,
//! tagged with a `type` discriminator and a `serial_number`. Depending on
//! the message type, the payload is either a flat set of named fields
//! (status messages) or a positional array of numeric fields in a fixed,
//! documented order (observations and events).

mod codec;
mod message;

pub use codec::decode;
pub use message::{
    AirObservation, DecodedMessage, DeviceStatusMessage, Field, HubStatusMessage,
    LightningStrikeMessage, RainStartMessage, RapidWindMessage, SkyObservation,
    TempestObservation, TYPE_DEVICE_STATUS, TYPE_HUB_STATUS, TYPE_OBS_AIR, TYPE_OBS_SKY,
    TYPE_OBS_TEMPEST, TYPE_RAIN_START, TYPE_RAPID_WIND, TYPE_STRIKE,
};
