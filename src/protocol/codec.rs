// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire codec for WeatherFlow UDP datagrams.
//!
//! [`decode`] is a pure transformation from a raw payload to a
//! [`DecodedMessage`]. Every field is read defensively and never coerced
//! to zero. Positional observation fields keep the wire's distinction
//! between an explicit `null` ([`Field::Unknown`], which clears prior
//! state) and a row truncated before that position ([`Field::Absent`],
//! which preserves it).

use chrono::Utc;
use serde_json::Value;

use crate::error::DecodeError;

use super::message::{
    AirObservation, DecodedMessage, DeviceStatusMessage, Field, HubStatusMessage,
    LightningStrikeMessage, RainStartMessage, RapidWindMessage, SkyObservation,
    TempestObservation, TYPE_DEVICE_STATUS, TYPE_HUB_STATUS, TYPE_OBS_AIR, TYPE_OBS_SKY,
    TYPE_OBS_TEMPEST, TYPE_RAIN_START, TYPE_RAPID_WIND, TYPE_STRIKE,
};

// Positional field indices, fixed per message type by the protocol.

const STRIKE_TIMESTAMP: usize = 0;
const STRIKE_DISTANCE: usize = 1;
const STRIKE_ENERGY: usize = 2;

const RAIN_START_TIMESTAMP: usize = 0;

const WIND_TIMESTAMP: usize = 0;
const WIND_SPEED: usize = 1;
const WIND_DIRECTION: usize = 2;

/// Decodes one UDP payload into a typed message.
///
/// # Errors
///
/// - [`DecodeError::Encoding`] if the payload is not UTF-8.
/// - [`DecodeError::MalformedPayload`] if the payload is not a JSON object,
///   lacks the message-type discriminator, or lacks a serial number.
/// - [`DecodeError::UnknownMessageType`] for an unrecognized discriminator.
///   Callers treat this as "ignore the datagram", not as a failure —
///   WeatherFlow firmware broadcasts message types beyond the tracked set.
pub fn decode(payload: &[u8]) -> Result<DecodedMessage, DecodeError> {
    let text = std::str::from_utf8(payload)?;
    let value: Value = serde_json::from_str(text)?;
    let object = value
        .as_object()
        .ok_or_else(|| DecodeError::MalformedPayload("expected a JSON object".to_string()))?;

    let message_type = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            DecodeError::MalformedPayload("missing message type discriminator".to_string())
        })?
        .to_string();

    let serial_number = object
        .get("serial_number")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DecodeError::MalformedPayload("missing serial_number".to_string()))?
        .to_string();

    let hub_serial_number = opt_string(object.get("hub_sn"));

    let message = match message_type.as_str() {
        TYPE_HUB_STATUS => DecodedMessage::HubStatus(HubStatusMessage {
            epoch: opt_i64(object.get("timestamp")).unwrap_or_else(receipt_epoch),
            firmware_revision: opt_string(object.get("firmware_revision")),
            uptime: opt_i64(object.get("uptime")),
            rssi: opt_i64(object.get("rssi")),
            reset_flags: opt_string(object.get("reset_flags")),
            seq: opt_i64(object.get("seq")),
            radio_stats: object.get("radio_stats").and_then(Value::as_array).map(|arr| {
                arr.iter().filter_map(Value::as_i64).collect()
            }),
            serial_number,
        }),
        TYPE_DEVICE_STATUS => DecodedMessage::DeviceStatus(DeviceStatusMessage {
            epoch: opt_i64(object.get("timestamp")).unwrap_or_else(receipt_epoch),
            uptime: opt_i64(object.get("uptime")),
            voltage: opt_f64(object.get("voltage")),
            firmware_revision: opt_string(object.get("firmware_revision")),
            rssi: opt_i64(object.get("rssi")),
            hub_rssi: opt_i64(object.get("hub_rssi")),
            sensor_status: opt_i64(object.get("sensor_status"))
                .and_then(|raw| u32::try_from(raw).ok()),
            debug: object.get("debug").map(truthy),
            serial_number,
            hub_serial_number,
        }),
        TYPE_OBS_AIR => {
            let obs = latest_observation(object)?;
            DecodedMessage::ObservationAir(AirObservation {
                epoch: field_i64(&obs, 0).unwrap_or_else(receipt_epoch),
                station_pressure: obs_field(&obs, 1),
                air_temperature: obs_field(&obs, 2),
                relative_humidity: obs_field(&obs, 3),
                lightning_strike_count: obs_field_i64(&obs, 4),
                lightning_strike_average_distance: obs_field(&obs, 5),
                battery: obs_field(&obs, 6),
                report_interval: obs_field_i64(&obs, 7),
                serial_number,
                hub_serial_number,
            })
        }
        TYPE_OBS_SKY => {
            let obs = latest_observation(object)?;
            DecodedMessage::ObservationSky(SkyObservation {
                epoch: field_i64(&obs, 0).unwrap_or_else(receipt_epoch),
                illuminance: obs_field_i64(&obs, 1),
                uv: obs_field(&obs, 2),
                rain_amount_previous_minute: obs_field(&obs, 3),
                wind_lull: obs_field(&obs, 4),
                wind_average: obs_field(&obs, 5),
                wind_gust: obs_field(&obs, 6),
                wind_direction: obs_field_i64(&obs, 7),
                battery: obs_field(&obs, 8),
                report_interval: obs_field_i64(&obs, 9),
                solar_radiation: obs_field_i64(&obs, 10),
                // Index 11 (local day rain accumulation) is unused by the
                // station firmware and always null.
                precipitation_type: obs_field_i64(&obs, 12),
                wind_sample_interval: obs_field_i64(&obs, 13),
                serial_number,
                hub_serial_number,
            })
        }
        TYPE_OBS_TEMPEST => {
            let obs = latest_observation(object)?;
            DecodedMessage::ObservationTempest(TempestObservation {
                epoch: field_i64(&obs, 0).unwrap_or_else(receipt_epoch),
                wind_lull: obs_field(&obs, 1),
                wind_average: obs_field(&obs, 2),
                wind_gust: obs_field(&obs, 3),
                wind_direction: obs_field_i64(&obs, 4),
                wind_sample_interval: obs_field_i64(&obs, 5),
                station_pressure: obs_field(&obs, 6),
                air_temperature: obs_field(&obs, 7),
                relative_humidity: obs_field(&obs, 8),
                illuminance: obs_field_i64(&obs, 9),
                uv: obs_field(&obs, 10),
                solar_radiation: obs_field_i64(&obs, 11),
                rain_amount_previous_minute: obs_field(&obs, 12),
                precipitation_type: obs_field_i64(&obs, 13),
                lightning_strike_average_distance: obs_field(&obs, 14),
                lightning_strike_count: obs_field_i64(&obs, 15),
                battery: obs_field(&obs, 16),
                report_interval: obs_field_i64(&obs, 17),
                serial_number,
                hub_serial_number,
            })
        }
        TYPE_RAPID_WIND => {
            let ob = numeric_array(object.get("ob"))
                .ok_or_else(|| DecodeError::MalformedPayload("missing ob array".to_string()))?;
            DecodedMessage::RapidWind(RapidWindMessage {
                epoch: field_i64(&ob, WIND_TIMESTAMP).unwrap_or_else(receipt_epoch),
                wind_speed: field_f64(&ob, WIND_SPEED),
                wind_direction: field_i64(&ob, WIND_DIRECTION),
                serial_number,
                hub_serial_number,
            })
        }
        TYPE_STRIKE => {
            let evt = numeric_array(object.get("evt"))
                .ok_or_else(|| DecodeError::MalformedPayload("missing evt array".to_string()))?;
            DecodedMessage::LightningStrike(LightningStrikeMessage {
                epoch: field_i64(&evt, STRIKE_TIMESTAMP).unwrap_or_else(receipt_epoch),
                distance: field_f64(&evt, STRIKE_DISTANCE),
                energy: field_i64(&evt, STRIKE_ENERGY),
                serial_number,
                hub_serial_number,
            })
        }
        TYPE_RAIN_START => {
            let evt = numeric_array(object.get("evt"))
                .ok_or_else(|| DecodeError::MalformedPayload("missing evt array".to_string()))?;
            DecodedMessage::RainStart(RainStartMessage {
                epoch: field_i64(&evt, RAIN_START_TIMESTAMP).unwrap_or_else(receipt_epoch),
                serial_number,
                hub_serial_number,
            })
        }
        _ => return Err(DecodeError::UnknownMessageType(message_type)),
    };

    Ok(message)
}

/// Receipt-time fallback for messages whose wire timestamp is absent.
fn receipt_epoch() -> i64 {
    Utc::now().timestamp()
}

/// Returns the latest row of the `obs` array of arrays.
///
/// A datagram may batch several observations; the rows are ordered oldest
/// first, so merging only the last row gives last-write-wins semantics.
fn latest_observation(
    object: &serde_json::Map<String, Value>,
) -> Result<Vec<Option<f64>>, DecodeError> {
    object
        .get("obs")
        .and_then(Value::as_array)
        .and_then(|rows| rows.last())
        .and_then(|row| numeric_array(Some(row)))
        .ok_or_else(|| DecodeError::MalformedPayload("missing obs array".to_string()))
}

/// Converts a JSON array into positional numeric fields, mapping null or
/// non-numeric entries to `None`.
fn numeric_array(value: Option<&Value>) -> Option<Vec<Option<f64>>> {
    value
        .and_then(Value::as_array)
        .map(|arr| arr.iter().map(Value::as_f64).collect())
}

fn field_f64(fields: &[Option<f64>], index: usize) -> Option<f64> {
    fields.get(index).copied().flatten()
}

#[allow(clippy::cast_possible_truncation)]
fn field_i64(fields: &[Option<f64>], index: usize) -> Option<i64> {
    field_f64(fields, index).map(|v| v as i64)
}

/// Reads a positional field, keeping the null/truncation distinction.
fn obs_field(fields: &[Option<f64>], index: usize) -> Field<f64> {
    match fields.get(index) {
        None => Field::Absent,
        Some(None) => Field::Unknown,
        Some(Some(value)) => Field::Value(*value),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn obs_field_i64(fields: &[Option<f64>], index: usize) -> Field<i64> {
    match obs_field(fields, index) {
        Field::Absent => Field::Absent,
        Field::Unknown => Field::Unknown,
        Field::Value(value) => Field::Value(value as i64),
    }
}

fn opt_f64(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

fn opt_i64(value: Option<&Value>) -> Option<i64> {
    value.and_then(Value::as_i64)
}

/// Reads a string field, also accepting numeric values: sensor firmware
/// revisions are integers on the wire while hub revisions are strings.
fn opt_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Interprets the wire's loose boolean encoding (`1`, `"true"`, `"on"`...).
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            matches!(s.to_lowercase().as_str(), "true" | "t" | "yes" | "y" | "on" | "1")
        }
        _ => false,
    }
}
