// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `tempest_lib` library.
//!
//! This module provides the error hierarchy for handling failures across
//! the library: datagram decoding, device state management, and the UDP
//! listener lifecycle. Every error except socket bind failures is non-fatal
//! to the receive loop — the pipeline logs it and moves on to the next
//! datagram.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while decoding a datagram.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error occurred while applying a message to a device.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Error occurred in the UDP listener.
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),
}

/// Errors produced while decoding a raw UDP datagram.
///
/// None of these abort the receive loop. [`DecodeError::UnknownMessageType`]
/// in particular means "ignore this datagram" — WeatherFlow firmware emits
/// message types this library does not track (e.g. `light_debug`).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The payload was not valid JSON or lacked required structure.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The message type discriminator was missing or unrecognized.
    #[error("unknown message type: {0:?}")]
    UnknownMessageType(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

/// Errors produced while resolving or updating a device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// A message of an incompatible kind arrived for an already
    /// classified serial number (e.g. a hub status for a sensor).
    #[error("message type {message_type} does not match device {serial_number} ({model})")]
    TypeMismatch {
        /// Serial number of the existing device.
        serial_number: String,
        /// Model of the existing device.
        model: String,
        /// The offending wire message type.
        message_type: String,
    },

    /// A message targeted a capability the device does not have
    /// (e.g. a sky observation for an Air unit).
    #[error("device {serial_number} ({model}) has no capability for {message_type}")]
    CapabilityMismatch {
        /// Serial number of the device.
        serial_number: String,
        /// Model of the device.
        model: String,
        /// The offending wire message type.
        message_type: String,
    },

    /// A device could not be classified from its first message.
    #[error("cannot classify device {serial_number} from message type {message_type}")]
    Unclassifiable {
        /// Serial number carried by the message.
        serial_number: String,
        /// The wire message type that failed to classify.
        message_type: String,
    },
}

/// Errors produced by the UDP listener lifecycle.
///
/// These are the only fatal errors in the library: if the socket cannot
/// be bound there is nothing to listen to.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured address is already bound by another process.
    #[error("address already in use: {0}")]
    AddressInUse(String),

    /// The socket could not be bound for another reason.
    #[error("could not open a local UDP endpoint: {0}")]
    Bind(#[from] std::io::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
