// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit-tagged value types.
//!
//! WeatherFlow stations broadcast everything in metric units. Each quantity
//! in this module stores the native metric magnitude and offers conversions
//! to other units of the same dimension, so consumers never have to guess
//! what a bare float means.

mod distance;
mod length;
mod precipitation;
mod pressure;
mod speed;
mod temperature;

pub use distance::Distance;
pub use length::Length;
pub use precipitation::PrecipitationType;
pub use pressure::Pressure;
pub use speed::Speed;
pub use temperature::Temperature;
