// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events and the event bus.

mod device_event;
mod event_bus;

pub use device_event::{Event, EventKind};
pub use event_bus::{EventBus, EventFilter, SubscriptionId};
