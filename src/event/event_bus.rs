// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus with ordered, synchronous delivery.
//!
//! Subscribers register a callback against an [`EventFilter`]; publishing
//! walks the subscriber list in subscription order, on the publishing
//! task, and calls every matching callback. A panicking callback is
//! caught and logged without aborting delivery to the remaining
//! subscribers or unwinding the pipeline.
//!
//! Nothing is buffered or replayed: a subscriber registered after an
//! event's moment of publication never observes it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{Event, EventKind};

/// Unique identifier for a subscription.
///
/// Returned by [`EventBus::subscribe`] and used to unsubscribe later.
/// IDs are unique within a bus's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Selects which events a subscription receives.
///
/// A filter may constrain the event kind, the originating device, both,
/// or neither. There is no wildcard ambiguity: a filter for all
/// [`EventKind::Observation`] events receives them for every device.
///
/// # Examples
///
/// ```
/// use tempest_lib::event::{EventFilter, EventKind};
///
/// // Every event from every device
/// let all = EventFilter::any();
///
/// // All rapid wind samples
/// let wind = EventFilter::kind(EventKind::RapidWind);
///
/// // Everything from one station
/// let station = EventFilter::device("ST-00000512");
///
/// // Observations from one station
/// let scoped = EventFilter::kind(EventKind::Observation).for_device("ST-00000512");
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    kind: Option<EventKind>,
    serial_number: Option<String>,
}

impl EventFilter {
    /// Matches every event.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches events of one kind, for every device.
    #[must_use]
    pub fn kind(kind: EventKind) -> Self {
        Self {
            kind: Some(kind),
            serial_number: None,
        }
    }

    /// Matches every event from one device.
    #[must_use]
    pub fn device(serial_number: impl Into<String>) -> Self {
        Self {
            kind: None,
            serial_number: Some(serial_number.into()),
        }
    }

    /// Additionally constrains this filter to one device.
    #[must_use]
    pub fn for_device(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Returns `true` if the event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(kind) = self.kind
            && event.kind() != kind
        {
            return false;
        }
        if let Some(serial) = &self.serial_number
            && event.serial_number() != serial
        {
            return false;
        }
        true
    }
}

/// Type alias for event callbacks.
type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    callback: EventCallback,
}

/// Event bus for delivering pipeline events to subscribers.
///
/// Cloning the bus is cheap and shares the subscriber list. The bus is
/// thread-safe; delivery happens on whichever task calls
/// [`EventBus::publish`].
#[derive(Clone)]
pub struct EventBus {
    next_id: Arc<AtomicU64>,
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl EventBus {
    /// Creates a new event bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(1)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Registers a callback for events passing `filter`.
    ///
    /// Callbacks run synchronously on the publishing task, in
    /// subscription order. They must not perform long-blocking work or
    /// they delay subsequent datagram processing.
    pub fn subscribe<F>(&self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            id,
            filter,
            callback: Arc::new(callback),
        });
        id
    }

    /// Unregisters a subscription.
    ///
    /// Returns `true` if a subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|sub| sub.id != id);
        subscribers.len() != before
    }

    /// Returns the number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Delivers an event to every matching subscriber, in subscription
    /// order, on the calling task.
    ///
    /// A callback that panics is caught and logged; delivery continues
    /// with the remaining subscribers.
    pub fn publish(&self, event: &Event) {
        // Snapshot the matching callbacks so subscriber callbacks may
        // themselves subscribe/unsubscribe without deadlocking.
        let callbacks: Vec<EventCallback> = self
            .subscribers
            .read()
            .iter()
            .filter(|sub| sub.filter.matches(event))
            .map(|sub| Arc::clone(&sub.callback))
            .collect();

        for callback in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::warn!(
                    kind = ?event.kind(),
                    serial_number = %event.serial_number(),
                    "Event subscriber panicked; continuing delivery"
                );
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;

    fn status_event(serial: &str) -> Event {
        Event::StatusUpdate {
            serial_number: serial.to_string(),
            epoch: 1_495_724_691,
        }
    }

    #[test]
    fn subscription_id_display() {
        let bus = EventBus::new();
        let id = bus.subscribe(EventFilter::any(), |_| {});
        assert_eq!(id.to_string(), format!("Sub({})", id.value()));
    }

    #[test]
    fn new_bus_has_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn publish_delivers_to_matching_subscriber() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(EventFilter::kind(EventKind::StatusUpdate), move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&status_event("HB-00000001"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn kind_filter_excludes_other_kinds() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(EventFilter::kind(EventKind::RainStart), move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&status_event("HB-00000001"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn device_filter_scopes_to_serial() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(EventFilter::device("ST-00000512"), move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&status_event("HB-00000001"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        bus.publish(&status_event("ST-00000512"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn combined_filter_requires_both() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(
            EventFilter::kind(EventKind::Observation).for_device("ST-00000512"),
            move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        bus.publish(&status_event("ST-00000512"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        bus.publish(&Event::Observation {
            serial_number: "ST-00000512".to_string(),
            epoch: 1,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delivery_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order_clone = order.clone();
            bus.subscribe(EventFilter::any(), move |_| {
                order_clone.lock().unwrap().push(label);
            });
        }

        bus.publish(&status_event("HB-00000001"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn panicking_subscriber_does_not_abort_delivery() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.subscribe(EventFilter::any(), |_| {
            panic!("subscriber failure");
        });
        bus.subscribe(EventFilter::any(), move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&status_event("HB-00000001"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = bus.subscribe(EventFilter::any(), move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&status_event("HB-00000001"));
        assert!(bus.unsubscribe(id));
        bus.publish(&status_event("HB-00000001"));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_nonexistent_returns_false() {
        let bus = EventBus::new();
        let id = bus.subscribe(EventFilter::any(), |_| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn late_subscriber_never_observes_past_events() {
        let bus = EventBus::new();
        bus.publish(&status_event("HB-00000001"));

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        bus.subscribe(EventFilter::any(), move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clone_shares_subscriber_list() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.subscribe(EventFilter::any(), |_| {});
        assert_eq!(bus2.subscriber_count(), 1);
    }
}
