// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local mirror of every known device.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::event::{DeviceEvent, EventBus};
use crate::subscription::{ChangeCallback, ChangeRegistry, Subscription};
use crate::types::DeviceId;

use super::{Device, TraitCategory, TraitPayload};

/// Snapshot store holding the last known state of every device.
///
/// All mutation goes through [`merge_with`](Self::merge_with) (of which
/// [`merge_partial`](Self::merge_partial) is the plain form) and
/// [`replace_all`](Self::replace_all). The lock is held only for the map
/// operation itself and never across I/O. Change notifications are raised
/// after the lock is released, so observers reading the store from a
/// callback see the new value.
///
/// # Examples
///
/// ```
/// use nestor_lib::state::{
///     Device, DeviceStore, DeviceType, TemperatureTrait, TraitPayload,
/// };
/// use nestor_lib::types::DeviceId;
///
/// let store = DeviceStore::new();
/// let id = DeviceId::new("enterprises/p/devices/a");
/// store.replace_all([Device::new(id.clone(), DeviceType::Thermostat)]);
///
/// let merged = store.merge_partial(
///     &id,
///     TraitPayload::Temperature(TemperatureTrait { ambient_temperature_celsius: 21.0 }),
/// );
/// assert!(merged);
/// assert_eq!(
///     store.get(&id).unwrap().temperature().unwrap().ambient_temperature_celsius,
///     21.0
/// );
/// ```
#[derive(Debug, Default)]
pub struct DeviceStore {
    devices: RwLock<HashMap<DeviceId, Device>>,
    observers: ChangeRegistry,
    events: EventBus,
}

impl DeviceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current snapshot of a device.
    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<Device> {
        self.devices.read().get(id).cloned()
    }

    /// Runs `f` against a device while holding the read lock.
    ///
    /// `f` must not block or call back into the store.
    pub fn with_device<R>(&self, id: &DeviceId, f: impl FnOnce(&Device) -> R) -> Option<R> {
        self.devices.read().get(id).map(f)
    }

    /// Returns `true` if a device with this id is known.
    #[must_use]
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.read().contains_key(id)
    }

    /// Returns a copy of every device.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        self.devices.read().values().cloned().collect()
    }

    /// Returns the number of known devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Returns `true` if no device is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Replaces one trait category of a known device.
    ///
    /// Unknown ids are ignored: pushes may mention devices the listing has not
    /// surfaced yet, or device types this client does not track. Returns
    /// `true` if the device existed and was updated, in which case exactly one
    /// change notification is raised for it.
    pub fn merge_partial(&self, id: &DeviceId, payload: TraitPayload) -> bool {
        let category = payload.category();
        self.merge_with(id, category, |_| payload)
    }

    /// Rewrites one trait category of a known device from its current value.
    ///
    /// `f` receives the payload held for `category` at the moment of the
    /// write, or `None` if the device has none, and returns the replacement.
    /// The read and the write happen under one lock, so fields `f` leaves
    /// untouched keep whatever the latest update stored. Notification follows
    /// the same rules as [`merge_partial`](Self::merge_partial).
    ///
    /// `f` must not block or call back into the store.
    pub fn merge_with<F>(&self, id: &DeviceId, category: TraitCategory, f: F) -> bool
    where
        F: FnOnce(Option<&TraitPayload>) -> TraitPayload,
    {
        let category = {
            let mut devices = self.devices.write();
            let Some(device) = devices.get_mut(id) else {
                tracing::debug!(device_id = %id, %category, "Ignoring update for unknown device");
                return false;
            };
            let payload = f(device.trait_payload(category));
            let written = payload.category();
            device.set_trait(payload);
            written
        };

        tracing::trace!(device_id = %id, %category, "Merged trait update");
        self.observers.notify(id);
        self.events.publish(DeviceEvent::trait_updated(id.clone(), category));
        true
    }

    /// Replaces the entire snapshot set.
    ///
    /// Devices missing from `devices` are dropped. Observers of every device
    /// present in the new set are notified.
    pub fn replace_all(&self, devices: impl IntoIterator<Item = Device>) {
        let fresh: HashMap<DeviceId, Device> = devices
            .into_iter()
            .map(|device| (device.id().clone(), device))
            .collect();
        let ids: Vec<DeviceId> = fresh.keys().cloned().collect();

        *self.devices.write() = fresh;

        tracing::debug!(count = ids.len(), "Replaced device snapshot");
        for id in &ids {
            self.observers.notify(id);
        }
        self.events
            .publish(DeviceEvent::DevicesReplaced { device_ids: ids });
    }

    /// Attaches a change callback for one device.
    pub fn subscribe<F>(&self, id: &DeviceId, callback: F) -> Subscription
    where
        F: Fn(&DeviceId) + Send + Sync + 'static,
    {
        self.observers.subscribe(id, callback)
    }

    /// Attaches an already shared change callback for one device.
    pub fn subscribe_shared(&self, id: &DeviceId, callback: ChangeCallback) -> Subscription {
        self.observers.subscribe_shared(id, callback)
    }

    /// Detaches a change callback.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.observers.unsubscribe(subscription)
    }

    /// Returns the number of callbacks attached to a device.
    #[must_use]
    pub fn subscriber_count(&self, id: &DeviceId) -> usize {
        self.observers.subscriber_count(id)
    }

    /// Returns a receiver of store events for async consumers.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }
}
