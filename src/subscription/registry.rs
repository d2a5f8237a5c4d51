// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device change callbacks.
//!
//! - [`SubscriptionId`] - Unique identifier of one registered callback
//! - [`Subscription`] - Capability returned on subscribe, consumed on unsubscribe
//! - [`ChangeRegistry`] - Registry that stores callbacks keyed by device id

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::types::DeviceId;

/// Unique identifier for a subscription.
///
/// IDs are unique for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
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

/// Callback invoked with the id of the device that changed.
pub type ChangeCallback = Arc<dyn Fn(&DeviceId) + Send + Sync>;

/// Handle to one registered callback.
///
/// The handle is not `Clone`: whoever holds it is the only party able to
/// detach the callback, and detaching consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a Subscription leaves the callback attached"]
pub struct Subscription {
    id: SubscriptionId,
    device_id: DeviceId,
}

impl Subscription {
    /// Returns the subscription id.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the device this subscription listens to.
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

/// Publish/subscribe registry of change callbacks keyed by device id.
///
/// Any number of callbacks may be attached to the same device. There is no
/// deduplication: attaching the same closure twice makes it fire twice.
///
/// # Thread Safety
///
/// The registry can be shared between tasks. Callbacks run on the thread that
/// calls [`notify`](Self::notify), after the registry lock has been released,
/// so a callback may subscribe or unsubscribe without deadlocking.
pub struct ChangeRegistry {
    next_id: AtomicU64,
    callbacks: RwLock<HashMap<DeviceId, HashMap<SubscriptionId, ChangeCallback>>>,
}

impl ChangeRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            callbacks: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Attaches a callback to changes of `device_id`.
    pub fn subscribe<F>(&self, device_id: &DeviceId, callback: F) -> Subscription
    where
        F: Fn(&DeviceId) + Send + Sync + 'static,
    {
        self.subscribe_shared(device_id, Arc::new(callback))
    }

    /// Attaches an already shared callback.
    ///
    /// Used to move one observer from one device to another.
    pub fn subscribe_shared(&self, device_id: &DeviceId, callback: ChangeCallback) -> Subscription {
        let id = self.next_id();
        self.callbacks
            .write()
            .entry(device_id.clone())
            .or_default()
            .insert(id, callback);
        Subscription {
            id,
            device_id: device_id.clone(),
        }
    }

    /// Detaches a callback.
    ///
    /// Returns `true` if the callback was still attached.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut callbacks = self.callbacks.write();
        let Some(for_device) = callbacks.get_mut(&subscription.device_id) else {
            return false;
        };
        let removed = for_device.remove(&subscription.id).is_some();
        if for_device.is_empty() {
            callbacks.remove(&subscription.device_id);
        }
        removed
    }

    /// Calls every callback attached to `device_id`, once each.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, device_id: &DeviceId) -> usize {
        let snapshot: Vec<ChangeCallback> = {
            let callbacks = self.callbacks.read();
            match callbacks.get(device_id) {
                Some(for_device) => for_device.values().cloned().collect(),
                None => return 0,
            }
        };
        for callback in &snapshot {
            callback(device_id);
        }
        snapshot.len()
    }

    /// Returns the number of callbacks attached to `device_id`.
    #[must_use]
    pub fn subscriber_count(&self, device_id: &DeviceId) -> usize {
        self.callbacks.read().get(device_id).map_or(0, HashMap::len)
    }

    /// Returns the total number of attached callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().values().map(HashMap::len).sum()
    }

    /// Returns `true` if no callbacks are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for ChangeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
