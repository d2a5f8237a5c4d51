// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-through thermostat handle.

use std::fmt;
use std::sync::Arc;

use crate::state::{Device, DeviceStore};
use crate::subscription::{ChangeCallback, Subscription, SubscriptionId};
use crate::types::{DeviceId, HvacStatus, TemperatureScale, ThermostatMode};

use super::ThermostatView;

struct Observer {
    handle: SubscriptionId,
    callback: ChangeCallback,
    subscription: Option<Subscription>,
}

/// A thermostat bound to one device id.
///
/// Getters read the current snapshot on every call; nothing is cached, so a
/// value read right after a change notification is always the new one.
/// Getters return `None` when the device is unknown or the field was never
/// reported.
///
/// Observers attached with [`on_change`](Self::on_change) stay attached
/// until detached, until the facade is rebound to another device (they then
/// follow it), or until the facade is dropped.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nestor_lib::state::{Device, DeviceStore, DeviceType};
/// use nestor_lib::thermostat::Thermostat;
///
/// let store = Arc::new(DeviceStore::new());
/// store.replace_all([Device::new("enterprises/p/devices/t", DeviceType::Thermostat)]);
///
/// let mut thermostat = Thermostat::new("enterprises/p/devices/t", store);
/// let handle = thermostat.on_change(|id| println!("{id} changed"));
/// assert!(thermostat.exists());
/// assert!(thermostat.detach(handle));
/// ```
pub struct Thermostat {
    id: DeviceId,
    store: Arc<DeviceStore>,
    observers: Vec<Observer>,
}

impl Thermostat {
    /// Binds a facade to `id`. The device does not need to exist yet.
    #[must_use]
    pub fn new(id: impl Into<DeviceId>, store: Arc<DeviceStore>) -> Self {
        Self {
            id: id.into(),
            store,
            observers: Vec::new(),
        }
    }

    /// Returns the bound device id.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns `true` if the bound device is in the store.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.store.contains(&self.id)
    }

    fn read<R>(&self, f: impl FnOnce(&Device) -> Option<R>) -> Option<R> {
        self.store.with_device(&self.id, f).flatten()
    }

    fn view_field<R>(&self, f: impl FnOnce(ThermostatView) -> Option<R>) -> Option<R> {
        self.view().and_then(f)
    }

    /// Returns every derived value at once.
    #[must_use]
    pub fn view(&self) -> Option<ThermostatView> {
        self.store.with_device(&self.id, ThermostatView::from_device)
    }

    /// User-assigned name.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.read(|d| d.custom_name().map(str::to_owned))
    }

    /// Active mode.
    #[must_use]
    pub fn mode(&self) -> Option<ThermostatMode> {
        self.read(|d| d.thermostat_mode().map(|t| t.mode))
    }

    /// Display scale; Celsius if the device is unknown or never reported one.
    #[must_use]
    pub fn scale(&self) -> TemperatureScale {
        self.view().map(|v| v.scale).unwrap_or_default()
    }

    /// Ambient temperature in the native scale, display-rounded.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.view_field(|v| v.current_temperature)
    }

    /// Single setpoint in the native scale, display-rounded.
    ///
    /// `None` in HEATCOOL and OFF.
    #[must_use]
    pub fn setpoint(&self) -> Option<f64> {
        self.view_field(|v| v.setpoint)
    }

    /// Single setpoint in the native scale, unrounded.
    #[must_use]
    pub fn setpoint_exact(&self) -> Option<f64> {
        self.view_field(|v| v.setpoint_exact)
    }

    /// Heat and cool setpoints in HEATCOOL mode.
    #[must_use]
    pub fn heat_cool_range(&self) -> Option<(f64, f64)> {
        self.view_field(|v| v.heat_cool_range)
    }

    /// Relative humidity in percent.
    #[must_use]
    pub fn humidity(&self) -> Option<f64> {
        self.read(|d| d.humidity().map(|h| h.ambient_humidity_percent))
    }

    /// HVAC equipment status.
    #[must_use]
    pub fn hvac_status(&self) -> Option<HvacStatus> {
        self.read(|d| d.thermostat_hvac().map(|h| h.status))
    }

    /// `false` only when the device is known and reported itself offline.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.view().is_none_or(|v| v.is_online())
    }

    /// Attaches a change observer for the bound device.
    ///
    /// Attaching the same logical observer twice delivers every change
    /// twice; nothing is deduplicated. The returned handle stays valid
    /// across [`rebind`](Self::rebind).
    pub fn on_change<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceId) + Send + Sync + 'static,
    {
        let callback: ChangeCallback = Arc::new(callback);
        let subscription = self.store.subscribe_shared(&self.id, callback.clone());
        let handle = subscription.id();
        self.observers.push(Observer {
            handle,
            callback,
            subscription: Some(subscription),
        });
        handle
    }

    /// Detaches an observer. Returns `false` for an unknown handle.
    pub fn detach(&mut self, handle: SubscriptionId) -> bool {
        let Some(pos) = self.observers.iter().position(|o| o.handle == handle) else {
            return false;
        };
        let mut observer = self.observers.remove(pos);
        if let Some(subscription) = observer.subscription.take() {
            self.store.unsubscribe(subscription);
        }
        true
    }

    /// Returns the number of attached observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Points the facade at another device.
    ///
    /// Every observer is detached from the old id before being attached to
    /// the new one, so no further notifications for the old device arrive.
    pub fn rebind(&mut self, id: impl Into<DeviceId>) {
        let id = id.into();
        if id == self.id {
            return;
        }

        for observer in &mut self.observers {
            if let Some(subscription) = observer.subscription.take() {
                self.store.unsubscribe(subscription);
            }
        }

        tracing::debug!(from = %self.id, to = %id, "Rebinding thermostat");
        self.id = id;

        for observer in &mut self.observers {
            observer.subscription =
                Some(self.store.subscribe_shared(&self.id, observer.callback.clone()));
        }
    }

    fn detach_all(&mut self) {
        for mut observer in self.observers.drain(..) {
            if let Some(subscription) = observer.subscription.take() {
                self.store.unsubscribe(subscription);
            }
        }
    }
}

impl Drop for Thermostat {
    fn drop(&mut self) {
        self.detach_all();
    }
}

impl fmt::Debug for Thermostat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thermostat")
            .field("id", &self.id)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        DeviceType, SetpointTrait, SettingsTrait, TemperatureTrait, ThermostatModeTrait,
        TraitPayload,
    };
    use std::sync::atomic::{AtomicU32, Ordering};

    fn thermostat_device(id: &str) -> Device {
        Device::new(id, DeviceType::Thermostat)
            .with_trait(TraitPayload::ThermostatMode(ThermostatModeTrait {
                mode: ThermostatMode::Heat,
                available_modes: vec![],
            }))
            .with_trait(TraitPayload::Settings(SettingsTrait {
                temperature_scale: TemperatureScale::Fahrenheit,
            }))
            .with_trait(TraitPayload::ThermostatTemperatureSetpoint(SetpointTrait {
                heat_celsius: Some(20.0),
                cool_celsius: None,
            }))
    }

    fn store() -> Arc<DeviceStore> {
        let store = Arc::new(DeviceStore::new());
        store.replace_all([thermostat_device("a"), thermostat_device("b")]);
        store
    }

    fn temperature(c: f64) -> TraitPayload {
        TraitPayload::Temperature(TemperatureTrait {
            ambient_temperature_celsius: c,
        })
    }

    fn counter() -> (Arc<AtomicU32>, impl Fn(&DeviceId) + Send + Sync + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        (count, move |_: &DeviceId| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn getters_follow_the_store() {
        let store = store();
        let thermostat = Thermostat::new("a", store.clone());

        assert_eq!(thermostat.setpoint(), Some(68.0));
        assert_eq!(thermostat.current_temperature(), None);

        store.merge_partial(&DeviceId::new("a"), temperature(22.0));

        assert_eq!(thermostat.current_temperature(), Some(72.0));
        assert_eq!(thermostat.scale(), TemperatureScale::Fahrenheit);
    }

    #[test]
    fn unknown_device_reads_as_absent() {
        let thermostat = Thermostat::new("ghost", store());
        assert!(!thermostat.exists());
        assert_eq!(thermostat.mode(), None);
        assert_eq!(thermostat.setpoint(), None);
        assert_eq!(thermostat.scale(), TemperatureScale::Celsius);
        assert!(thermostat.is_online());
    }

    #[test]
    fn two_facades_both_notified() {
        let store = store();
        let mut first = Thermostat::new("a", store.clone());
        let mut second = Thermostat::new("a", store.clone());
        let (c1, f1) = counter();
        let (c2, f2) = counter();
        first.on_change(f1);
        second.on_change(f2);

        store.merge_partial(&DeviceId::new("a"), temperature(21.0));

        assert_eq!(c1.load(Ordering::SeqCst), 1);
        assert_eq!(c2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rebind_moves_observers() {
        let store = store();
        let mut thermostat = Thermostat::new("a", store.clone());
        let (count, callback) = counter();
        let handle = thermostat.on_change(callback);

        thermostat.rebind("b");
        store.merge_partial(&DeviceId::new("a"), temperature(21.0));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        store.merge_partial(&DeviceId::new("b"), temperature(21.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert_eq!(store.subscriber_count(&DeviceId::new("a")), 0);
        assert!(thermostat.detach(handle));
        assert_eq!(store.subscriber_count(&DeviceId::new("b")), 0);
    }

    #[test]
    fn drop_detaches_everything() {
        let store = store();
        let id = DeviceId::new("a");
        {
            let mut thermostat = Thermostat::new("a", store.clone());
            thermostat.on_change(|_| {});
            thermostat.on_change(|_| {});
            assert_eq!(store.subscriber_count(&id), 2);
        }
        assert_eq!(store.subscriber_count(&id), 0);
    }

    #[test]
    fn detach_unknown_handle() {
        let store = store();
        let mut first = Thermostat::new("a", store.clone());
        let mut second = Thermostat::new("a", store);
        let handle = first.on_change(|_| {});

        assert!(!second.detach(handle));
        assert!(first.detach(handle));
        assert!(!first.detach(handle));
        assert_eq!(first.observer_count(), 0);
    }
}
