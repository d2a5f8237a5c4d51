// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic per-thermostat refresh tasks.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::DeviceStore;
use crate::types::DeviceId;

use super::ThermostatView;

/// Default tick period.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(5);

/// Repeating task that hands the current view of one thermostat to a
/// closure.
///
/// The closure runs on every period tick, immediately when the store
/// reports a change for the target device, and when the target changes.
/// The target is read from a [`watch`] channel so the caller can retarget a
/// running ticker; `None` means nothing is selected yet.
///
/// A tick never ends the task: a missing target, an unknown device or an
/// error returned by the closure is logged at debug level and the loop goes
/// on. Only dropping the [`TickerHandle`] stops it.
#[derive(Debug)]
pub struct Ticker {
    store: Arc<DeviceStore>,
    target: watch::Receiver<Option<DeviceId>>,
    period: Duration,
}

impl Ticker {
    /// Creates a ticker with the default period.
    #[must_use]
    pub fn new(store: Arc<DeviceStore>, target: watch::Receiver<Option<DeviceId>>) -> Self {
        Self {
            store,
            target,
            period: DEFAULT_TICK_PERIOD,
        }
    }

    /// Sets the tick period.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Spawns the loop on the current tokio runtime.
    pub fn spawn<F, E>(self, tick: F) -> TickerHandle
    where
        F: FnMut(&ThermostatView) -> Result<(), E> + Send + 'static,
        E: Display + 'static,
    {
        let task = tokio::spawn(self.run(tick));
        TickerHandle { task }
    }

    async fn run<F, E>(mut self, mut tick: F)
    where
        F: FnMut(&ThermostatView) -> Result<(), E> + Send + 'static,
        E: Display + 'static,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events = self.store.events();
        let mut target_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = self.target.changed(), if target_open => {
                    if changed.is_err() {
                        // Keep polling the last target
                        target_open = false;
                        continue;
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        let Some(id) = self.target.borrow().clone() else {
                            continue;
                        };
                        if !event.affects(&id) {
                            continue;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Ticker lagged behind store events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        events = self.store.events();
                        continue;
                    }
                },
            }

            self.tick_once(&mut tick);
        }
    }

    fn tick_once<F, E>(&self, tick: &mut F)
    where
        F: FnMut(&ThermostatView) -> Result<(), E>,
        E: Display,
    {
        let Some(id) = self.target.borrow().clone() else {
            tracing::debug!("No thermostat selected");
            return;
        };

        let Some(view) = self.store.with_device(&id, ThermostatView::from_device) else {
            tracing::debug!(device_id = %id, "Thermostat not found");
            return;
        };

        if let Err(e) = tick(&view) {
            tracing::debug!(device_id = %id, error = %e, "Tick failed");
        }
    }
}

/// Owner of a running [`Ticker`]; dropping it stops the task.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Stops the task.
    pub fn stop(self) {
        drop(self);
    }

    /// Returns `true` once the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Device, DeviceType, TemperatureTrait, TraitPayload};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn store() -> Arc<DeviceStore> {
        let store = Arc::new(DeviceStore::new());
        store.replace_all([Device::new("t", DeviceType::Thermostat)]);
        store
    }

    fn counting(
        count: &Arc<AtomicU32>,
    ) -> impl FnMut(&ThermostatView) -> Result<(), String> + Send + 'static {
        let count = count.clone();
        move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_every_period() {
        let store = store();
        let (_tx, rx) = watch::channel(Some(DeviceId::new("t")));
        let count = Arc::new(AtomicU32::new(0));

        let _handle = Ticker::new(store, rx).spawn(counting(&count));
        tokio::time::sleep(Duration::from_secs(12)).await;

        // Ticks at 0s, 5s and 10s
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn store_change_triggers_immediate_tick() {
        let store = store();
        let (_tx, rx) = watch::channel(Some(DeviceId::new("t")));
        let count = Arc::new(AtomicU32::new(0));

        let _handle = Ticker::new(store.clone(), rx).spawn(counting(&count));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        store.merge_partial(
            &DeviceId::new("t"),
            TraitPayload::Temperature(TemperatureTrait {
                ambient_temperature_celsius: 20.0,
            }),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_target_is_skipped_until_set() {
        let store = store();
        let (tx, rx) = watch::channel(None);
        let count = Arc::new(AtomicU32::new(0));

        let _handle = Ticker::new(store, rx).spawn(counting(&count));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tx.send(Some(DeviceId::new("t"))).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_do_not_stop_the_loop() {
        let store = store();
        let (_tx, rx) = watch::channel(Some(DeviceId::new("t")));
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();

        let handle = Ticker::new(store, rx).spawn(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Err("display unavailable")
        });
        tokio::time::sleep(Duration::from_secs(12)).await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_ticks() {
        let store = store();
        let (_tx, rx) = watch::channel(Some(DeviceId::new("t")));
        let count = Arc::new(AtomicU32::new(0));

        let handle = Ticker::new(store, rx).spawn(counting(&count));
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
