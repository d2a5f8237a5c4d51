// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast events for async consumers.
//!
//! The [`EventBus`] complements the callback registry: callbacks suit
//! synchronous observers, while the bus lets spawned tasks `await` the next
//! change with `tokio::select!`.
//!
//! # Examples
//!
//! ```
//! use nestor_lib::event::{DeviceEvent, EventBus};
//! use nestor_lib::state::TraitCategory;
//! use nestor_lib::types::DeviceId;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::trait_updated(
//!     DeviceId::new("enterprises/p/devices/a"),
//!     TraitCategory::ThermostatMode,
//! ));
//! ```

mod device_event;
mod event_bus;

pub use device_event::DeviceEvent;
pub use event_bus::EventBus;
