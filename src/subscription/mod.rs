// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for device changes.
//!
//! Observers attach a callback to one device id and get back a
//! [`Subscription`] handle. Giving the handle back to the registry is the only
//! way to detach, so a handle that is kept around is always enough to clean up.
//!
//! ```
//! use nestor_lib::subscription::ChangeRegistry;
//! use nestor_lib::types::DeviceId;
//!
//! let registry = ChangeRegistry::new();
//! let id = DeviceId::new("enterprises/p/devices/a");
//!
//! let sub = registry.subscribe(&id, |device_id| {
//!     println!("{device_id} changed");
//! });
//! registry.notify(&id);
//!
//! assert!(registry.unsubscribe(sub));
//! ```

mod registry;

pub use registry::{ChangeCallback, ChangeRegistry, Subscription, SubscriptionId};
