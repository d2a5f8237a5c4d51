// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use crate::state::TraitCategory;
use crate::types::DeviceId;

/// Events published by the device store.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The whole snapshot was replaced by a listing fetch.
    DevicesReplaced {
        /// Ids present in the new snapshot.
        device_ids: Vec<DeviceId>,
    },

    /// One trait category of one device was replaced.
    TraitUpdated {
        /// The device that changed.
        device_id: DeviceId,
        /// The category that was replaced.
        category: TraitCategory,
    },
}

impl DeviceEvent {
    /// Creates a trait updated event.
    #[must_use]
    pub fn trait_updated(device_id: DeviceId, category: TraitCategory) -> Self {
        Self::TraitUpdated {
            device_id,
            category,
        }
    }

    /// Returns `true` if this event concerns `device_id`.
    #[must_use]
    pub fn affects(&self, device_id: &DeviceId) -> bool {
        match self {
            Self::DevicesReplaced { device_ids } => device_ids.contains(device_id),
            Self::TraitUpdated { device_id: id, .. } => id == device_id,
        }
    }
}
