// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshot types and the snapshot store.
//!
//! A [`Device`] maps [`TraitCategory`] to a complete [`TraitPayload`]. The
//! [`DeviceStore`] keeps one `Device` per id and is the single place where
//! snapshots are mutated, both for push updates and for optimistic updates
//! after a successful command.

mod device;
mod store;
mod traits;

pub use device::{Device, DeviceType};
pub use store::DeviceStore;
pub use traits::{
    ConnectivityTrait, FanTrait, HumidityTrait, InfoTrait, SetpointTrait, SettingsTrait,
    TemperatureTrait, ThermostatEcoTrait, ThermostatHvacTrait, ThermostatModeTrait,
    TraitCategory, TraitPayload,
};
