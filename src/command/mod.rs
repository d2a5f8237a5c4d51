// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat commands.
//!
//! [`DeviceCommand`] is the typed form of an `executeCommand` request.
//! [`CommandGateway`] sends commands through a [`RemoteApi`] and, once the
//! API accepted one, applies the same change to the local snapshot so that
//! observers see it without waiting for a push.
//!
//! | Operation | Command | Allowed modes |
//! |-----------|---------|---------------|
//! | [`CommandGateway::set_mode`] | `ThermostatMode.SetMode` | any advertised |
//! | [`CommandGateway::set_temperature`] | `SetHeat` / `SetCool` | HEAT, COOL |
//! | [`CommandGateway::set_temperature_delta`] | `SetHeat` / `SetCool` | HEAT, COOL |
//!
//! [`RemoteApi`]: crate::protocol::RemoteApi

mod gateway;
mod request;

pub use gateway::CommandGateway;
pub use request::DeviceCommand;
