// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command payloads.

use serde_json::{Value, json};

use crate::types::ThermostatMode;

/// A command the remote API executes on a thermostat.
///
/// Temperatures are always in Celsius, already rounded to the precision the
/// API accepts.
///
/// # Examples
///
/// ```
/// use nestor_lib::command::DeviceCommand;
/// use nestor_lib::types::ThermostatMode;
///
/// let cmd = DeviceCommand::SetMode(ThermostatMode::Cool);
/// assert_eq!(cmd.name(), "sdm.devices.commands.ThermostatMode.SetMode");
/// assert_eq!(cmd.params(), serde_json::json!({"mode": "COOL"}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Switch the thermostat mode.
    SetMode(ThermostatMode),
    /// Set the heat setpoint; valid in HEAT mode.
    SetHeat {
        /// Target in Celsius.
        heat_celsius: f64,
    },
    /// Set the cool setpoint; valid in COOL mode.
    SetCool {
        /// Target in Celsius.
        cool_celsius: f64,
    },
}

impl DeviceCommand {
    /// Returns the fully qualified command name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMode(_) => "sdm.devices.commands.ThermostatMode.SetMode",
            Self::SetHeat { .. } => "sdm.devices.commands.ThermostatTemperatureSetpoint.SetHeat",
            Self::SetCool { .. } => "sdm.devices.commands.ThermostatTemperatureSetpoint.SetCool",
        }
    }

    /// Returns the command parameters.
    #[must_use]
    pub fn params(&self) -> Value {
        match self {
            Self::SetMode(mode) => json!({ "mode": mode.as_str() }),
            Self::SetHeat { heat_celsius } => json!({ "heatCelsius": heat_celsius }),
            Self::SetCool { cool_celsius } => json!({ "coolCelsius": cool_celsius }),
        }
    }

    /// Returns the request body for `executeCommand`.
    #[must_use]
    pub fn to_body(&self) -> Value {
        json!({
            "command": self.name(),
            "params": self.params(),
        })
    }
}
