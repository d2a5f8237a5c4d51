// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Enumerations reported by thermostat traits.
//!
//! All of them serialize to the upper-case strings used on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Operating mode of a thermostat.
///
/// Only [`Heat`](Self::Heat) and [`Cool`](Self::Cool) carry a single
/// setpoint. [`HeatCool`](Self::HeatCool) keeps a heat/cool range and
/// [`Off`](Self::Off) has none.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::ThermostatMode;
///
/// let mode: ThermostatMode = "heatcool".parse().unwrap();
/// assert_eq!(mode, ThermostatMode::HeatCool);
/// assert_eq!(mode.as_str(), "HEATCOOL");
/// assert!(!mode.has_single_setpoint());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThermostatMode {
    /// Heating and cooling are disabled.
    Off,
    /// Heating towards the heat setpoint.
    Heat,
    /// Cooling towards the cool setpoint.
    Cool,
    /// Keeping the temperature within a heat/cool range.
    HeatCool,
}

impl ThermostatMode {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
            Self::HeatCool => "HEATCOOL",
        }
    }

    /// Returns `true` for modes driven by one settable setpoint.
    #[must_use]
    pub const fn has_single_setpoint(&self) -> bool {
        matches!(self, Self::Heat | Self::Cool)
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThermostatMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OFF" => Ok(Self::Off),
            "HEAT" => Ok(Self::Heat),
            "COOL" => Ok(Self::Cool),
            "HEATCOOL" => Ok(Self::HeatCool),
            _ => Err(ValueError::InvalidMode(s.to_string())),
        }
    }
}

/// Eco mode of a thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EcoMode {
    /// Eco setpoints are active.
    ManualEco,
    /// Eco is disabled.
    Off,
}

/// What the HVAC equipment is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HvacStatus {
    /// Idle.
    Off,
    /// Actively heating.
    Heating,
    /// Actively cooling.
    Cooling,
}

/// Connectivity of a device as seen by the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectivityStatus {
    /// Device is reachable.
    Online,
    /// Device is unreachable.
    Offline,
}

/// Fan timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FanTimerMode {
    /// Fan timer running.
    On,
    /// Fan timer stopped.
    Off,
}
