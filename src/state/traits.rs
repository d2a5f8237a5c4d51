// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Trait categories and their payloads.
//!
//! A device's state is grouped into trait categories. Each category is
//! replaced as a whole when an update arrives; fields are never merged inside
//! a category. Payloads are parsed strictly, so a category that is present in
//! a snapshot always holds a complete, valid payload.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::{
    ConnectivityStatus, EcoMode, FanTimerMode, HvacStatus, TemperatureScale, ThermostatMode,
};

const TRAIT_PREFIX: &str = "sdm.devices.traits.";

/// A named group of device fields that is updated atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TraitCategory {
    /// Device information (custom name).
    Info,
    /// Ambient humidity.
    Humidity,
    /// Cloud connectivity.
    Connectivity,
    /// Fan timer.
    Fan,
    /// Current and available thermostat modes.
    ThermostatMode,
    /// Eco mode and eco setpoints.
    ThermostatEco,
    /// HVAC equipment status.
    ThermostatHvac,
    /// Device settings (display scale).
    Settings,
    /// Heat and cool setpoints.
    ThermostatTemperatureSetpoint,
    /// Ambient temperature.
    Temperature,
}

impl TraitCategory {
    /// Every category this library understands.
    pub const ALL: [Self; 10] = [
        Self::Info,
        Self::Humidity,
        Self::Connectivity,
        Self::Fan,
        Self::ThermostatMode,
        Self::ThermostatEco,
        Self::ThermostatHvac,
        Self::Settings,
        Self::ThermostatTemperatureSetpoint,
        Self::Temperature,
    ];

    /// Returns the short trait name, e.g. `ThermostatMode`.
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Humidity => "Humidity",
            Self::Connectivity => "Connectivity",
            Self::Fan => "Fan",
            Self::ThermostatMode => "ThermostatMode",
            Self::ThermostatEco => "ThermostatEco",
            Self::ThermostatHvac => "ThermostatHvac",
            Self::Settings => "Settings",
            Self::ThermostatTemperatureSetpoint => "ThermostatTemperatureSetpoint",
            Self::Temperature => "Temperature",
        }
    }

    /// Returns the fully qualified wire name, e.g. `sdm.devices.traits.Fan`.
    #[must_use]
    pub fn wire_name(&self) -> String {
        format!("{TRAIT_PREFIX}{}", self.short_name())
    }
}

impl fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for TraitCategory {
    type Err = ParseError;

    /// Accepts both the fully qualified and the short trait name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix(TRAIT_PREFIX).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|c| c.short_name() == short)
            .ok_or_else(|| ParseError::UnknownTrait(s.to_string()))
    }
}

/// `sdm.devices.traits.Info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoTrait {
    /// User-assigned name, empty when unset.
    #[serde(default)]
    pub custom_name: String,
}

/// `sdm.devices.traits.Humidity`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumidityTrait {
    /// Relative humidity in percent.
    pub ambient_humidity_percent: f64,
}

/// `sdm.devices.traits.Connectivity`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityTrait {
    /// Online or offline.
    pub status: ConnectivityStatus,
}

/// `sdm.devices.traits.Fan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanTrait {
    /// Whether the fan timer is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_mode: Option<FanTimerMode>,
    /// When the running fan timer stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_timeout: Option<DateTime<Utc>>,
}

/// `sdm.devices.traits.ThermostatMode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatModeTrait {
    /// Active mode.
    pub mode: ThermostatMode,
    /// Modes the device accepts; empty when not advertised.
    #[serde(default)]
    pub available_modes: Vec<ThermostatMode>,
}

/// `sdm.devices.traits.ThermostatEco`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatEcoTrait {
    /// Active eco mode.
    pub mode: EcoMode,
    /// Eco modes the device accepts.
    #[serde(default)]
    pub available_modes: Vec<EcoMode>,
    /// Eco heat setpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_celsius: Option<f64>,
    /// Eco cool setpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_celsius: Option<f64>,
}

/// `sdm.devices.traits.ThermostatHvac`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatHvacTrait {
    /// What the equipment is doing right now.
    pub status: HvacStatus,
}

/// `sdm.devices.traits.Settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsTrait {
    /// Scale the device displays temperatures in.
    pub temperature_scale: TemperatureScale,
}

/// `sdm.devices.traits.ThermostatTemperatureSetpoint`
///
/// Which fields are present depends on the mode: HEAT carries only
/// `heat_celsius`, COOL only `cool_celsius`, HEATCOOL both, OFF neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetpointTrait {
    /// Heat setpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_celsius: Option<f64>,
    /// Cool setpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_celsius: Option<f64>,
}

/// `sdm.devices.traits.Temperature`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureTrait {
    /// Measured ambient temperature.
    pub ambient_temperature_celsius: f64,
}

/// A complete payload for one trait category.
#[derive(Debug, Clone, PartialEq)]
pub enum TraitPayload {
    /// See [`InfoTrait`].
    Info(InfoTrait),
    /// See [`HumidityTrait`].
    Humidity(HumidityTrait),
    /// See [`ConnectivityTrait`].
    Connectivity(ConnectivityTrait),
    /// See [`FanTrait`].
    Fan(FanTrait),
    /// See [`ThermostatModeTrait`].
    ThermostatMode(ThermostatModeTrait),
    /// See [`ThermostatEcoTrait`].
    ThermostatEco(ThermostatEcoTrait),
    /// See [`ThermostatHvacTrait`].
    ThermostatHvac(ThermostatHvacTrait),
    /// See [`SettingsTrait`].
    Settings(SettingsTrait),
    /// See [`SetpointTrait`].
    ThermostatTemperatureSetpoint(SetpointTrait),
    /// See [`TemperatureTrait`].
    Temperature(TemperatureTrait),
}

impl TraitPayload {
    /// Returns the category this payload belongs to.
    #[must_use]
    pub fn category(&self) -> TraitCategory {
        match self {
            Self::Info(_) => TraitCategory::Info,
            Self::Humidity(_) => TraitCategory::Humidity,
            Self::Connectivity(_) => TraitCategory::Connectivity,
            Self::Fan(_) => TraitCategory::Fan,
            Self::ThermostatMode(_) => TraitCategory::ThermostatMode,
            Self::ThermostatEco(_) => TraitCategory::ThermostatEco,
            Self::ThermostatHvac(_) => TraitCategory::ThermostatHvac,
            Self::Settings(_) => TraitCategory::Settings,
            Self::ThermostatTemperatureSetpoint(_) => TraitCategory::ThermostatTemperatureSetpoint,
            Self::Temperature(_) => TraitCategory::Temperature,
        }
    }

    /// Parses the JSON payload of `category`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if a required field is missing or has the
    /// wrong type.
    pub fn from_json(
        category: TraitCategory,
        value: serde_json::Value,
    ) -> Result<Self, ParseError> {
        let payload = match category {
            TraitCategory::Info => Self::Info(serde_json::from_value(value)?),
            TraitCategory::Humidity => Self::Humidity(serde_json::from_value(value)?),
            TraitCategory::Connectivity => Self::Connectivity(serde_json::from_value(value)?),
            TraitCategory::Fan => Self::Fan(serde_json::from_value(value)?),
            TraitCategory::ThermostatMode => Self::ThermostatMode(serde_json::from_value(value)?),
            TraitCategory::ThermostatEco => Self::ThermostatEco(serde_json::from_value(value)?),
            TraitCategory::ThermostatHvac => Self::ThermostatHvac(serde_json::from_value(value)?),
            TraitCategory::Settings => Self::Settings(serde_json::from_value(value)?),
            TraitCategory::ThermostatTemperatureSetpoint => {
                Self::ThermostatTemperatureSetpoint(serde_json::from_value(value)?)
            }
            TraitCategory::Temperature => Self::Temperature(serde_json::from_value(value)?),
        };
        Ok(payload)
    }

    /// Serializes the payload back to its wire JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, ParseError> {
        let value = match self {
            Self::Info(t) => serde_json::to_value(t)?,
            Self::Humidity(t) => serde_json::to_value(t)?,
            Self::Connectivity(t) => serde_json::to_value(t)?,
            Self::Fan(t) => serde_json::to_value(t)?,
            Self::ThermostatMode(t) => serde_json::to_value(t)?,
            Self::ThermostatEco(t) => serde_json::to_value(t)?,
            Self::ThermostatHvac(t) => serde_json::to_value(t)?,
            Self::Settings(t) => serde_json::to_value(t)?,
            Self::ThermostatTemperatureSetpoint(t) => serde_json::to_value(t)?,
            Self::Temperature(t) => serde_json::to_value(t)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_from_wire_name() {
        let cat: TraitCategory = "sdm.devices.traits.ThermostatMode".parse().unwrap();
        assert_eq!(cat, TraitCategory::ThermostatMode);
        assert_eq!(cat.wire_name(), "sdm.devices.traits.ThermostatMode");
    }

    #[test]
    fn category_from_short_name() {
        let cat: TraitCategory = "Temperature".parse().unwrap();
        assert_eq!(cat, TraitCategory::Temperature);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = "sdm.devices.traits.CameraLiveStream"
            .parse::<TraitCategory>()
            .unwrap_err();
        assert!(matches!(err, ParseError::UnknownTrait(_)));
    }

    #[test]
    fn parse_mode_payload() {
        let payload = TraitPayload::from_json(
            TraitCategory::ThermostatMode,
            json!({"mode": "HEAT", "availableModes": ["HEAT", "COOL", "HEATCOOL", "OFF"]}),
        )
        .unwrap();

        let TraitPayload::ThermostatMode(mode) = &payload else {
            panic!("expected mode payload");
        };
        assert_eq!(mode.mode, ThermostatMode::Heat);
        assert_eq!(mode.available_modes.len(), 4);
        assert_eq!(payload.category(), TraitCategory::ThermostatMode);
    }

    #[test]
    fn incomplete_payload_is_rejected() {
        let result = TraitPayload::from_json(TraitCategory::Temperature, json!({}));
        assert!(matches!(result, Err(ParseError::Json(_))));
    }

    #[test]
    fn payload_for_wrong_category_is_rejected() {
        let result =
            TraitPayload::from_json(TraitCategory::Settings, json!({"mode": "HEAT"}));
        assert!(result.is_err());
    }

    #[test]
    fn setpoint_serializes_only_present_fields() {
        let payload = TraitPayload::ThermostatTemperatureSetpoint(SetpointTrait {
            heat_celsius: Some(20.0),
            cool_celsius: None,
        });
        assert_eq!(payload.to_json().unwrap(), json!({"heatCelsius": 20.0}));
    }

    #[test]
    fn fan_timeout_parses_as_timestamp() {
        let payload = TraitPayload::from_json(
            TraitCategory::Fan,
            json!({"timerMode": "ON", "timerTimeout": "2019-05-10T03:22:54Z"}),
        )
        .unwrap();
        let TraitPayload::Fan(fan) = payload else {
            panic!("expected fan payload");
        };
        assert_eq!(fan.timer_mode, Some(FanTimerMode::On));
        assert!(fan.timer_timeout.is_some());
    }
}
