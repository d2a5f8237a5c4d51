// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshot model.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::ParseError;
use crate::types::DeviceId;

use super::traits::{
    ConnectivityTrait, FanTrait, HumidityTrait, InfoTrait, SetpointTrait, SettingsTrait,
    TemperatureTrait, ThermostatEcoTrait, ThermostatHvacTrait, ThermostatModeTrait,
    TraitCategory, TraitPayload,
};

const THERMOSTAT_TYPE: &str = "sdm.devices.types.THERMOSTAT";

/// Kind of device reported by the listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// `sdm.devices.types.THERMOSTAT`
    Thermostat,
    /// Any other device type; kept in the snapshot but never acted upon.
    Other(String),
}

impl DeviceType {
    /// Parses the wire type string.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        if s == THERMOSTAT_TYPE {
            Self::Thermostat
        } else {
            Self::Other(s.to_string())
        }
    }

    /// Returns the wire type string.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Thermostat => THERMOSTAT_TYPE,
            Self::Other(s) => s,
        }
    }
}

/// Last known full state of one device.
///
/// Each trait category is either absent or holds a complete payload.
/// The only way to change a category is to replace it whole with
/// [`set_trait`](Self::set_trait).
///
/// # Examples
///
/// ```
/// use nestor_lib::state::{Device, DeviceType, SettingsTrait, TraitPayload};
/// use nestor_lib::types::TemperatureScale;
///
/// let mut device = Device::new("enterprises/p/devices/a", DeviceType::Thermostat);
/// device.set_trait(TraitPayload::Settings(SettingsTrait {
///     temperature_scale: TemperatureScale::Fahrenheit,
/// }));
/// assert_eq!(device.settings().unwrap().temperature_scale, TemperatureScale::Fahrenheit);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    id: DeviceId,
    device_type: DeviceType,
    traits: BTreeMap<TraitCategory, TraitPayload>,
}

macro_rules! trait_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(&self) -> Option<&$ty> {
            match self.traits.get(&TraitCategory::$variant) {
                Some(TraitPayload::$variant(t)) => Some(t),
                _ => None,
            }
        }
    };
}

impl Device {
    /// Creates a device with no traits observed yet.
    #[must_use]
    pub fn new(id: impl Into<DeviceId>, device_type: DeviceType) -> Self {
        Self {
            id: id.into(),
            device_type,
            traits: BTreeMap::new(),
        }
    }

    /// Adds a trait payload, builder style.
    #[must_use]
    pub fn with_trait(mut self, payload: TraitPayload) -> Self {
        self.set_trait(payload);
        self
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the device type.
    #[must_use]
    pub fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    /// Returns `true` for thermostats.
    #[must_use]
    pub fn is_thermostat(&self) -> bool {
        self.device_type == DeviceType::Thermostat
    }

    /// Replaces the whole payload of the payload's category.
    ///
    /// Returns the previous payload of that category, if any.
    pub fn set_trait(&mut self, payload: TraitPayload) -> Option<TraitPayload> {
        self.traits.insert(payload.category(), payload)
    }

    /// Returns the payload of a category.
    #[must_use]
    pub fn trait_payload(&self, category: TraitCategory) -> Option<&TraitPayload> {
        self.traits.get(&category)
    }

    /// Returns the categories observed so far.
    pub fn categories(&self) -> impl Iterator<Item = TraitCategory> + '_ {
        self.traits.keys().copied()
    }

    trait_accessor!(
        /// `Info` trait.
        info, Info, InfoTrait
    );
    trait_accessor!(
        /// `Humidity` trait.
        humidity, Humidity, HumidityTrait
    );
    trait_accessor!(
        /// `Connectivity` trait.
        connectivity, Connectivity, ConnectivityTrait
    );
    trait_accessor!(
        /// `Fan` trait.
        fan, Fan, FanTrait
    );
    trait_accessor!(
        /// `ThermostatMode` trait.
        thermostat_mode, ThermostatMode, ThermostatModeTrait
    );
    trait_accessor!(
        /// `ThermostatEco` trait.
        thermostat_eco, ThermostatEco, ThermostatEcoTrait
    );
    trait_accessor!(
        /// `ThermostatHvac` trait.
        thermostat_hvac, ThermostatHvac, ThermostatHvacTrait
    );
    trait_accessor!(
        /// `Settings` trait.
        settings, Settings, SettingsTrait
    );
    trait_accessor!(
        /// `ThermostatTemperatureSetpoint` trait.
        setpoint, ThermostatTemperatureSetpoint, SetpointTrait
    );
    trait_accessor!(
        /// `Temperature` trait.
        temperature, Temperature, TemperatureTrait
    );

    /// Returns the user-assigned name, if set.
    #[must_use]
    pub fn custom_name(&self) -> Option<&str> {
        self.info()
            .map(|info| info.custom_name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Parses one device object from a listing response.
    ///
    /// Unknown trait categories are skipped. A known category whose payload
    /// fails to parse is left absent rather than stored half-valid.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if `name` or `type` is missing.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("name".to_string()))?;
        let device_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("type".to_string()))?;

        let mut device = Self::new(name, DeviceType::from_wire(device_type));

        if let Some(traits) = value.get("traits").and_then(Value::as_object) {
            for (wire_name, payload) in traits {
                let Ok(category) = wire_name.parse::<TraitCategory>() else {
                    tracing::trace!(device = %name, trait_name = %wire_name, "Skipping unknown trait");
                    continue;
                };
                match TraitPayload::from_json(category, payload.clone()) {
                    Ok(payload) => {
                        device.set_trait(payload);
                    }
                    Err(e) => {
                        tracing::warn!(device = %name, %category, error = %e, "Dropping malformed trait");
                    }
                }
            }
        }

        Ok(device)
    }
}
