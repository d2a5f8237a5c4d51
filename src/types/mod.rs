// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for thermostat state and control.
//!
//! # Types
//!
//! - [`DeviceId`] - Opaque resource name of a device
//! - [`ThermostatMode`] - OFF / HEAT / COOL / HEATCOOL
//! - [`TemperatureScale`] - Display scale of a device (Celsius or Fahrenheit)
//! - [`EcoMode`], [`HvacStatus`], [`ConnectivityStatus`], [`FanTimerMode`] -
//!   enumerations reported by the remaining thermostat traits

mod device_id;
mod mode;
mod temperature;

pub use device_id::DeviceId;
pub use mode::{ConnectivityStatus, EcoMode, FanTimerMode, HvacStatus, ThermostatMode};
pub use temperature::{
    TemperatureScale, celsius_to_fahrenheit, fahrenheit_to_celsius, round_to_api_precision,
};
