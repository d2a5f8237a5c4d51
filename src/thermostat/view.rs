// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed values derived from a thermostat snapshot.

use crate::state::Device;
use crate::types::{
    ConnectivityStatus, DeviceId, EcoMode, HvacStatus, TemperatureScale, ThermostatMode,
};

/// Everything a thermostat display needs, derived from one snapshot.
///
/// Temperatures are in the device's native scale. `setpoint_exact` keeps the
/// unrounded value so that arithmetic on it does not accumulate display
/// rounding; `setpoint` is rounded the way the device shows it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatView {
    /// Device the view was derived from.
    pub id: DeviceId,
    /// User-assigned name, if any.
    pub name: Option<String>,
    /// Active mode; `None` if the device never reported one.
    pub mode: Option<ThermostatMode>,
    /// Modes the device accepts.
    pub available_modes: Vec<ThermostatMode>,
    /// Display scale, Celsius when unreported.
    pub scale: TemperatureScale,
    /// Ambient temperature, display-rounded.
    pub current_temperature: Option<f64>,
    /// Active single setpoint, display-rounded.
    pub setpoint: Option<f64>,
    /// Active single setpoint, unrounded.
    pub setpoint_exact: Option<f64>,
    /// Heat and cool setpoints in HEATCOOL mode, display-rounded.
    pub heat_cool_range: Option<(f64, f64)>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// What the equipment is doing right now.
    pub hvac_status: Option<HvacStatus>,
    /// Whether eco mode overrides the setpoint.
    pub eco_mode: Option<EcoMode>,
    /// Connectivity; `None` if unreported.
    pub connectivity: Option<ConnectivityStatus>,
}

impl ThermostatView {
    /// Derives a view from a device snapshot.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        let scale = native_scale(device);
        let mode = device.thermostat_mode().map(|t| t.mode);
        let setpoint_exact = exact_setpoint(device);
        let heat_cool_range = match (mode, device.setpoint()) {
            (Some(ThermostatMode::HeatCool), Some(sp)) => sp
                .heat_celsius
                .zip(sp.cool_celsius)
                .map(|(heat, cool)| (display(scale, heat), display(scale, cool))),
            _ => None,
        };

        Self {
            id: device.id().clone(),
            name: device.custom_name().map(str::to_owned),
            mode,
            available_modes: device
                .thermostat_mode()
                .map(|t| t.available_modes.clone())
                .unwrap_or_default(),
            scale,
            current_temperature: device
                .temperature()
                .map(|t| display(scale, t.ambient_temperature_celsius)),
            setpoint: setpoint_exact.map(|v| scale.round_for_display(v)),
            setpoint_exact,
            heat_cool_range,
            humidity: device.humidity().map(|h| h.ambient_humidity_percent),
            hvac_status: device.thermostat_hvac().map(|h| h.status),
            eco_mode: device.thermostat_eco().map(|e| e.mode),
            connectivity: device.connectivity().map(|c| c.status),
        }
    }

    /// Returns `true` unless the device reported itself offline.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity != Some(ConnectivityStatus::Offline)
    }
}

/// Returns the scale the device displays temperatures in.
pub(crate) fn native_scale(device: &Device) -> TemperatureScale {
    device
        .settings()
        .map(|s| s.temperature_scale)
        .unwrap_or_default()
}

/// Returns the unrounded setpoint of the active mode in the native scale.
///
/// Only HEAT and COOL have a single setpoint.
pub(crate) fn exact_setpoint(device: &Device) -> Option<f64> {
    let scale = native_scale(device);
    let setpoint = device.setpoint()?;
    let celsius = match device.thermostat_mode()?.mode {
        ThermostatMode::Heat => setpoint.heat_celsius?,
        ThermostatMode::Cool => setpoint.cool_celsius?,
        ThermostatMode::HeatCool | ThermostatMode::Off => return None,
    };
    Some(scale.celsius_to_scale(celsius))
}

fn display(scale: TemperatureScale, celsius: f64) -> f64 {
    scale.round_for_display(scale.celsius_to_scale(celsius))
}
