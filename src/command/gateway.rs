// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat command execution with optimistic local updates.

use std::sync::Arc;

use crate::auth::TokenManager;
use crate::error::Result;
use crate::protocol::RemoteApi;
use crate::state::{DeviceStore, SetpointTrait, ThermostatModeTrait, TraitCategory, TraitPayload};
use crate::thermostat::view::{exact_setpoint, native_scale};
use crate::types::{DeviceId, ThermostatMode, round_to_api_precision};

use super::DeviceCommand;

/// Sends thermostat commands and mirrors accepted ones into the store.
///
/// Every operation returns `Ok(true)` when the remote API accepted the
/// command and `Ok(false)` when it was refused, could not be sent, or was
/// rejected locally because the device is in the wrong state. Only token
/// failures are returned as `Err`.
///
/// Commands are never retried.
pub struct CommandGateway<A> {
    api: Arc<A>,
    tokens: Arc<TokenManager<A>>,
    store: Arc<DeviceStore>,
}

impl<A: RemoteApi> CommandGateway<A> {
    /// Creates a gateway over shared token and store state.
    #[must_use]
    pub fn new(api: Arc<A>, tokens: Arc<TokenManager<A>>, store: Arc<DeviceStore>) -> Self {
        Self { api, tokens, store }
    }

    /// Switches the thermostat mode.
    ///
    /// Rejected locally when the device is unknown or advertises a list of
    /// available modes that does not contain `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error only if no access token can be obtained.
    pub async fn set_mode(&self, id: &DeviceId, mode: ThermostatMode) -> Result<bool> {
        let Some(current) = self.store.with_device(id, |d| d.thermostat_mode().cloned()) else {
            tracing::debug!(device_id = %id, "Mode change for unknown device");
            return Ok(false);
        };

        let offered = current.map(|t| t.available_modes).unwrap_or_default();
        if !offered.is_empty() && !offered.contains(&mode) {
            tracing::debug!(device_id = %id, %mode, "Mode not offered by device");
            return Ok(false);
        }

        if !self.execute(id, &DeviceCommand::SetMode(mode)).await? {
            return Ok(false);
        }

        self.store
            .merge_with(id, TraitCategory::ThermostatMode, |current| {
                let available_modes = match current {
                    Some(TraitPayload::ThermostatMode(t)) => t.available_modes.clone(),
                    _ => Vec::new(),
                };
                TraitPayload::ThermostatMode(ThermostatModeTrait {
                    mode,
                    available_modes,
                })
            });
        Ok(true)
    }

    /// Sets the single setpoint of a thermostat in HEAT or COOL mode.
    ///
    /// `value` is in the device's native scale and is sent in Celsius,
    /// rounded to one decimal. In any other mode the call is rejected
    /// locally with no network traffic.
    ///
    /// # Errors
    ///
    /// Returns an error only if no access token can be obtained.
    pub async fn set_temperature(&self, id: &DeviceId, value: f64) -> Result<bool> {
        let Some((mode, scale)) = self
            .store
            .with_device(id, |d| (d.thermostat_mode().map(|t| t.mode), native_scale(d)))
        else {
            tracing::debug!(device_id = %id, "Setpoint change for unknown device");
            return Ok(false);
        };

        let celsius = round_to_api_precision(scale.to_celsius(value));
        let command = match mode {
            Some(ThermostatMode::Heat) => DeviceCommand::SetHeat {
                heat_celsius: celsius,
            },
            Some(ThermostatMode::Cool) => DeviceCommand::SetCool {
                cool_celsius: celsius,
            },
            _ => {
                tracing::debug!(device_id = %id, ?mode, "No single setpoint in current mode");
                return Ok(false);
            }
        };

        if !self.execute(id, &command).await? {
            return Ok(false);
        }

        // Only the commanded field changes; the other one keeps its latest value
        self.store
            .merge_with(id, TraitCategory::ThermostatTemperatureSetpoint, |current| {
                let mut setpoint = match current {
                    Some(TraitPayload::ThermostatTemperatureSetpoint(sp)) => sp.clone(),
                    _ => SetpointTrait::default(),
                };
                match command {
                    DeviceCommand::SetHeat { heat_celsius } => {
                        setpoint.heat_celsius = Some(heat_celsius);
                    }
                    DeviceCommand::SetCool { cool_celsius } => {
                        setpoint.cool_celsius = Some(cool_celsius);
                    }
                    DeviceCommand::SetMode(_) => {}
                }
                TraitPayload::ThermostatTemperatureSetpoint(setpoint)
            });
        Ok(true)
    }

    /// Moves the setpoint by `step` whole degrees in the native scale.
    ///
    /// The step is applied to the unrounded setpoint so that opposite steps
    /// cancel out exactly.
    ///
    /// # Errors
    ///
    /// Returns an error only if no access token can be obtained.
    pub async fn set_temperature_delta(&self, id: &DeviceId, step: i32) -> Result<bool> {
        let Some(exact) = self.store.with_device(id, exact_setpoint).flatten() else {
            tracing::debug!(device_id = %id, "No single setpoint to adjust");
            return Ok(false);
        };

        self.set_temperature(id, exact + f64::from(step)).await
    }

    /// Sends a command, absorbing every failure except token errors.
    async fn execute(&self, id: &DeviceId, command: &DeviceCommand) -> Result<bool> {
        let token = self.tokens.ensure_valid_token().await?;

        match self.api.execute_command(id, &token, command).await {
            Ok(true) => {
                tracing::debug!(device_id = %id, command = command.name(), "Command accepted");
                Ok(true)
            }
            Ok(false) => {
                tracing::warn!(device_id = %id, command = command.name(), "Command rejected");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(
                    device_id = %id,
                    command = command.name(),
                    error = %e,
                    "Command failed"
                );
                Ok(false)
            }
        }
    }
}

impl<A> std::fmt::Debug for CommandGateway<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGateway")
            .field("devices", &self.store.len())
            .finish_non_exhaustive()
    }
}
