// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat facade.
//!
//! [`Thermostat`] is a typed, read-through view of one device in the
//! [`DeviceStore`](crate::state::DeviceStore) with a change hook that any
//! number of observers can attach to. [`ThermostatView`] is the same data
//! derived once from a snapshot. [`Ticker`] drives a closure periodically
//! and on every change, the way a display refreshes.
//!
//! # Temperatures
//!
//! The remote API stores everything in Celsius. The facade converts to the
//! device's display scale and rounds like the device does: Fahrenheit to
//! whole degrees, Celsius to one decimal. The unrounded value is available
//! through [`Thermostat::setpoint_exact`].

mod facade;
mod ticker;
pub(crate) mod view;

pub use facade::Thermostat;
pub use ticker::{DEFAULT_TICK_PERIOD, Ticker, TickerHandle};
pub use view::ThermostatView;
