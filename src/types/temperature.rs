// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature scale and unit conversion.
//!
//! The remote API stores and accepts every temperature in Celsius with one
//! decimal of precision. Devices display either Celsius or Fahrenheit; values
//! in the device's native scale are converted on the way in and out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Converts Celsius to Fahrenheit without rounding.
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Converts Fahrenheit to Celsius without rounding.
#[must_use]
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Rounds a Celsius value to the one-decimal precision the API accepts.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::{fahrenheit_to_celsius, round_to_api_precision};
///
/// assert_eq!(round_to_api_precision(fahrenheit_to_celsius(72.0)), 22.2);
/// ```
#[must_use]
pub fn round_to_api_precision(celsius: f64) -> f64 {
    (celsius * 10.0).round() / 10.0
}

/// Display scale of a thermostat.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::TemperatureScale;
///
/// let scale = TemperatureScale::Fahrenheit;
/// assert_eq!(scale.celsius_to_scale(20.0), 68.0);
/// assert_eq!(scale.to_celsius(68.0), 20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemperatureScale {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
}

impl TemperatureScale {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Celsius => "CELSIUS",
            Self::Fahrenheit => "FAHRENHEIT",
        }
    }

    /// Returns the unit symbol, e.g. `°F`.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Converts a value in this scale to Celsius, without rounding.
    #[must_use]
    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => fahrenheit_to_celsius(value),
        }
    }

    /// Converts a Celsius value to this scale, without rounding.
    #[must_use]
    pub fn celsius_to_scale(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    /// Rounds a value in this scale the way a device displays it.
    ///
    /// Fahrenheit is shown in whole degrees, Celsius with one decimal.
    #[must_use]
    pub fn round_for_display(self, value: f64) -> f64 {
        match self {
            Self::Celsius => (value * 10.0).round() / 10.0,
            Self::Fahrenheit => value.round(),
        }
    }
}

impl fmt::Display for TemperatureScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemperatureScale {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CELSIUS" | "C" => Ok(Self::Celsius),
            "FAHRENHEIT" | "F" => Ok(Self::Fahrenheit),
            _ => Err(ValueError::InvalidScale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fahrenheit_72_rounds_to_22_2() {
        let c = round_to_api_precision(fahrenheit_to_celsius(72.0));
        assert!(close(c, 22.2));
    }

    #[test]
    fn fahrenheit_round_trip_is_bounded() {
        let c = round_to_api_precision(fahrenheit_to_celsius(72.0));
        let back = celsius_to_fahrenheit(c);
        assert!((back - 72.0).abs() < 1.0);
    }

    #[test]
    fn celsius_scale_is_identity() {
        assert!(close(TemperatureScale::Celsius.to_celsius(21.5), 21.5));
        assert!(close(TemperatureScale::Celsius.celsius_to_scale(21.5), 21.5));
    }

    #[test]
    fn display_rounding() {
        assert!(close(TemperatureScale::Fahrenheit.round_for_display(69.98), 70.0));
        assert!(close(TemperatureScale::Celsius.round_for_display(21.14), 21.1));
    }

    #[test]
    fn scale_parse() {
        assert_eq!(
            "fahrenheit".parse::<TemperatureScale>(),
            Ok(TemperatureScale::Fahrenheit)
        );
        assert!("kelvin".parse::<TemperatureScale>().is_err());
    }
}
