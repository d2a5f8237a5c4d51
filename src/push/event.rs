// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw device change events as delivered by a push transport.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ParseError;
use crate::state::{TraitCategory, TraitPayload};
use crate::types::DeviceId;

/// One trait category update for one device, still in wire form.
///
/// The category and payload are validated only when the event is handled,
/// so a transport can forward whatever it received.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceChangeEvent {
    /// Device the update is for.
    pub device_id: DeviceId,
    /// Trait name, fully qualified or short.
    pub category: String,
    /// Complete payload of the category.
    pub payload: Value,
    /// When the remote side produced the update, if known.
    pub timestamp: Option<DateTime<Utc>>,
}

impl DeviceChangeEvent {
    /// Creates an event without a timestamp.
    #[must_use]
    pub fn new(device_id: impl Into<DeviceId>, category: impl Into<String>, payload: Value) -> Self {
        Self {
            device_id: device_id.into(),
            category: category.into(),
            payload,
            timestamp: None,
        }
    }

    /// Parses the category and payload into a typed trait update.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownTrait` for a category this library does
    /// not know, or `ParseError::Json` if the payload does not match it.
    pub fn to_payload(&self) -> Result<TraitPayload, ParseError> {
        let category: TraitCategory = self.category.parse()?;
        TraitPayload::from_json(category, self.payload.clone())
    }
}

/// Splits an SDM `resourceUpdate` event message into per-trait events.
///
/// Messages without a `resourceUpdate.traits` object (relation updates,
/// camera events) yield no events.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if the update has no resource name and
/// `ParseError::InvalidValue` if the timestamp is not RFC 3339.
///
/// # Examples
///
/// ```
/// use nestor_lib::push::events_from_resource_update;
/// use serde_json::json;
///
/// let message = json!({
///     "timestamp": "2024-01-15T08:30:00Z",
///     "resourceUpdate": {
///         "name": "enterprises/p/devices/d",
///         "traits": {
///             "sdm.devices.traits.ThermostatMode": {"mode": "COOL"}
///         }
///     }
/// });
/// let events = events_from_resource_update(&message).unwrap();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].device_id.as_str(), "enterprises/p/devices/d");
/// ```
pub fn events_from_resource_update(message: &Value) -> Result<Vec<DeviceChangeEvent>, ParseError> {
    let Some(update) = message.get("resourceUpdate") else {
        return Ok(Vec::new());
    };
    let Some(traits) = update.get("traits").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let name = update
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::MissingField("resourceUpdate.name".to_string()))?;

    let timestamp = message
        .get("timestamp")
        .and_then(Value::as_str)
        .map(|ts| {
            DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ParseError::InvalidValue {
                    field: "timestamp".to_string(),
                    message: e.to_string(),
                })
        })
        .transpose()?;

    let device_id = DeviceId::new(name);
    Ok(traits
        .iter()
        .map(|(category, payload)| DeviceChangeEvent {
            device_id: device_id.clone(),
            category: category.clone(),
            payload: payload.clone(),
            timestamp,
        })
        .collect())
}
