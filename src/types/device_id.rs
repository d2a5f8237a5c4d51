// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable opaque identifier of a device.
///
/// The remote API names devices with a resource path such as
/// `enterprises/<project>/devices/<id>`. The full path is kept as-is and
/// used both as the snapshot key and as the command target.
///
/// Cloning is cheap: the string is shared.
///
/// # Examples
///
/// ```
/// use nestor_lib::types::DeviceId;
///
/// let id = DeviceId::new("enterprises/p/devices/abc");
/// assert_eq!(id.as_str(), "enterprises/p/devices/abc");
/// assert_eq!(id.short(), "abc");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    /// Creates a device identifier from its resource name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Returns the full resource name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path segment of the resource name.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.short())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DeviceId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_name() {
        let a = DeviceId::new("enterprises/p/devices/abc");
        let b = DeviceId::from("enterprises/p/devices/abc".to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn short_without_path() {
        let id = DeviceId::new("abc");
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn debug_format_uses_short_name() {
        let id = DeviceId::new("enterprises/p/devices/abc");
        assert_eq!(format!("{id:?}"), "DeviceId(abc)");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DeviceId::new("enterprises/p/devices/abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"enterprises/p/devices/abc\"");
    }

    #[test]
    fn deserializes_from_plain_string() {
        let id: DeviceId = serde_json::from_str("\"enterprises/p/devices/abc\"").unwrap();
        assert_eq!(id, DeviceId::new("enterprises/p/devices/abc"));

        let back: DeviceId = serde_json::from_str(&serde_json::to_string(&id).unwrap()).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(DeviceId::new("a"));
        assert!(set.contains(&DeviceId::new("a")));
    }
}
