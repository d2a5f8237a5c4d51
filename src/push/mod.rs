// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push updates.
//!
//! The subscription transport itself is supplied by the caller through
//! [`PushTransport`]. This module owns what happens to an event once it
//! arrives: [`PushListener`] parses it and merges it into the
//! [`DeviceStore`](crate::state::DeviceStore), dropping anything it cannot
//! understand.

mod event;
mod listener;

pub use event::{DeviceChangeEvent, events_from_resource_update};
pub use listener::{HandleOutcome, NoPush, PushListener, PushTransport, subscribe};
