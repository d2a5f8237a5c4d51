// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OAuth token management.
//!
//! [`TokenManager`] owns the access and refresh token pair and guarantees
//! that at most one refresh runs at a time.

mod manager;

pub use manager::{MAX_TOKEN_LIFETIME, MIN_SAFETY_MARGIN, SaveRefreshToken, TokenManager};
