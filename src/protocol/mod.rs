// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote API transport.
//!
//! The core talks to the cloud only through the [`RemoteApi`] trait. The
//! `http` feature provides [`SdmHttpClient`], an implementation backed by
//! `reqwest` for the Smart Device Management REST API and the Google OAuth
//! token endpoint. Tests and alternative transports implement the trait
//! directly.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::SdmHttpClient;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::command::DeviceCommand;
use crate::error::Error;
use crate::state::Device;
use crate::types::DeviceId;

/// OAuth client registration used for code exchange and token refresh.
#[derive(Clone)]
pub struct ClientCredentials {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
}

impl ClientCredentials {
    /// Creates credentials from a client id and secret.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Tokens returned by the OAuth endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Present on code exchange and when the refresh token was rotated.
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` from the moment it was issued.
    pub expires_in: Duration,
    /// Space separated granted scopes, when reported.
    pub scope: Option<String>,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Calls the remote API needs to offer.
///
/// Every method returns `Err` for transport-level failures (connection
/// errors, malformed responses, non-success status on the OAuth endpoint).
/// [`execute_command`](Self::execute_command) reports a well-formed refusal
/// from the API as `Ok(false)`.
pub trait RemoteApi: Send + Sync {
    /// Fetches the full device listing of a project.
    fn fetch_devices(
        &self,
        project_id: &str,
        access_token: &str,
    ) -> impl Future<Output = Result<Vec<Device>, Error>> + Send;

    /// Executes a command on one device.
    fn execute_command(
        &self,
        device_id: &DeviceId,
        access_token: &str,
        command: &DeviceCommand,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Exchanges an authorization code for an access and refresh token.
    fn exchange_auth_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> impl Future<Output = Result<TokenGrant, Error>> + Send;

    /// Exchanges a refresh token for a new access token.
    fn refresh_access_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, Error>> + Send;
}
