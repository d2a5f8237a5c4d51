// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the Smart Device Management API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, header};
use serde::Deserialize;
use serde_json::Value;

use crate::command::DeviceCommand;
use crate::config::ClientConfig;
use crate::error::{Error, ParseError, ProtocolError};
use crate::protocol::{ClientCredentials, RemoteApi, TokenGrant};
use crate::state::Device;
use crate::types::DeviceId;

/// `reqwest` client for the SDM REST API and the OAuth token endpoint.
///
/// Listing and command requests go to `{api_base_url}`; token requests go
/// to `{oauth_token_url}`. Both are taken from the [`ClientConfig`], so tests
/// can point them at a mock server.
///
/// # Examples
///
/// ```no_run
/// use nestor_lib::ClientConfig;
/// use nestor_lib::protocol::{RemoteApi, SdmHttpClient};
///
/// # async fn example() -> nestor_lib::Result<()> {
/// let config = ClientConfig::new("client-id", "secret", "project-uuid");
/// let http = SdmHttpClient::new(&config)?;
/// let devices = http.fetch_devices(config.project_id(), "ya29.token").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SdmHttpClient {
    client: Client,
    api_base_url: String,
    oauth_token_url: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: Duration::from_secs(response.expires_in),
            scope: response.scope,
        }
    }
}

impl SdmHttpClient {
    /// Creates a client using the endpoints and timeout of `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url().to_string(),
            oauth_token_url: config.oauth_token_url().to_string(),
        })
    }

    /// Returns the API root.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn devices_url(&self, project_id: &str) -> String {
        format!("{}/enterprises/{project_id}/devices", self.api_base_url)
    }

    fn command_url(&self, device_id: &DeviceId) -> String {
        format!("{}/{}:executeCommand", self.api_base_url, device_id.as_str())
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant, Error> {
        let response = self
            .client
            .post(&self.oauth_token_url)
            .form(form)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status();
        let text = response.text().await.map_err(ProtocolError::Http)?;
        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&text).map_err(ParseError::Json)?;
        Ok(token.into())
    }
}

fn bearer(request: RequestBuilder, access_token: &str) -> RequestBuilder {
    request.header(header::AUTHORIZATION, format!("Bearer {access_token}"))
}

impl RemoteApi for SdmHttpClient {
    async fn fetch_devices(
        &self,
        project_id: &str,
        access_token: &str,
    ) -> Result<Vec<Device>, Error> {
        let url = self.devices_url(project_id);
        tracing::debug!(url = %url, "Fetching device listing");

        let response = bearer(self.client.get(&url), access_token)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status();
        let text = response.text().await.map_err(ProtocolError::Http)?;
        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let body: Value = serde_json::from_str(&text).map_err(ParseError::Json)?;
        let devices = body
            .get("devices")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|entry| match Device::from_json(entry) {
                        Ok(device) => Some(device),
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping malformed device entry");
                            None
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        tracing::debug!(count = devices.len(), "Received device listing");
        Ok(devices)
    }

    async fn execute_command(
        &self,
        device_id: &DeviceId,
        access_token: &str,
        command: &DeviceCommand,
    ) -> Result<bool, Error> {
        let url = self.command_url(device_id);
        tracing::debug!(device_id = %device_id, command = command.name(), "Sending command");

        let response = bearer(self.client.post(&url), access_token)
            .json(&command.to_body())
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            device_id = %device_id,
            status = status.as_u16(),
            body = %body,
            "Command refused"
        );
        Ok(false)
    }

    async fn exchange_auth_code(
        &self,
        credentials: &ClientCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, Error> {
        self.token_request(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    async fn refresh_access_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenGrant, Error> {
        self.token_request(&[
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }
}
