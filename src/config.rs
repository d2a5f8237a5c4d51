// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::MIN_SAFETY_MARGIN;
use crate::protocol::ClientCredentials;

/// Settings for a [`Client`](crate::Client).
///
/// `client_id`, `client_secret` and `project_id` come from the Device Access
/// console and the Google Cloud OAuth client. Everything else has a working
/// default.
///
/// # Examples
///
/// ```
/// use nestor_lib::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("client-id", "client-secret", "project-uuid")
///     .with_cloud_project_id("my-gcp-project")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// assert!(!format!("{config:?}").contains("client-secret"));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    client_id: String,
    client_secret: String,
    project_id: String,
    #[serde(default)]
    cloud_project_id: Option<String>,
    #[serde(default = "default_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_oauth_token_url")]
    oauth_token_url: String,
    #[serde(default = "default_account_link_base_url")]
    account_link_base_url: String,
    #[serde(default = "default_timeout", with = "secs")]
    timeout: Duration,
    #[serde(default = "default_safety_margin", with = "secs")]
    token_safety_margin: Duration,
    #[serde(default = "default_poll_interval", with = "secs")]
    poll_interval: Duration,
}

impl ClientConfig {
    /// Smart Device Management API root.
    pub const DEFAULT_API_BASE_URL: &'static str = "https://smartdevicemanagement.googleapis.com/v1";
    /// Google OAuth token endpoint.
    pub const DEFAULT_OAUTH_TOKEN_URL: &'static str = "https://www.googleapis.com/oauth2/v4/token";
    /// Partner connections page used for account linking.
    pub const DEFAULT_ACCOUNT_LINK_BASE_URL: &'static str =
        "https://nestservices.google.com/partnerconnections";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default poll interval for tickers.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

    /// Creates a configuration with default endpoints.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            project_id: project_id.into(),
            cloud_project_id: None,
            api_base_url: default_api_base_url(),
            oauth_token_url: default_oauth_token_url(),
            account_link_base_url: default_account_link_base_url(),
            timeout: Self::DEFAULT_TIMEOUT,
            token_safety_margin: MIN_SAFETY_MARGIN,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the Google Cloud project that hosts the Pub/Sub subscription.
    #[must_use]
    pub fn with_cloud_project_id(mut self, id: impl Into<String>) -> Self {
        self.cloud_project_id = Some(id.into());
        self
    }

    /// Overrides the API root, e.g. to point at a mock server.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = trim_slash(url.into());
        self
    }

    /// Overrides the OAuth token endpoint.
    #[must_use]
    pub fn with_oauth_token_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_token_url = url.into();
        self
    }

    /// Overrides the account linking page.
    #[must_use]
    pub fn with_account_link_base_url(mut self, url: impl Into<String>) -> Self {
        self.account_link_base_url = trim_slash(url.into());
        self
    }

    /// Sets the per-request timeout of the HTTP transport.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the token safety margin; values under ten seconds are raised.
    #[must_use]
    pub fn with_token_safety_margin(mut self, margin: Duration) -> Self {
        self.token_safety_margin = margin.max(MIN_SAFETY_MARGIN);
        self
    }

    /// Sets the default ticker period.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// OAuth client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Device Access project id.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Google Cloud project id, if set.
    #[must_use]
    pub fn cloud_project_id(&self) -> Option<&str> {
        self.cloud_project_id.as_deref()
    }

    /// API root without trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// OAuth token endpoint.
    #[must_use]
    pub fn oauth_token_url(&self) -> &str {
        &self.oauth_token_url
    }

    /// Account linking page without trailing slash.
    #[must_use]
    pub fn account_link_base_url(&self) -> &str {
        &self.account_link_base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Token safety margin, never below ten seconds.
    #[must_use]
    pub fn token_safety_margin(&self) -> Duration {
        self.token_safety_margin.max(MIN_SAFETY_MARGIN)
    }

    /// Default ticker period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the OAuth client registration.
    #[must_use]
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(&self.client_id, &self.client_secret)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("cloud_project_id", &self.cloud_project_id)
            .field("api_base_url", &self.api_base_url)
            .field("oauth_token_url", &self.oauth_token_url)
            .field("account_link_base_url", &self.account_link_base_url)
            .field("timeout", &self.timeout)
            .field("token_safety_margin", &self.token_safety_margin)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// What a caller persists to resume an onboarded client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Scopes granted at onboarding.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredCredentials {
    /// Creates stored credentials.
    #[must_use]
    pub fn new(refresh_token: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            scopes,
        }
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("refresh_token", &"<redacted>")
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

fn default_api_base_url() -> String {
    ClientConfig::DEFAULT_API_BASE_URL.to_string()
}

fn default_oauth_token_url() -> String {
    ClientConfig::DEFAULT_OAUTH_TOKEN_URL.to_string()
}

fn default_account_link_base_url() -> String {
    ClientConfig::DEFAULT_ACCOUNT_LINK_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    ClientConfig::DEFAULT_TIMEOUT
}

fn default_safety_margin() -> Duration {
    MIN_SAFETY_MARGIN
}

fn default_poll_interval() -> Duration {
    ClientConfig::DEFAULT_POLL_INTERVAL
}

/// Durations as whole seconds.
mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
