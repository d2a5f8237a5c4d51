// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Top-level client tying the components together.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::auth::TokenManager;
use crate::command::CommandGateway;
use crate::config::{ClientConfig, StoredCredentials};
use crate::error::{AuthError, Error, Result};
use crate::protocol::RemoteApi;
use crate::push::{NoPush, PushListener, PushTransport, subscribe};
use crate::state::DeviceStore;
use crate::thermostat::{Thermostat, Ticker};
use crate::types::DeviceId;

#[cfg(feature = "http")]
use crate::protocol::SdmHttpClient;

/// OAuth scope requested during account linking.
pub const SDM_SCOPE: &str = "https://www.googleapis.com/auth/sdm.service";

/// Client for the thermostats of one Device Access project.
///
/// Owns the shared [`TokenManager`] and [`DeviceStore`] and hands out
/// [`Thermostat`] facades over them. Commands go through
/// [`commands`](Self::commands); push events are applied by the
/// [`PushListener`] passed to the push transport.
///
/// # Examples
///
/// ```no_run
/// use nestor_lib::{Client, ClientConfig, StoredCredentials};
/// use nestor_lib::push::NoPush;
///
/// # async fn example() -> nestor_lib::Result<()> {
/// let config = ClientConfig::new("client-id", "secret", "project-uuid");
/// let stored = StoredCredentials::new("1//refresh-token", vec![]);
/// let client = Client::resume_http(config, stored, NoPush, |token| {
///     println!("persist {token}");
/// })
/// .await?;
///
/// if let Some(hallway) = client.thermostat("Hallway") {
///     println!("{:?} {:?}", hallway.mode(), hallway.setpoint());
///     client.commands().set_temperature_delta(hallway.id(), 1).await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client<A, P = NoPush> {
    config: ClientConfig,
    api: Arc<A>,
    push: P,
    tokens: Arc<TokenManager<A>>,
    store: Arc<DeviceStore>,
    commands: CommandGateway<A>,
    listener: PushListener,
    redirect_uri: Mutex<Option<String>>,
}

impl<A: RemoteApi, P: PushTransport> Client<A, P> {
    /// Creates a client that still has to be onboarded.
    ///
    /// `on_refresh_token` is called with every refresh token that must be
    /// persisted: the one obtained at onboarding and any rotated one.
    #[must_use]
    pub fn new<F>(config: ClientConfig, api: A, push: P, on_refresh_token: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let api = Arc::new(api);
        let tokens = Arc::new(
            TokenManager::new(api.clone(), config.credentials())
                .with_safety_margin(config.token_safety_margin())
                .with_save_callback(on_refresh_token),
        );
        let store = Arc::new(DeviceStore::new());
        let commands = CommandGateway::new(api.clone(), tokens.clone(), store.clone());
        let listener = PushListener::new(store.clone());

        Self {
            config,
            api,
            push,
            tokens,
            store,
            commands,
            listener,
            redirect_uri: Mutex::new(None),
        }
    }

    /// Creates a client from persisted credentials, loads the device
    /// listing and starts the push subscription.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the refresh token is no longer accepted.
    pub async fn resume<F>(
        config: ClientConfig,
        credentials: StoredCredentials,
        api: A,
        push: P,
        on_refresh_token: F,
    ) -> Result<Self>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let client = Self::new(config, api, push, on_refresh_token);
        client
            .tokens
            .set_refresh_token(credentials.refresh_token, credentials.scopes);
        client.refresh_devices().await?;
        client.start_push().await?;
        Ok(client)
    }

    /// Returns the account linking URL the user must open.
    ///
    /// `redirect_uri` is remembered for [`finish_setup`](Self::finish_setup).
    pub fn account_link_url(&self, redirect_uri: &str) -> String {
        *self.redirect_uri.lock() = Some(redirect_uri.to_string());

        format!(
            "{}/{}/auth?redirect_uri={}&access_type=offline&prompt=consent&client_id={}&response_type=code&scope={}",
            self.config.account_link_base_url(),
            self.config.project_id(),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(self.config.client_id()),
            urlencoding::encode(SDM_SCOPE),
        )
    }

    /// Completes onboarding with the code the redirect received.
    ///
    /// The refresh token is passed to the save callback and returned. The
    /// device listing is loaded and push is started afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExchangeFailed` if
    /// [`account_link_url`](Self::account_link_url) was never called or the
    /// code exchange fails.
    pub async fn finish_setup(&self, code: &str, scope: &str) -> Result<String> {
        let redirect_uri = self.redirect_uri.lock().clone();
        let Some(redirect_uri) = redirect_uri else {
            return Err(AuthError::ExchangeFailed("no account link URL was issued".into()).into());
        };

        let scopes = scope.split_whitespace().map(str::to_owned).collect();
        let refresh_token = self
            .tokens
            .complete_authorization(code, &redirect_uri, scopes)
            .await?;

        self.refresh_devices().await?;
        self.start_push().await?;
        Ok(refresh_token)
    }

    /// Reloads the full device listing.
    ///
    /// Returns `Ok(false)` and leaves the store untouched when the listing
    /// could not be fetched; the next call simply tries again.
    ///
    /// # Errors
    ///
    /// Returns an auth error if no access token can be obtained.
    pub async fn refresh_devices(&self) -> Result<bool> {
        let token = self.tokens.ensure_valid_token().await?;

        match self.api.fetch_devices(self.config.project_id(), &token).await {
            Ok(devices) => {
                tracing::info!(count = devices.len(), "Device listing loaded");
                self.store.replace_all(devices);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch device listing");
                Ok(false)
            }
        }
    }

    /// Starts the push subscription.
    ///
    /// Transport failures are logged and reported as `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns an auth error if no access token can be obtained.
    pub async fn start_push(&self) -> Result<bool> {
        match subscribe(&self.push, self.tokens.as_ref(), self.listener.clone()).await {
            Ok(()) => Ok(true),
            Err(Error::Auth(e)) => Err(Error::Auth(e)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start push subscription");
                Ok(false)
            }
        }
    }
}

#[cfg(feature = "http")]
impl<P: PushTransport> Client<SdmHttpClient, P> {
    /// Creates a client backed by [`SdmHttpClient`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn http<F>(config: ClientConfig, push: P, on_refresh_token: F) -> Result<Self>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let api = SdmHttpClient::new(&config)?;
        Ok(Self::new(config, api, push, on_refresh_token))
    }

    /// [`resume`](Self::resume) with an [`SdmHttpClient`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created or the refresh
    /// token is no longer accepted.
    pub async fn resume_http<F>(
        config: ClientConfig,
        credentials: StoredCredentials,
        push: P,
        on_refresh_token: F,
    ) -> Result<Self>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let api = SdmHttpClient::new(&config)?;
        Self::resume(config, credentials, api, push, on_refresh_token).await
    }
}

impl<A, P> Client<A, P> {
    /// Finds a thermostat by device name, short id or custom name.
    ///
    /// Matching ignores ASCII case. A blank `name` finds nothing.
    #[must_use]
    pub fn thermostat(&self, name: &str) -> Option<Thermostat> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        self.store
            .devices()
            .into_iter()
            .filter(|d| d.is_thermostat())
            .find(|d| {
                d.id().as_str().eq_ignore_ascii_case(name)
                    || d.id().short().eq_ignore_ascii_case(name)
                    || d.custom_name().is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .map(|d| Thermostat::new(d.id().clone(), self.store.clone()))
    }

    /// Returns a facade for every known thermostat, ordered by id.
    #[must_use]
    pub fn thermostats(&self) -> Vec<Thermostat> {
        let mut ids: Vec<DeviceId> = self
            .store
            .devices()
            .into_iter()
            .filter(|d| d.is_thermostat())
            .map(|d| d.id().clone())
            .collect();
        ids.sort();
        ids.into_iter()
            .map(|id| Thermostat::new(id, self.store.clone()))
            .collect()
    }

    /// Returns a ticker over the store using the configured poll interval.
    #[must_use]
    pub fn ticker(&self, target: watch::Receiver<Option<DeviceId>>) -> Ticker {
        Ticker::new(self.store.clone(), target).with_period(self.config.poll_interval())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the shared device store.
    #[must_use]
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    /// Returns the command gateway.
    #[must_use]
    pub fn commands(&self) -> &CommandGateway<A> {
        &self.commands
    }

    /// Returns the token manager.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenManager<A>> {
        &self.tokens
    }

    /// Returns the listener push transports deliver events to.
    #[must_use]
    pub fn listener(&self) -> &PushListener {
        &self.listener
    }
}

impl<A, P> fmt::Debug for Client<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("devices", &self.store.len())
            .finish_non_exhaustive()
    }
}
