// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access token lifecycle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AuthError;
use crate::protocol::{ClientCredentials, RemoteApi, TokenGrant};

/// Smallest safety margin accepted; smaller values are raised to it.
pub const MIN_SAFETY_MARGIN: Duration = Duration::from_secs(10);

/// Longest access token lifetime honoured; longer grants are cut to it.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Callback receiving a refresh token that must be persisted.
pub type SaveRefreshToken = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct TokenState {
    access_token: Option<String>,
    expires_at: Option<Instant>,
    refresh_token: Option<String>,
    scopes: Vec<String>,
}

impl TokenState {
    fn usable(&self, margin: Duration) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        let expires_at = self.expires_at?;
        Instant::now()
            .checked_add(margin)
            .is_some_and(|deadline| deadline < expires_at)
            .then_some(token)
    }
}

/// Owner of the OAuth token pair.
///
/// [`ensure_valid_token`](Self::ensure_valid_token) is called before every
/// authenticated request. An access token is handed out only while
/// `now < expiry - safety_margin`; past that point one caller refreshes it
/// while concurrent callers wait on the same lock and reuse the result.
///
/// Refresh failures are returned as [`AuthError`] and never retried here.
pub struct TokenManager<A> {
    api: Arc<A>,
    credentials: ClientCredentials,
    safety_margin: Duration,
    state: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
    save_refresh_token: Option<SaveRefreshToken>,
}

impl<A: RemoteApi> TokenManager<A> {
    /// Creates a manager with no tokens; it must be authorized with
    /// [`complete_authorization`](Self::complete_authorization) or
    /// [`set_refresh_token`](Self::set_refresh_token) before use.
    #[must_use]
    pub fn new(api: Arc<A>, credentials: ClientCredentials) -> Self {
        Self {
            api,
            credentials,
            safety_margin: MIN_SAFETY_MARGIN,
            state: RwLock::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
            save_refresh_token: None,
        }
    }

    /// Sets the safety margin subtracted from the reported expiry.
    ///
    /// Values below [`MIN_SAFETY_MARGIN`] are raised to it.
    #[must_use]
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin.max(MIN_SAFETY_MARGIN);
        self
    }

    /// Sets the callback that persists refresh tokens.
    #[must_use]
    pub fn with_save_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.save_refresh_token = Some(Arc::new(callback));
        self
    }

    /// Installs a previously persisted refresh token and its scopes.
    ///
    /// No access token is held afterwards, so the next
    /// [`ensure_valid_token`](Self::ensure_valid_token) refreshes.
    pub fn set_refresh_token(&self, refresh_token: impl Into<String>, scopes: Vec<String>) {
        let mut state = self.state.write();
        state.refresh_token = Some(refresh_token.into());
        state.scopes = scopes;
        state.access_token = None;
        state.expires_at = None;
    }

    /// Returns the safety margin in use.
    #[must_use]
    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    /// Returns `true` once a refresh token is held.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.state.read().refresh_token.is_some()
    }

    /// Returns the granted scopes.
    #[must_use]
    pub fn scopes(&self) -> Vec<String> {
        self.state.read().scopes.clone()
    }

    /// Returns the reported expiry of the current access token.
    #[must_use]
    pub fn expires_at(&self) -> Option<Instant> {
        self.state.read().expires_at
    }

    /// Returns the access token without refreshing, if it is still usable.
    #[must_use]
    pub fn cached_token(&self) -> Option<String> {
        self.state
            .read()
            .usable(self.safety_margin)
            .map(str::to_owned)
    }

    /// Returns a usable access token, refreshing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthorized` when no refresh token is held and
    /// `AuthError::RefreshFailed` when the refresh exchange fails.
    pub async fn ensure_valid_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        let refresh_token = self
            .state
            .read()
            .refresh_token
            .clone()
            .ok_or(AuthError::NotAuthorized)?;

        tracing::debug!("Refreshing access token");

        let grant = self
            .api
            .refresh_access_token(&self.credentials, &refresh_token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Access token refresh failed");
                AuthError::RefreshFailed(e.to_string())
            })?;

        let rotated = grant
            .refresh_token
            .clone()
            .filter(|new_token| *new_token != refresh_token);
        let access_token = self.install(grant, rotated.clone());

        if let Some(new_token) = rotated {
            tracing::info!("Refresh token rotated");
            self.persist(&new_token);
        }

        tracing::info!("Access token refreshed");
        Ok(access_token)
    }

    /// Exchanges an authorization code and installs the resulting tokens.
    ///
    /// The refresh token is handed to the save callback and returned.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ExchangeFailed` if the exchange fails or the
    /// response carries no refresh token.
    pub async fn complete_authorization(
        &self,
        code: &str,
        redirect_uri: &str,
        scopes: Vec<String>,
    ) -> Result<String, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        let grant = self
            .api
            .exchange_auth_code(&self.credentials, code, redirect_uri)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Authorization code exchange failed");
                AuthError::ExchangeFailed(e.to_string())
            })?;

        let refresh_token = grant
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::ExchangeFailed("response has no refresh token".into()))?;

        self.state.write().scopes = scopes;
        self.install(grant, Some(refresh_token.clone()));
        self.persist(&refresh_token);

        tracing::info!("Authorization completed");
        Ok(refresh_token)
    }

    fn install(&self, grant: TokenGrant, refresh_token: Option<String>) -> String {
        if grant.expires_in > MAX_TOKEN_LIFETIME {
            tracing::warn!(
                expires_in = grant.expires_in.as_secs(),
                "Token lifetime exceeds maximum, clamping"
            );
        }
        let lifetime = grant.expires_in.min(MAX_TOKEN_LIFETIME);

        let mut state = self.state.write();
        state.expires_at = Some(Instant::now() + lifetime);
        state.access_token = Some(grant.access_token.clone());
        if let Some(token) = refresh_token {
            state.refresh_token = Some(token);
        }
        if let Some(scope) = grant.scope.filter(|s| !s.is_empty()) {
            state.scopes = scope.split_whitespace().map(str::to_owned).collect();
        }
        grant.access_token
    }

    fn persist(&self, refresh_token: &str) {
        if let Some(save) = &self.save_refresh_token {
            save(refresh_token);
        }
    }
}

impl<A> fmt::Debug for TokenManager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("safety_margin", &self.safety_margin)
            .field("has_access_token", &state.access_token.is_some())
            .field("has_refresh_token", &state.refresh_token.is_some())
            .field("scopes", &state.scopes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DeviceCommand;
    use crate::error::{Error, ProtocolError};
    use crate::state::Device;
    use crate::types::DeviceId;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fake OAuth endpoint issuing numbered tokens.
    #[derive(Default)]
    struct FakeOAuth {
        refreshes: AtomicU32,
        fail: std::sync::atomic::AtomicBool,
        rotate_to: parking_lot::Mutex<Option<String>>,
        delay: Option<Duration>,
        expires_in: Option<Duration>,
    }

    impl RemoteApi for FakeOAuth {
        async fn fetch_devices(&self, _: &str, _: &str) -> Result<Vec<Device>, Error> {
            Ok(Vec::new())
        }

        async fn execute_command(
            &self,
            _: &DeviceId,
            _: &str,
            _: &DeviceCommand,
        ) -> Result<bool, Error> {
            Ok(true)
        }

        async fn exchange_auth_code(
            &self,
            _: &ClientCredentials,
            code: &str,
            _: &str,
        ) -> Result<TokenGrant, Error> {
            Ok(TokenGrant {
                access_token: format!("access-{code}"),
                refresh_token: Some(format!("refresh-{code}")),
                expires_in: Duration::from_secs(3600),
                scope: None,
            })
        }

        async fn refresh_access_token(
            &self,
            _: &ClientCredentials,
            _: &str,
        ) -> Result<TokenGrant, Error> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProtocolError::Status {
                    status: 400,
                    body: "invalid_grant".to_string(),
                }
                .into());
            }
            Ok(TokenGrant {
                access_token: format!("access-{n}"),
                refresh_token: self.rotate_to.lock().clone(),
                expires_in: self.expires_in.unwrap_or(Duration::from_secs(3600)),
                scope: Some("scope-a scope-b".to_string()),
            })
        }
    }

    fn manager(api: FakeOAuth) -> (Arc<FakeOAuth>, TokenManager<FakeOAuth>) {
        let api = Arc::new(api);
        let manager = TokenManager::new(api.clone(), ClientCredentials::new("id", "secret"));
        manager.set_refresh_token("refresh-0", vec![]);
        (api, manager)
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_refreshes_then_caches() {
        let (api, manager) = manager(FakeOAuth::default());

        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-1");
        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-1");
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(manager.scopes(), vec!["scope-a", "scope-b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_once_safety_margin_is_reached() {
        let (api, manager) = manager(FakeOAuth::default());
        manager.ensure_valid_token().await.unwrap();

        // expiry 3600s, margin 10s: still usable at 3589s
        tokio::time::advance(Duration::from_secs(3589)).await;
        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-1");
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-2");
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_refresh() {
        let (api, manager) = manager(FakeOAuth {
            delay: Some(Duration::from_millis(200)),
            ..FakeOAuth::default()
        });

        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.ensure_valid_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "access-1");
        }
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_failure_is_auth_error() {
        let api = FakeOAuth::default();
        api.fail.store(true, Ordering::SeqCst);
        let (api, manager) = manager(api);

        let err = manager.ensure_valid_token().await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshFailed(_)));

        // Not retried internally
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthorized_without_refresh_token() {
        let manager = TokenManager::new(
            Arc::new(FakeOAuth::default()),
            ClientCredentials::new("id", "secret"),
        );
        assert_eq!(
            manager.ensure_valid_token().await,
            Err(AuthError::NotAuthorized)
        );
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_saved() {
        let saved = Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
        let sink = saved.clone();
        let api = FakeOAuth::default();
        *api.rotate_to.lock() = Some("refresh-rotated".to_string());
        let (_, manager) = manager(api);
        let manager = manager.with_save_callback(move |t| sink.lock().push(t.to_string()));

        manager.ensure_valid_token().await.unwrap();

        assert_eq!(*saved.lock(), vec!["refresh-rotated".to_string()]);
    }

    #[tokio::test]
    async fn unchanged_refresh_token_is_not_saved() {
        let saved = Arc::new(AtomicU32::new(0));
        let counter = saved.clone();
        let api = FakeOAuth::default();
        *api.rotate_to.lock() = Some("refresh-0".to_string());
        let (_, manager) = manager(api);
        let manager = manager.with_save_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.ensure_valid_token().await.unwrap();

        assert_eq!(saved.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn authorization_persists_refresh_token() {
        let saved = Arc::new(parking_lot::Mutex::new(None::<String>));
        let sink = saved.clone();
        let api = Arc::new(FakeOAuth::default());
        let manager = TokenManager::new(api.clone(), ClientCredentials::new("id", "secret"))
            .with_save_callback(move |t| *sink.lock() = Some(t.to_string()));

        let refresh = manager
            .complete_authorization("code1", "http://localhost/cb", vec!["s".into()])
            .await
            .unwrap();

        assert_eq!(refresh, "refresh-code1");
        assert_eq!(saved.lock().as_deref(), Some("refresh-code1"));
        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-code1");
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_lifetime_is_clamped() {
        let (api, manager) = manager(FakeOAuth {
            expires_in: Some(Duration::from_secs(u64::MAX)),
            ..FakeOAuth::default()
        });

        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-1");
        let remaining = manager.expires_at().unwrap() - Instant::now();
        assert_eq!(remaining, MAX_TOKEN_LIFETIME);

        tokio::time::advance(MAX_TOKEN_LIFETIME).await;
        assert_eq!(manager.ensure_valid_token().await.unwrap(), "access-2");
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_safety_margin_never_hands_out_token() {
        let (api, manager) = manager(FakeOAuth::default());
        let manager = manager.with_safety_margin(Duration::MAX);

        assert!(manager.ensure_valid_token().await.is_ok());
        assert!(manager.cached_token().is_none());
        assert_eq!(api.refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn safety_margin_is_clamped() {
        let manager = TokenManager::new(
            Arc::new(FakeOAuth::default()),
            ClientCredentials::new("id", "secret"),
        )
        .with_safety_margin(Duration::from_secs(1));
        assert_eq!(manager.safety_margin(), MIN_SAFETY_MARGIN);
    }

    #[test]
    fn debug_hides_tokens() {
        let (_, manager) = manager(FakeOAuth::default());
        let debug = format!("{manager:?}");
        assert!(!debug.contains("refresh-0"));
        assert!(debug.contains("has_refresh_token: true"));
    }
}
