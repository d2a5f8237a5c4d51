// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push event handling.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::auth::TokenManager;
use crate::error::Result;
use crate::protocol::RemoteApi;
use crate::state::DeviceStore;

use super::DeviceChangeEvent;

/// Outcome of handling one push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The update was merged into a known device.
    Merged,
    /// The device is not tracked; nothing changed.
    UnknownDevice,
    /// The event could not be parsed and was dropped.
    Dropped,
}

/// Applies push events to the device store.
///
/// Handling never fails: a malformed event is logged and dropped so that one
/// bad message cannot end the subscription. The listener is cheap to clone
/// and can be handed to a transport.
#[derive(Debug, Clone)]
pub struct PushListener {
    store: Arc<DeviceStore>,
}

impl PushListener {
    /// Creates a listener writing into `store`.
    #[must_use]
    pub fn new(store: Arc<DeviceStore>) -> Self {
        Self { store }
    }

    /// Merges one event into the store.
    pub fn handle_event(&self, event: &DeviceChangeEvent) -> HandleOutcome {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    device_id = %event.device_id,
                    category = %event.category,
                    error = %e,
                    "Dropping malformed push event"
                );
                return HandleOutcome::Dropped;
            }
        };

        if self.store.merge_partial(&event.device_id, payload) {
            HandleOutcome::Merged
        } else {
            HandleOutcome::UnknownDevice
        }
    }

    /// Handles events from `events` until every sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<DeviceChangeEvent>) {
        tracing::debug!("Push listener started");
        while let Some(event) = events.recv().await {
            self.handle_event(&event);
        }
        tracing::debug!("Push listener stopped");
    }
}

/// A subscription transport delivering [`DeviceChangeEvent`]s.
///
/// Implementations own reconnection and backoff. They deliver each event by
/// calling [`PushListener::handle_event`], or by feeding a channel consumed
/// by [`PushListener::run`].
pub trait PushTransport: Send + Sync {
    /// Establishes the subscription.
    ///
    /// Returning `Ok` means the subscription was requested; events may start
    /// arriving later.
    fn start(
        &self,
        scopes: &[String],
        access_token: &str,
        listener: PushListener,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Starts `transport` with a freshly validated access token.
///
/// # Errors
///
/// Returns an auth error if no token can be obtained, or whatever the
/// transport reports.
pub async fn subscribe<A, P>(
    transport: &P,
    tokens: &TokenManager<A>,
    listener: PushListener,
) -> Result<()>
where
    A: RemoteApi,
    P: PushTransport,
{
    let token = tokens.ensure_valid_token().await?;
    let scopes = tokens.scopes();
    transport.start(&scopes, &token, listener).await?;
    tracing::info!("Push subscription started");
    Ok(())
}

/// Transport that never delivers events, for clients that rely on polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPush;

impl PushTransport for NoPush {
    async fn start(&self, _: &[String], _: &str, _: PushListener) -> Result<()> {
        Ok(())
    }
}
