// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Nestor` Lib - A Rust library to keep Nest thermostats in sync.
//!
//! This library mirrors the thermostats of a Google Device Access project
//! through the Smart Device Management (SDM) API and keeps that mirror
//! current from command results and push events.
//!
//! # Components
//!
//! - **Token management**: [`TokenManager`] refreshes the OAuth access token
//!   before it expires, with at most one refresh in flight
//! - **Device snapshots**: [`DeviceStore`] holds the last known traits of
//!   every device and notifies observers when one changes
//! - **Commands**: [`CommandGateway`] sets modes and setpoints and applies
//!   accepted changes to the store right away
//! - **Push updates**: [`PushListener`] merges push events into the store
//! - **Facades**: [`Thermostat`] gives typed, display-ready values for one
//!   device; [`Ticker`] refreshes a display periodically
//!
//! # Quick Start
//!
//! ## Onboarding
//!
//! ```no_run
//! use nestor_lib::{Client, ClientConfig};
//! use nestor_lib::push::NoPush;
//!
//! #[tokio::main]
//! async fn main() -> nestor_lib::Result<()> {
//!     let config = ClientConfig::new("client-id", "client-secret", "project-uuid");
//!     let client = Client::http(config, NoPush, |refresh_token| {
//!         // Persist the refresh token somewhere safe
//!         let _ = refresh_token;
//!     })?;
//!
//!     println!("Open {}", client.account_link_url("https://localhost/callback"));
//!     // ...the redirect delivers `code` and `scope`
//!     let _refresh_token = client.finish_setup("code", "scope").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Reading and adjusting a thermostat
//!
//! ```no_run
//! use nestor_lib::{Client, ClientConfig, StoredCredentials, ThermostatMode};
//! use nestor_lib::push::NoPush;
//!
//! #[tokio::main]
//! async fn main() -> nestor_lib::Result<()> {
//!     let config = ClientConfig::new("client-id", "client-secret", "project-uuid");
//!     let stored = StoredCredentials::new("1//refresh-token", vec![]);
//!     let client = Client::resume_http(config, stored, NoPush, |_| {}).await?;
//!
//!     let mut hallway = client.thermostat("Hallway").expect("no such thermostat");
//!     hallway.on_change(|id| println!("{id} changed"));
//!
//!     if hallway.mode() == Some(ThermostatMode::Heat) {
//!         // One degree warmer, in the scale the thermostat displays
//!         let accepted = client.commands().set_temperature_delta(hallway.id(), 1).await?;
//!         println!("accepted: {accepted}, now {:?}", hallway.setpoint());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Only token failures are returned as errors from commands and listing
//! refreshes. A refused command, a network failure while sending one, or a
//! command that does not apply in the current mode yields `Ok(false)`.

pub mod auth;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod push;
pub mod state;
pub mod subscription;
pub mod thermostat;
pub mod types;

pub use auth::TokenManager;
pub use client::Client;
pub use command::{CommandGateway, DeviceCommand};
pub use config::{ClientConfig, StoredCredentials};
pub use error::{AuthError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{DeviceEvent, EventBus};
#[cfg(feature = "http")]
pub use protocol::SdmHttpClient;
pub use protocol::{ClientCredentials, RemoteApi, TokenGrant};
pub use push::{DeviceChangeEvent, PushListener, PushTransport};
pub use state::{Device, DeviceStore, TraitCategory, TraitPayload};
pub use subscription::{Subscription, SubscriptionId};
pub use thermostat::{Thermostat, ThermostatView, Ticker, TickerHandle};
pub use types::{DeviceId, TemperatureScale, ThermostatMode};
