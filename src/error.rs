// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `NestoR` library.
//!
//! Only [`AuthError`] is meant to reach callers of the command and listing
//! operations as a hard failure. Transport failures of a single command or
//! listing fetch are logged and reported as a `false` result instead, and
//! push updates for unknown devices are dropped silently.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Obtaining or refreshing OAuth credentials failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response or push payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),
}

/// Errors raised while obtaining or refreshing the access token.
///
/// These are never retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The client has no refresh token yet; onboarding has not completed.
    #[error("client is not authorized yet")]
    NotAuthorized,

    /// Exchanging the refresh token for a new access token failed.
    #[error("failed to refresh access token: {0}")]
    RefreshFailed(String),

    /// Exchanging the authorization code failed.
    #[error("failed to exchange authorization code: {0}")]
    ExchangeFailed(String),
}

/// Errors related to the remote transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote side answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to parsing API responses and push payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing.
    #[error("missing field: {0}")]
    MissingField(String),

    /// The trait category is not one this library understands.
    #[error("unknown trait category: {0}")]
    UnknownTrait(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An unknown thermostat mode string was provided.
    #[error("invalid thermostat mode: {0}")]
    InvalidMode(String),

    /// An unknown temperature scale string was provided.
    #[error("invalid temperature scale: {0}")]
    InvalidScale(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
