// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `PetKit` library.
//!
//! This module provides a comprehensive error hierarchy for handling failures
//! across the library: cloud client failures, refresh classification
//! (authentication versus transient), and media cache operations.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when coordinating
/// PetKit devices.
#[derive(Debug, Error)]
pub enum Error {
    /// Error raised by the cloud client.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Error occurred during a device-state refresh.
    #[error("refresh error: {0}")]
    Refresh(#[from] RefreshError),

    /// Error occurred during a media cache operation.
    #[error("media error: {0}")]
    Media(#[from] MediaError),

    /// Device was not found in the current device snapshot.
    #[error("device not found")]
    DeviceNotFound,

    /// The entity descriptor has no write action.
    #[error("entity is read-only")]
    ReadOnlyEntity,
}

/// Errors raised by the external cloud client.
///
/// The first four variants indicate a broken or invalid session and are
/// classified as authentication failures; everything else is a transient
/// library failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The cloud session has expired.
    #[error("session expired")]
    SessionExpired,

    /// The cloud session is invalid.
    #[error("session error: {0}")]
    Session(String),

    /// The account email is not registered with the cloud service.
    #[error("unregistered account: {0}")]
    UnregisteredAccount(String),

    /// No regional API server could be resolved for the account.
    #[error("regional server not found: {0}")]
    RegionNotFound(String),

    /// Any other error raised by the client library.
    #[error("library error: {0}")]
    Library(String),
}

impl ClientError {
    /// Returns true if this error requires re-authentication rather than
    /// a simple retry.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired
                | Self::Session(_)
                | Self::UnregisteredAccount(_)
                | Self::RegionNotFound(_)
        )
    }
}

/// Errors surfaced by a device-state refresh cycle.
///
/// The host reacts differently to the two variants: an authentication
/// failure triggers a re-authentication flow, while a transient update
/// failure is retried on the normal schedule with the previous device
/// snapshot left visible.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The session is no longer valid; the host must re-authenticate.
    #[error("authentication required: {0}")]
    AuthRequired(#[source] ClientError),

    /// The fetch failed for a transient reason.
    #[error("update failed: {0}")]
    UpdateFailed(#[source] ClientError),
}

impl RefreshError {
    /// Classifies a client error into the refresh taxonomy.
    #[must_use]
    pub fn classify(error: ClientError) -> Self {
        if error.is_auth_failure() {
            Self::AuthRequired(error)
        } else {
            Self::UpdateFailed(error)
        }
    }

    /// Returns true if this is an authentication failure.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired(_))
    }
}

/// Errors related to the on-disk media cache.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A media download failed.
    #[error("download failed for {key}: {message}")]
    Download {
        /// The media record key (device id + event type + timestamp).
        key: String,
        /// Description of the failure.
        message: String,
    },

    /// A date-named directory could not be parsed as `YYYYMMDD`.
    #[error("invalid date directory name: {0}")]
    InvalidDateDir(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_classification() {
        assert!(ClientError::SessionExpired.is_auth_failure());
        assert!(ClientError::Session("bad token".into()).is_auth_failure());
        assert!(ClientError::UnregisteredAccount("a@b.c".into()).is_auth_failure());
        assert!(ClientError::RegionNotFound("XX".into()).is_auth_failure());
        assert!(!ClientError::Library("timeout".into()).is_auth_failure());
    }

    #[test]
    fn refresh_error_classify() {
        let auth = RefreshError::classify(ClientError::SessionExpired);
        assert!(auth.is_auth());

        let transient = RefreshError::classify(ClientError::Library("boom".into()));
        assert!(!transient.is_auth());
        assert!(matches!(transient, RefreshError::UpdateFailed(_)));
    }

    #[test]
    fn client_error_display() {
        let err = ClientError::RegionNotFound("FR".to_string());
        assert_eq!(err.to_string(), "regional server not found: FR");
    }

    #[test]
    fn refresh_error_display() {
        let err = RefreshError::AuthRequired(ClientError::SessionExpired);
        assert_eq!(err.to_string(), "authentication required: session expired");
    }

    #[test]
    fn error_from_client_error() {
        let err: Error = ClientError::SessionExpired.into();
        assert!(matches!(err, Error::Client(ClientError::SessionExpired)));
    }

    #[test]
    fn media_error_display() {
        let err = MediaError::InvalidDateDir("notadate".to_string());
        assert_eq!(err.to_string(), "invalid date directory name: notadate");
    }
}
