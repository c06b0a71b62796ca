//! REST client for the Hoarding Manager backend.
//!
//! # Architecture
//!
//! - Bearer token from the shared [`SessionStore`](crate::session::SessionStore)
//!   on every request
//! - On a 401 the access token is refreshed once and the request retried once
//! - Concurrent 401s share one refresh
//! - A failed refresh tears the session down and redirects to the login page
//!   through the injected [`Navigator`](crate::routes::Navigator)

mod auth;
mod client;

pub use auth::LoginRequest;
pub use client::{ApiClient, ApiClientBuilder};

use hoarding_core::envelope::envelope_message;
use serde_json::Value;
use thiserror::Error;

use crate::forms::ValidationErrors;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: DNS, connection refused, reset, TLS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request path did not form a valid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// 401 that could not be resolved with a refresh.
    #[error("Unauthorized")]
    Unauthorized {
        /// Response body, when it was JSON.
        body: Option<Value>,
    },

    /// The refresh token was rejected; the session has been cleared.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// Any other non-success status.
    #[error("HTTP {status}")]
    Status {
        status: u16,
        /// Response body, when it was JSON.
        body: Option<Value>,
    },

    /// The signed-in role may not perform this action.
    #[error("Not permitted: {0}")]
    Forbidden(String),

    /// Form input failed validation; nothing was sent.
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    /// A required response field was missing or malformed.
    #[error("Unexpected response: {0}")]
    Malformed(String),

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No session; sign in first.
    #[error("Not signed in")]
    NotAuthenticated,
}

/// Broad failure categories used to decide how a page reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure. Degrade to an empty state and toast.
    Network,
    /// Unresolved 401 or missing session. Sign in again.
    Authentication,
    /// Role lacks permission, locally or per the backend.
    Authorization,
    /// Input rejected before or by the backend.
    Validation,
    /// Response could not be understood. Degrade and toast.
    Malformed,
    /// Any other backend failure.
    Server,
}

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Url(_) => ErrorKind::Network,
            Self::Unauthorized { .. } | Self::SessionExpired | Self::NotAuthenticated => {
                ErrorKind::Authentication
            }
            Self::Forbidden(_) | Self::Status { status: 403, .. } => ErrorKind::Authorization,
            Self::Validation(_) | Self::Status { status: 400 | 422, .. } => ErrorKind::Validation,
            Self::Malformed(_) | Self::Parse(_) => ErrorKind::Malformed,
            Self::Status { .. } => ErrorKind::Server,
        }
    }

    /// HTTP status, when the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body, when the backend answered with JSON.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Unauthorized { body } | Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Text for an error toast, preferring the backend's own message.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.body()
            .and_then(envelope_message)
            .unwrap_or_else(|| self.to_string())
    }
}
