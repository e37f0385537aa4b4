//! Error types for the BioCloudLabs client

use thiserror::Error;

use crate::route::Route;
use crate::validation::ValidationErrors;

/// Result type alias using the client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Client error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected before any request was sent
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    AuthRejected(String),

    /// The bearer token is no longer valid. The session store has already
    /// been cleared when this is returned.
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    #[error("You are not logged in.")]
    NotAuthenticated,

    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not enough credits: balance {balance}, required {cost}")]
    InsufficientCredits { balance: i64, cost: i64 },

    #[error("A {0} request is already in progress")]
    AlreadyPending(&'static str),

    #[error("Operation timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Where the caller should navigate after this error, if anywhere
    pub fn redirect(&self) -> Option<Route> {
        match self {
            Error::SessionExpired | Error::NotAuthenticated => Some(Route::Login),
            _ => None,
        }
    }

    /// Short text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::RequestFailed { message, .. } | Error::AuthRejected(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            Error::AuthRejected(_) => "Authentication failed. Please log in again.".to_string(),
            Error::RequestFailed { .. } | Error::Network(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
            Error::InsufficientCredits { .. } => {
                "You don't have enough credits to launch this virtual machine.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for failures the server reported as a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::RequestFailed { status, .. } if (400..500).contains(status))
            || matches!(self, Error::AuthRejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_session_redirects_to_login() {
        assert_eq!(Error::SessionExpired.redirect(), Some(Route::Login));
        assert_eq!(Error::Network("down".into()).redirect(), None);
    }

    #[test]
    fn test_rejection_message() {
        let err = Error::AuthRejected("Invalid credentials.".into());
        assert_eq!(err.user_message(), "Invalid credentials.");
        assert!(err.is_client_error());
        assert_eq!(
            Error::AuthRejected(String::new()).user_message(),
            "Authentication failed. Please log in again."
        );
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = Error::RequestFailed {
            status: 409,
            message: "Username already exists.".into(),
        };
        assert_eq!(err.user_message(), "Username already exists.");
        assert!(err.is_client_error());

        let err = Error::RequestFailed {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Something went wrong. Please try again later.");
        assert!(!err.is_client_error());
    }
}
