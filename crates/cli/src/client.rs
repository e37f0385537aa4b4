//! Backend API client
//!
//! Attaches the bearer token, turns non-2xx responses into errors and
//! handles token expiry centrally: a 401 that says the token expired clears
//! the session store *before* the error reaches the caller. Any other 401 is
//! a rejection of the credentials or token.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use biocloud_common::{Error, Result, Session};

use crate::session::SessionContext;
use crate::transport::{ApiRequest, HttpMethod, Transport};

/// Client for the BioCloudLabs REST backend
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionContext) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.read()
    }

    /// Send a request and return the JSON body of a 2xx response
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Value> {
        let bearer = if authenticated {
            Some(self.session.read().ok_or(Error::NotAuthenticated)?.token)
        } else {
            None
        };

        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
            bearer,
        };

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        debug!(%method, path, status = response.status, "API response");

        if response.is_success() {
            return Ok(response.body);
        }

        let message = server_message(&response.body).unwrap_or_default();
        if is_expiry_signal(response.status, &message) {
            warn!(path, "Token expired, clearing session");
            if let Err(e) = self.session.clear() {
                warn!(error = %e, "Failed to clear expired session");
            }
            return Err(Error::SessionExpired);
        }
        if response.status == 401 {
            return Err(Error::AuthRejected(message));
        }

        Err(Error::RequestFailed {
            status: response.status,
            message,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, authenticated: bool) -> Result<T> {
        let value = self.request(HttpMethod::Get, path, None, authenticated).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn send_json<B, T>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        authenticated: bool,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.request(method, path, Some(body), authenticated).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Error text from a response body: `message`, then `msg`, then `error`
pub fn server_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["message", "msg", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    }
}

/// A 401 whose message mentions expiry
pub fn is_expiry_signal(status: u16, message: &str) -> bool {
    status == 401 && message.to_ascii_lowercase().contains("expired")
}
