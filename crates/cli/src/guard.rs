//! Protected-view gating
//!
//! A guard evaluation publishes exactly three states: `Loading` while the
//! session is checked, then `Authorized` or `Unauthorized` with the view to
//! redirect to. Errors during the check never grant access.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use biocloud_common::{Error, Route, Session};

use crate::client::ApiClient;
use crate::transport::HttpMethod;

/// How a stored session is judged valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GuardPolicy {
    /// A stored token is enough
    TokenPresence,
    /// The token must also be accepted by the backend
    #[default]
    ServerValidation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardState {
    Loading,
    Authorized { session: Option<Session> },
    Unauthorized { redirect: Route },
}

impl GuardState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, GuardState::Loading)
    }
}

pub struct RouteGuard {
    api: ApiClient,
    policy: GuardPolicy,
    validation_path: String,
    state: watch::Sender<GuardState>,
}

impl RouteGuard {
    pub fn new(api: ApiClient, policy: GuardPolicy, validation_path: impl Into<String>) -> Self {
        let (state, _) = watch::channel(GuardState::Loading);
        Self {
            api,
            policy,
            validation_path: validation_path.into(),
            state,
        }
    }

    pub fn policy(&self) -> GuardPolicy {
        self.policy
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Decide whether `route` may be shown
    pub async fn evaluate(&self, route: Route) -> GuardState {
        self.state.send_replace(GuardState::Loading);
        let settled = self.decide(route).await;
        debug!(%route, state = ?settled, "Guard settled");
        self.state.send_replace(settled.clone());
        settled
    }

    async fn decide(&self, route: Route) -> GuardState {
        let session = self.api.current_session();
        if !route.is_protected() {
            return GuardState::Authorized { session };
        }
        let Some(session) = session else {
            return GuardState::Unauthorized {
                redirect: Route::Login,
            };
        };

        match self.policy {
            GuardPolicy::TokenPresence => GuardState::Authorized {
                session: Some(session),
            },
            GuardPolicy::ServerValidation => self.validate(session).await,
        }
    }

    async fn validate(&self, session: Session) -> GuardState {
        match self
            .api
            .request(HttpMethod::Get, &self.validation_path, None, true)
            .await
        {
            // The store may have been cleared while the check was in flight
            Ok(_) => match self.api.current_session() {
                Some(current) if current.token == session.token => GuardState::Authorized {
                    session: Some(current),
                },
                _ => GuardState::Unauthorized {
                    redirect: Route::Login,
                },
            },
            Err(Error::SessionExpired) => GuardState::Unauthorized {
                redirect: Route::Login,
            },
            Err(e @ (Error::AuthRejected(_) | Error::RequestFailed { status: 403 | 422, .. })) => {
                warn!(error = %e, "Stored token rejected, clearing session");
                if let Err(e) = self.api.session().clear() {
                    warn!(error = %e, "Failed to clear rejected session");
                }
                GuardState::Unauthorized {
                    redirect: Route::Login,
                }
            }
            Err(e) => {
                warn!(error = %e, "Error validating token");
                GuardState::Unauthorized {
                    redirect: Route::Error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use test_case::test_case;

    use crate::session::{MemorySessionStore, SessionStore};
    use crate::testing::ScriptedTransport;
    use biocloud_common::UserProfile;

    fn guard(
        transport: &Arc<ScriptedTransport>,
        store: &Arc<MemorySessionStore>,
        policy: GuardPolicy,
    ) -> RouteGuard {
        RouteGuard::new(
            ApiClient::new(transport.clone(), store.clone()),
            policy,
            "/user/profile",
        )
    }

    fn logged_in() -> Arc<MemorySessionStore> {
        Arc::new(MemorySessionStore::with_session(Session::new(
            "tok",
            UserProfile::default(),
        )))
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let transport = Arc::new(ScriptedTransport::new());
        let store = logged_in();
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);
        assert_eq!(guard.state(), GuardState::Loading);
        assert!(!guard.state().is_settled());
    }

    #[tokio::test]
    async fn test_public_route_never_validates() {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(MemorySessionStore::new());
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);

        let state = guard.evaluate(Route::Home).await;
        assert_eq!(state, GuardState::Authorized { session: None });
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_no_token_redirects_to_login() {
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(MemorySessionStore::new());
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);

        let state = guard.evaluate(Route::Dashboard).await;
        assert_eq!(state, GuardState::Unauthorized { redirect: Route::Login });
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_token_presence_policy_skips_round_trip() {
        let transport = Arc::new(ScriptedTransport::new());
        let store = logged_in();
        let guard = guard(&transport, &store, GuardPolicy::TokenPresence);

        assert!(matches!(
            guard.evaluate(Route::Blast).await,
            GuardState::Authorized { session: Some(_) }
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_server_accepts_token() {
        let transport = Arc::new(ScriptedTransport::new().reply(200, json!({"email": "a@b.c"})));
        let store = logged_in();
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);

        let mut rx = guard.subscribe();
        let state = guard.evaluate(Route::Dashboard).await;
        assert!(matches!(state, GuardState::Authorized { session: Some(_) }));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), state);
        assert_eq!(transport.requests()[0].path, "/user/profile");
    }

    #[tokio::test]
    async fn test_expired_token_redirects_to_login() {
        let transport = Arc::new(ScriptedTransport::new().reply(401, json!({"msg": "Token has expired"})));
        let store = logged_in();
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);

        let state = guard.evaluate(Route::Profile).await;
        assert_eq!(state, GuardState::Unauthorized { redirect: Route::Login });
        assert!(store.read().is_none());
    }

    #[test_case(401, json!({"msg": "Signature verification failed"}) ; "invalid signature")]
    #[test_case(422, json!({"msg": "Not enough segments"}) ; "malformed token")]
    #[tokio::test]
    async fn test_rejected_token_clears_session(status: u16, body: serde_json::Value) {
        let transport = Arc::new(ScriptedTransport::new().reply(status, body));
        let store = logged_in();
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);

        let state = guard.evaluate(Route::Credits).await;
        assert_eq!(state, GuardState::Unauthorized { redirect: Route::Login });
        assert!(store.read().is_none());
    }

    #[tokio::test]
    async fn test_network_error_fails_closed() {
        let transport = Arc::new(ScriptedTransport::new().fail("connection reset"));
        let store = logged_in();
        let guard = guard(&transport, &store, GuardPolicy::ServerValidation);

        let state = guard.evaluate(Route::Dashboard).await;
        assert_eq!(state, GuardState::Unauthorized { redirect: Route::Error });
        // The session itself is left alone
        assert!(store.read().is_some());
    }
}
