//! Authentication lifecycle
//!
//! Login, logout, registration and the password flows. Every operation
//! validates its input before building a request. Server and network
//! failures come back as user-facing copy; only an expired or missing
//! session is returned as an error, for the caller to handle centrally.

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use biocloud_common::forms::{
    LoginForm, PasswordChange, PasswordRecovery, ProfileUpdate, Registration, RecoveryRequest,
};
use biocloud_common::{Error, Location, LoginResponse, Result, Route, Session, UserProfile};

use crate::client::ApiClient;
use crate::pending::InFlight;
use crate::transport::HttpMethod;

pub const LOGIN_REJECTED: &str = "Failed to log in. Please check your credentials and try again.";
pub const LOGIN_ERRORED: &str = "Login failed due to an error.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again later.";
pub const REGISTERED: &str = "Registration successful! You can now log in.";
pub const PASSWORD_CHANGED: &str =
    "Password changed successfully. Please log in with your new password.";
pub const PASSWORD_CHANGE_FAILED: &str = "Failed to change password.";
pub const RECOVERY_EMAIL_SENT: &str =
    "If your account exists, a reset link is on its way. Please check your email inbox.";
pub const PASSWORD_RESET: &str = "Your password has been successfully reset.";
pub const PASSWORD_RESET_FAILED: &str = "An unknown error occurred. Please try again.";
pub const PROFILE_UPDATED: &str = "Profile updated successfully!";
pub const PROFILE_UPDATED_RELOGIN: &str = "Profile updated successfully! Please log in again.";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile. Please try again.";

/// Progress of the current login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    Submitting,
    Authenticated,
    Rejected,
    Errored,
}

/// Terminal result of a login attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(Session),
    /// The server refused the credentials
    Rejected(String),
    /// Anything else went wrong
    Errored(String),
}

impl LoginOutcome {
    pub fn state(&self) -> LoginState {
        match self {
            LoginOutcome::Authenticated(_) => LoginState::Authenticated,
            LoginOutcome::Rejected(_) => LoginState::Rejected,
            LoginOutcome::Errored(_) => LoginState::Errored,
        }
    }

    pub fn redirect(&self) -> Option<Route> {
        match self {
            LoginOutcome::Authenticated(_) => Some(Route::Dashboard),
            _ => None,
        }
    }
}

/// Result of a form submission that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Done {
        message: String,
        redirect: Option<Route>,
    },
    Failed {
        message: String,
    },
}

impl Submission {
    fn done(message: &str, redirect: Option<Route>) -> Self {
        Submission::Done {
            message: message.to_string(),
            redirect,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Submission::Done { message, .. } | Submission::Failed { message } => message,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Submission::Done { .. })
    }

    pub fn redirect(&self) -> Option<Route> {
        match self {
            Submission::Done { redirect, .. } => *redirect,
            Submission::Failed { .. } => None,
        }
    }
}

/// Turn a request failure into user copy. Session problems are passed on.
fn failure(err: Error, rejected: &str, unexpected: &str) -> Result<Submission> {
    match err {
        Error::SessionExpired | Error::NotAuthenticated => Err(err),
        Error::AuthRejected(message) | Error::RequestFailed { message, .. } => {
            let message = if message.is_empty() {
                rejected.to_string()
            } else {
                message
            };
            Ok(Submission::Failed { message })
        }
        other => {
            error!(error = %other, "Request failed");
            Ok(Submission::Failed {
                message: unexpected.to_string(),
            })
        }
    }
}

#[derive(Deserialize)]
struct LocationList {
    #[serde(default)]
    locations: Vec<Location>,
}

/// Drives the authentication flows against the backend
pub struct AuthController {
    api: ApiClient,
    login_state: Mutex<LoginState>,
    login_flight: InFlight,
}

impl AuthController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            login_state: Mutex::new(LoginState::Idle),
            login_flight: InFlight::new("login"),
        }
    }

    pub fn login_state(&self) -> LoginState {
        *self.login_state.lock()
    }

    /// Where a visitor lands: straight to the dashboard when already logged in
    pub fn landing_route(&self) -> Route {
        if self.api.current_session().is_some() {
            Route::Dashboard
        } else {
            Route::Login
        }
    }

    pub fn current_profile(&self) -> Option<UserProfile> {
        self.api.current_session().map(|s| s.profile)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let form = LoginForm::new(email, password);
        form.check()?;

        let _flight = self.login_flight.begin()?;
        *self.login_state.lock() = LoginState::Submitting;

        let outcome = self.submit_login(&form).await;
        *self.login_state.lock() = outcome.state();
        Ok(outcome)
    }

    async fn submit_login(&self, form: &LoginForm) -> LoginOutcome {
        let response: LoginResponse = match self
            .api
            .send_json(HttpMethod::Post, "/user/login", form, false)
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_client_error() || matches!(e, Error::SessionExpired) => {
                info!(email = %form.email, "Login rejected");
                return LoginOutcome::Rejected(LOGIN_REJECTED.to_string());
            }
            Err(e) => {
                error!(error = %e, "Login error");
                return LoginOutcome::Errored(LOGIN_ERRORED.to_string());
            }
        };

        if response.access_token.is_empty() {
            error!("Login response carried no token");
            return LoginOutcome::Errored(LOGIN_ERRORED.to_string());
        }

        let mut profile = response.profile;
        if profile.email.is_empty() {
            profile.email = form.email.clone();
        }
        let session = Session::new(response.access_token, profile);
        if let Err(e) = self.api.session().save(&session) {
            error!(error = %e, "Cannot store session");
            return LoginOutcome::Errored(LOGIN_ERRORED.to_string());
        }

        info!(email = %form.email, "Logged in");
        LoginOutcome::Authenticated(session)
    }

    /// Forget the session. Navigation is up to the caller.
    pub fn logout(&self) -> Result<()> {
        self.api.session().clear()?;
        *self.login_state.lock() = LoginState::Idle;
        info!("Logged out");
        Ok(())
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: &Registration) -> Result<Submission> {
        registration.check()?;
        let registration = Registration {
            email: registration.email.trim().to_string(),
            name: registration.name.trim().to_string(),
            surname: registration.surname.trim().to_string(),
            ..registration.clone()
        };

        match self
            .api
            .request(
                HttpMethod::Post,
                "/user/register",
                Some(serde_json::to_value(&registration)?),
                false,
            )
            .await
        {
            Ok(_) => {
                info!(email = %registration.email, "Registered");
                Ok(Submission::done(REGISTERED, Some(Route::Login)))
            }
            Err(e) => failure(e, REGISTRATION_FAILED, UNEXPECTED_ERROR),
        }
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<Submission> {
        let change = PasswordChange {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        change.check()?;

        match self
            .api
            .request(
                HttpMethod::Put,
                "/user/password",
                Some(serde_json::to_value(&change)?),
                true,
            )
            .await
        {
            Ok(_) => {
                self.logout()?;
                Ok(Submission::done(PASSWORD_CHANGED, Some(Route::Login)))
            }
            Err(e) => failure(e, PASSWORD_CHANGE_FAILED, PASSWORD_CHANGE_FAILED),
        }
    }

    pub async fn send_recover_email(&self, email: &str) -> Result<Submission> {
        let request = RecoveryRequest {
            email: email.trim().to_string(),
        };
        request.check()?;

        match self
            .api
            .request(
                HttpMethod::Post,
                "/user/forgot-password",
                Some(serde_json::to_value(&request)?),
                false,
            )
            .await
        {
            // Unknown addresses get the same answer as known ones
            Ok(_) | Err(Error::RequestFailed { status: 404, .. }) => {
                Ok(Submission::done(RECOVERY_EMAIL_SENT, None))
            }
            Err(e) => failure(e, UNEXPECTED_ERROR, UNEXPECTED_ERROR),
        }
    }

    /// Whether the server still accepts a recovery token
    pub async fn validate_recovery_token(&self, token: &str) -> Result<bool> {
        if token.trim().is_empty() {
            return Ok(false);
        }
        let path = format!("/user/reset-password/{}", token.trim());
        match self.api.request(HttpMethod::Get, &path, None, false).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_client_error() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn recover_password(&self, new_password: &str, token: &str) -> Result<Submission> {
        let recovery = PasswordRecovery {
            token: token.trim().to_string(),
            new_password: new_password.to_string(),
        };
        recovery.check()?;

        match self
            .api
            .request(
                HttpMethod::Post,
                "/user/reset-password",
                Some(serde_json::to_value(&recovery)?),
                false,
            )
            .await
        {
            Ok(_) => Ok(Submission::done(PASSWORD_RESET, Some(Route::Login))),
            Err(e) => failure(e, PASSWORD_RESET_FAILED, PASSWORD_RESET_FAILED),
        }
    }

    /// Edit the profile and refresh the cached copy. A password change ends
    /// the session.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Submission> {
        update.check()?;
        let session = self.api.current_session().ok_or(Error::NotAuthenticated)?;

        let body = json!({
            "name": update.name.trim(),
            "surname": update.surname.trim(),
            "password": update.password.trim(),
            "location_id": update.location_id,
        });
        let value = match self
            .api
            .request(HttpMethod::Put, "/user/profile", Some(body), true)
            .await
        {
            Ok(value) => value,
            Err(e) => return failure(e, PROFILE_UPDATE_FAILED, PROFILE_UPDATE_FAILED),
        };

        if update.changes_password() {
            self.logout()?;
            return Ok(Submission::done(PROFILE_UPDATED_RELOGIN, Some(Route::Login)));
        }

        let profile = merged_profile(&session.profile, update, value);
        self.api.session().save(&session.with_profile(profile))?;
        Ok(Submission::done(PROFILE_UPDATED, None))
    }

    pub async fn locations(&self) -> Result<Vec<Location>> {
        let list: LocationList = self.api.get("/azuredata/locations", false).await?;
        Ok(list.locations)
    }
}

/// Profile returned by the server, or the local edit applied to the cached one
fn merged_profile(current: &UserProfile, update: &ProfileUpdate, response: Value) -> UserProfile {
    if response.is_object() {
        match serde_json::from_value::<UserProfile>(response) {
            Ok(profile) if !profile.email.is_empty() => return profile,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Unreadable profile in update response"),
        }
    }
    UserProfile {
        name: update.name.trim().to_string(),
        surname: update.surname.trim().to_string(),
        location_id: update.location_id,
        ..current.clone()
    }
}
