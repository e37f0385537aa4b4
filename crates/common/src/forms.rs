//! User-facing forms and their checks

use serde::Serialize;
use validator::Validate;

use crate::validation::{required, validate_password, ValidationErrors};

/// Credentials submitted on login
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        self.validate().map_err(ValidationErrors::from)
    }
}

/// New account details
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Registration {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    #[validate(range(min = 1, message = "Please select a location."))]
    pub location_id: i64,
}

/// Blank-field reasons for name and surname; whitespace counts as blank
fn required_names(name: &str, surname: &str) -> Vec<String> {
    [required(name, "Name"), required(surname, "Surname")]
        .into_iter()
        .flatten()
        .collect()
}

impl Registration {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut reasons = required_names(&self.name, &self.surname);
        if let Err(e) = self.validate() {
            reasons.extend(ValidationErrors::from(e).reasons().iter().cloned());
        }
        if let Err(e) = validate_password(&self.password) {
            reasons.extend(e.reasons().iter().cloned());
        }
        ValidationErrors::collect(reasons)
    }
}

/// Profile fields the user may edit
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ProfileUpdate {
    pub name: String,
    pub surname: String,
    /// Empty keeps the current password
    pub password: String,
    #[validate(range(min = 1, message = "Please select a location."))]
    pub location_id: i64,
}

impl ProfileUpdate {
    pub fn changes_password(&self) -> bool {
        !self.password.trim().is_empty()
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut reasons = required_names(&self.name, &self.surname);
        if let Err(e) = self.validate() {
            reasons.extend(ValidationErrors::from(e).reasons().iter().cloned());
        }
        if self.changes_password() {
            if let Err(e) = validate_password(self.password.trim()) {
                reasons.extend(e.reasons().iter().cloned());
            }
        }
        ValidationErrors::collect(reasons)
    }
}

/// Password change for a logged-in user
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

impl PasswordChange {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut reasons: Vec<String> = [
            required(&self.old_password, "Current password"),
            required(&self.new_password, "New password"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if reasons.is_empty() {
            if let Err(e) = validate_password(&self.new_password) {
                reasons.extend(e.reasons().iter().cloned());
            }
        }
        ValidationErrors::collect(reasons)
    }
}

/// Password reset through an emailed recovery token
#[derive(Debug, Clone, Serialize)]
pub struct PasswordRecovery {
    pub token: String,
    pub new_password: String,
}

pub const MISSING_RECOVERY_TOKEN: &str =
    "No token provided. Please use the link provided in your reset email.";

impl PasswordRecovery {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        if self.token.trim().is_empty() {
            return Err(ValidationErrors::single(MISSING_RECOVERY_TOKEN));
        }
        if let Some(reason) = required(&self.new_password, "New password") {
            return Err(ValidationErrors::single(reason));
        }
        validate_password(&self.new_password)
    }
}

/// Request for a recovery email
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RecoveryRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
}

impl RecoveryRequest {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        if let Some(reason) = required(&self.email, "Email") {
            return Err(ValidationErrors::single(reason));
        }
        self.validate().map_err(ValidationErrors::from)
    }
}
