//! Client-side input validation
//!
//! Everything here runs before a request is built. A failure carries one
//! reason per broken rule so it can be shown as a bullet list.

use std::fmt;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A rejected form, with one reason per failed field or rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    reasons: Vec<String>,
}

impl ValidationErrors {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn single(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Combine the reasons of several checks; Ok when none failed
    pub fn collect(reasons: Vec<String>) -> Result<(), Self> {
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(Self { reasons })
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reasons.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let reasons = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("The {} field is invalid.", field),
                })
            })
            .collect();
        Self { reasons }
    }
}

/// A single password strength requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Special,
}

impl PasswordRule {
    pub fn message(&self) -> &'static str {
        match self {
            PasswordRule::MinLength => "Password must be at least 8 characters long.",
            PasswordRule::Uppercase => "Password must contain at least one uppercase letter.",
            PasswordRule::Lowercase => "Password must contain at least one lowercase letter.",
            PasswordRule::Special => "Password must contain at least one special character.",
        }
    }

    fn holds(&self, password: &str) -> bool {
        match self {
            PasswordRule::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            PasswordRule::Uppercase => password.chars().any(char::is_uppercase),
            PasswordRule::Lowercase => password.chars().any(char::is_lowercase),
            PasswordRule::Special => password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        }
    }
}

const PASSWORD_RULES: [PasswordRule; 4] = [
    PasswordRule::MinLength,
    PasswordRule::Uppercase,
    PasswordRule::Lowercase,
    PasswordRule::Special,
];

/// Rules the password breaks, in display order
pub fn failed_password_rules(password: &str) -> Vec<PasswordRule> {
    PASSWORD_RULES
        .iter()
        .copied()
        .filter(|rule| !rule.holds(password))
        .collect()
}

/// Check password strength, reporting every failed rule at once
pub fn validate_password(password: &str) -> Result<(), ValidationErrors> {
    ValidationErrors::collect(
        failed_password_rules(password)
            .into_iter()
            .map(|rule| rule.message().to_string())
            .collect(),
    )
}

/// Reason for an empty required field, if it is empty
pub fn required(value: &str, label: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(format!("{} is required.", label))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Abcdef1!" ; "mixed case with symbol")]
    #[test_case("Zz#zzzzz" ; "exactly eight characters")]
    #[test_case("lowerUPPER_" ; "underscore counts as special")]
    #[test_case("Ñandú-pass" ; "non ascii letters")]
    fn test_password_accepted(password: &str) {
        assert!(validate_password(password).is_ok());
    }

    #[test_case("abcdefgh", &[PasswordRule::Uppercase, PasswordRule::Special] ; "lowercase only")]
    #[test_case("Ab1!", &[PasswordRule::MinLength] ; "too short")]
    #[test_case("ABCDEFG!", &[PasswordRule::Lowercase] ; "no lowercase")]
    #[test_case("Abcdefgh1", &[PasswordRule::Special] ; "digits are not special")]
    #[test_case("Abc def gh", &[PasswordRule::Special] ; "spaces are not special")]
    #[test_case("", &[PasswordRule::MinLength, PasswordRule::Uppercase, PasswordRule::Lowercase, PasswordRule::Special] ; "empty")]
    fn test_password_rejected(password: &str, expected: &[PasswordRule]) {
        assert_eq!(failed_password_rules(password), expected);
    }

    #[test]
    fn test_composite_message_splits_into_reasons() {
        let err = validate_password("abc").unwrap_err();
        assert_eq!(err.reasons().len(), 3);
        assert_eq!(err.reasons()[0], PasswordRule::MinLength.message());
        assert!(err.to_string().contains("uppercase letter."));
        assert!(err.to_string().contains("special character."));
    }

    #[test]
    fn test_required_ignores_whitespace() {
        assert_eq!(required("  ", "Email").as_deref(), Some("Email is required."));
        assert_eq!(required("x", "Email"), None);
    }
}
