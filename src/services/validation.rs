//! Field checks for the registration form: username, email, password.
//!
//! Each check returns a message suitable for showing next to the field.

use crate::error::OperationError;
use crate::model::query::Query;
use crate::services::operation::{self, Operation};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;

pub fn validate_username(value: &str) -> Result<(), OperationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OperationError::validation("Username is required"));
    }
    let len = value.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(OperationError::validation(format!(
            "Username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(OperationError::validation(
            "Username may only contain letters, numbers and underscores",
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), OperationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OperationError::validation("Email is required"));
    }
    let invalid = || OperationError::validation("Please enter a valid email");
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(invalid());
    };
    let domain_ok = !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));
    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }
    Ok(())
}

// Passwords are not trimmed; surrounding spaces count.
pub fn validate_password(value: &str) -> Result<(), OperationError> {
    if value.is_empty() {
        return Err(OperationError::validation("Password is required"));
    }
    if value.chars().count() < PASSWORD_MIN {
        return Err(OperationError::validation(format!(
            "Password must be at least {PASSWORD_MIN} characters"
        )));
    }
    if !value.chars().any(|c| c.is_uppercase()) {
        return Err(OperationError::validation(
            "Password must contain an uppercase letter",
        ));
    }
    if !value.chars().any(|c| c.is_lowercase()) {
        return Err(OperationError::validation(
            "Password must contain a lowercase letter",
        ));
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(OperationError::validation("Password must contain a number"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
}

impl Field {
    pub fn check(self, value: &str) -> Result<(), OperationError> {
        match self {
            Field::Username => validate_username(value),
            Field::Email => validate_email(value),
            Field::Password => validate_password(value),
        }
    }

    /// The field check as a debounced operation.
    pub fn operation(self) -> impl Operation<()> {
        operation::from_fn(move |query: &Query| self.check(query))
    }
}
