/// Error types for account operations
///
/// Every store and workflow operation returns [`AccountResult`]. Nothing is
/// retried inside this crate: a `Conflict` cannot succeed on retry with the
/// same values, and a `Validation` failure needs a different password.

use crate::auth::password::{PasswordError, PolicyViolations};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for account operations
pub type AccountResult<T> = Result<T, AccountError>;

/// Account field that must be unique across all records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    UserName,
    Email,
}

impl UniqueField {
    /// Column name in the `accounts` table
    pub fn column(&self) -> &'static str {
        match self {
            UniqueField::UserName => "user_name",
            UniqueField::Email => "email",
        }
    }

    /// Maps a Postgres unique-constraint name back to the field it guards
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        if constraint.contains("user_name") {
            Some(UniqueField::UserName)
        } else if constraint.contains("email") {
            Some(UniqueField::Email)
        } else {
            None
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Errors raised by account storage and account workflows
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Candidate password violates one or more policy rules
    #[error(transparent)]
    Validation(#[from] PolicyViolations),

    /// Malformed input (email syntax, user name length, token shape)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Create/update would duplicate a unique value
    #[error("An account with this {field} already exists")]
    Conflict { field: UniqueField },

    /// No account with this id
    #[error("Account {0} not found")]
    NotFound(i32),

    /// Verification token does not belong to any pending account
    #[error("Invalid or expired verification token")]
    InvalidToken,

    /// Email address has already been verified
    #[error("Email address is already verified")]
    AlreadyVerified,

    /// Login or password did not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Any other storage failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<validator::ValidationErrors> for AccountError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, error.code),
                })
            })
            .collect();
        details.sort();

        AccountError::InvalidInput(details.join(", "))
    }
}

impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                if let Some(field) = db_err.constraint().and_then(UniqueField::from_constraint) {
                    return AccountError::Conflict { field };
                }
            }
        }

        AccountError::Database(err)
    }
}

impl AccountError {
    /// Whether the error came from the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AccountError::Password(_) | AccountError::Database(_))
    }
}
