/// Password policy and hashing
///
/// This module holds the two things every password write goes through:
///
/// 1. [`PasswordPolicy`]: a configurable, pure rule set that either accepts a
///    candidate password or returns **every** rule it violates, so callers can
///    relay actionable feedback instead of a single "invalid password".
/// 2. [`hash_password`] / [`verify_password`]: Argon2id hashing of accepted
///    passwords before they reach storage.
///
/// # Default Policy
///
/// | Option | Default |
/// |---|---|
/// | `min_length` | 8 characters |
/// | `max_length` | 128 characters |
/// | `require_uppercase` | yes |
/// | `require_lowercase` | yes |
/// | `require_digit` | yes (ASCII `0`-`9` only) |
/// | `require_symbol` | yes |
/// | `reject_identity` | yes (password may not equal the user name or email) |
/// | `disallowed` | none |
///
/// Lengths are counted in Unicode scalar values, not bytes.
///
/// # Example
///
/// ```
/// use simvec_accounts::auth::password::{PasswordPolicy, PasswordRule};
///
/// let policy = PasswordPolicy::default();
/// assert!(policy.validate("MyP@ssw0rd!").is_ok());
///
/// let violations = policy.validate("abc").unwrap_err();
/// assert!(violations.contains(&PasswordRule::TooShort { min: 8 }));
/// assert!(violations.contains(&PasswordRule::MissingDigit));
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// A single password rule that a candidate failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PasswordRule {
    /// Fewer characters than `min`
    TooShort { min: usize },

    /// More characters than `max`
    TooLong { max: usize },

    MissingUppercase,
    MissingLowercase,

    /// No ASCII digit; other numeric characters such as `½` do not count
    MissingDigit,

    /// No character that is neither alphanumeric nor whitespace
    MissingSymbol,

    /// Equal to the account's user name (case-insensitive)
    MatchesUserName,

    /// Equal to the account's email (case-insensitive)
    MatchesEmail,

    /// Listed in the policy's `disallowed` values
    Disallowed,
}

impl PasswordRule {
    /// Human-readable description suitable for end users
    pub fn message(&self) -> String {
        match self {
            PasswordRule::TooShort { min } => {
                format!("Password must be at least {} characters long", min)
            }
            PasswordRule::TooLong { max } => {
                format!("Password must be at most {} characters long", max)
            }
            PasswordRule::MissingUppercase => {
                "Password must contain at least one uppercase letter".to_string()
            }
            PasswordRule::MissingLowercase => {
                "Password must contain at least one lowercase letter".to_string()
            }
            PasswordRule::MissingDigit => "Password must contain at least one digit".to_string(),
            PasswordRule::MissingSymbol => {
                "Password must contain at least one special character".to_string()
            }
            PasswordRule::MatchesUserName => "Password must not match the user name".to_string(),
            PasswordRule::MatchesEmail => "Password must not match the email address".to_string(),
            PasswordRule::Disallowed => "Password is not allowed".to_string(),
        }
    }
}

impl fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// The non-empty set of rules a candidate password violated
///
/// Rules appear in evaluation order: minimum length, maximum length,
/// uppercase, lowercase, digit, symbol, user name, email, disallowed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyViolations {
    rules: Vec<PasswordRule>,
}

impl PolicyViolations {
    /// Violated rules in evaluation order
    pub fn rules(&self) -> &[PasswordRule] {
        &self.rules
    }

    pub fn contains(&self, rule: &PasswordRule) -> bool {
        self.rules.contains(rule)
    }

    /// One message per violated rule
    pub fn messages(&self) -> Vec<String> {
        self.rules.iter().map(PasswordRule::message).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for PolicyViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password rejected by {} rule(s): ", self.rules.len())?;
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl std::error::Error for PolicyViolations {}

/// Account identity a candidate password is checked against
///
/// Only used when [`PasswordPolicy::reject_identity`] is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordContext<'a> {
    pub user_name: Option<&'a str>,
    pub email: Option<&'a str>,
}

impl<'a> PasswordContext<'a> {
    pub fn new(user_name: &'a str, email: &'a str) -> Self {
        Self {
            user_name: Some(user_name),
            email: Some(email),
        }
    }
}

/// Configurable password rules
///
/// The policy is plain data: the same candidate and the same policy always
/// produce the same result, and a policy can be shared across threads freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Minimum number of characters
    pub min_length: usize,

    /// Maximum number of characters (None = unbounded)
    pub max_length: Option<usize>,

    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,

    /// Require a character that is neither alphanumeric nor whitespace
    pub require_symbol: bool,

    /// Reject passwords equal to the account's user name or email
    pub reject_identity: bool,

    /// Values that are always rejected (case-insensitive exact match)
    pub disallowed: Vec<String>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: Some(128),
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_symbol: true,
            reject_identity: true,
            disallowed: Vec::new(),
        }
    }
}

impl PasswordPolicy {
    /// Checks the policy itself for contradictions
    ///
    /// # Errors
    ///
    /// Returns a description if `min_length` exceeds `max_length`.
    pub fn check_consistency(&self) -> Result<(), String> {
        match self.max_length {
            Some(max) if self.min_length > max => Err(format!(
                "password policy min_length ({}) exceeds max_length ({})",
                self.min_length, max
            )),
            _ => Ok(()),
        }
    }

    /// Validates a candidate password without account context
    ///
    /// Identity rules (`MatchesUserName`, `MatchesEmail`) are skipped since
    /// there is nothing to compare against.
    ///
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(&self, candidate: &str) -> Result<(), PolicyViolations> {
        self.validate_with(candidate, PasswordContext::default())
    }

    /// Validates a candidate password for a specific account
    ///
    /// # Example
    ///
    /// ```
    /// use simvec_accounts::auth::password::{PasswordContext, PasswordPolicy, PasswordRule};
    ///
    /// let policy = PasswordPolicy {
    ///     require_symbol: false,
    ///     ..Default::default()
    /// };
    /// let ctx = PasswordContext::new("Alice2024", "alice@example.com");
    ///
    /// let violations = policy.validate_with("alice2024", ctx).unwrap_err();
    /// assert!(violations.contains(&PasswordRule::MatchesUserName));
    /// ```
    pub fn validate_with(
        &self,
        candidate: &str,
        context: PasswordContext<'_>,
    ) -> Result<(), PolicyViolations> {
        let mut rules = Vec::new();
        let length = candidate.chars().count();

        if length < self.min_length {
            rules.push(PasswordRule::TooShort {
                min: self.min_length,
            });
        }
        if let Some(max) = self.max_length {
            if length > max {
                rules.push(PasswordRule::TooLong { max });
            }
        }

        if self.require_uppercase && !candidate.chars().any(char::is_uppercase) {
            rules.push(PasswordRule::MissingUppercase);
        }
        if self.require_lowercase && !candidate.chars().any(char::is_lowercase) {
            rules.push(PasswordRule::MissingLowercase);
        }
        if self.require_digit && !candidate.chars().any(|c| c.is_ascii_digit()) {
            rules.push(PasswordRule::MissingDigit);
        }
        if self.require_symbol
            && !candidate
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            rules.push(PasswordRule::MissingSymbol);
        }

        if self.reject_identity {
            if matches_ignore_case(candidate, context.user_name) {
                rules.push(PasswordRule::MatchesUserName);
            }
            if matches_ignore_case(candidate, context.email) {
                rules.push(PasswordRule::MatchesEmail);
            }
        }

        if self
            .disallowed
            .iter()
            .any(|value| matches_ignore_case(candidate, Some(value.as_str())))
        {
            rules.push(PasswordRule::Disallowed);
        }

        if rules.is_empty() {
            Ok(())
        } else {
            Err(PolicyViolations { rules })
        }
    }

    /// Boolean form of [`validate`](Self::validate)
    pub fn is_acceptable(&self, candidate: &str) -> bool {
        self.validate(candidate).is_ok()
    }
}

fn matches_ignore_case(candidate: &str, other: Option<&str>) -> bool {
    match other {
        Some(other) if !other.is_empty() => candidate.to_lowercase() == other.to_lowercase(),
        _ => false,
    }
}

/// Hashes a password using Argon2id
///
/// Parameters: 64 MiB memory, 3 passes, 4 lanes, 32-byte output and a
/// 16-byte random salt. The result is a PHC string, e.g.
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
/// ```
///
/// Run the policy first; this function hashes whatever it is given.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Returns `Ok(false)` on mismatch. Comparison is constant-time.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `hash` cannot be parsed and
/// `PasswordError::VerifyError` for any other verification failure.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters come from the PHC string
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Hash of a throwaway password, computed once with the same parameters as
/// [`hash_password`]
static DECOY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("simvec-decoy-password").ok());

/// Runs a full verification against a throwaway hash and always fails
///
/// Lets a login for an unknown account cost the same Argon2 work as a wrong
/// password for a real one.
pub fn verify_against_decoy(password: &str) -> bool {
    match DECOY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(password, hash);
        }
        None => {
            let _ = hash_password(password);
        }
    }
    false
}
