/// Account model and database operations
///
/// One row per Simvec user: identity, credentials and email-verification
/// state. The record is a passive value holder; registration, verification and
/// password changes live in [`crate::service`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id INTEGER GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
///     user_name VARCHAR(64) NOT NULL CONSTRAINT accounts_user_name_key UNIQUE,
///     email VARCHAR(255) NOT NULL CONSTRAINT accounts_email_key UNIQUE,
///     password VARCHAR(255) NOT NULL,
///     is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     email_verification_token VARCHAR(64),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use simvec_accounts::models::account::{Account, NewAccount};
/// use simvec_accounts::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let account = Account::create(
///     &pool,
///     NewAccount {
///         user_name: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password: "$argon2id$...".to_string(),
///         ..Default::default()
///     },
/// )
/// .await?;
/// println!("Created account {}", account.id);
///
/// let found = Account::find_by_user_name(&pool, "alice").await?;
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{hash_password, PasswordContext, PasswordPolicy};
use crate::error::AccountResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

const COLUMNS: &str = "id, user_name, email, password, is_email_verified, \
                       email_verification_token, created_at, updated_at";

/// A persisted Simvec account
///
/// `user_name` and `email` are unique across all accounts; `id` is assigned
/// once by storage and never changes. `password` is never serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Identity assigned by storage at creation
    pub id: i32,

    pub user_name: String,

    pub email: String,

    /// Stored credential, an Argon2id PHC string when written via the service
    #[serde(skip_serializing, default)]
    pub password: String,

    pub is_email_verified: bool,

    /// Pending verification token; `None` once the email is verified
    #[serde(skip_serializing, default)]
    pub email_verification_token: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new account
///
/// `password` is stored as given. Run the policy and hash it first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, max = 64, message = "User name must be 1-64 characters"))]
    pub user_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    pub is_email_verified: bool,

    pub email_verification_token: Option<String>,
}

/// Input for updating an existing account
///
/// Only `Some` fields are written. `id` cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccount {
    pub user_name: Option<String>,

    pub email: Option<String>,

    /// New stored credential (already validated and hashed)
    pub password: Option<String>,

    pub is_email_verified: Option<bool>,

    /// `Some(None)` clears the token
    pub email_verification_token: Option<Option<String>>,
}

impl UpdateAccount {
    /// Marks the email verified and clears the pending token in one write
    pub fn mark_verified() -> Self {
        Self {
            is_email_verified: Some(true),
            email_verification_token: Some(None),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.is_email_verified.is_none()
            && self.email_verification_token.is_none()
    }

    /// Applies the changes to an in-memory account
    ///
    /// Does not touch `id` or `created_at`; bumps `updated_at`.
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(user_name) = &self.user_name {
            account.user_name = user_name.clone();
        }
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(password) = &self.password {
            account.password = password.clone();
        }
        if let Some(verified) = self.is_email_verified {
            account.is_email_verified = verified;
        }
        if let Some(token) = &self.email_verification_token {
            account.email_verification_token = token.clone();
        }
        account.updated_at = Utc::now();
    }
}

impl Account {
    /// Builds an account with every field given
    ///
    /// Timestamps are set to now.
    pub fn new(
        id: i32,
        user_name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        is_email_verified: bool,
        email_verification_token: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_name: user_name.into(),
            email: email.into(),
            password: password.into(),
            is_email_verified,
            email_verification_token,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates `candidate` against `policy` and stores its Argon2id hash
    ///
    /// The account's own user name and email are the identity context. On
    /// any error the previous password is left untouched.
    ///
    /// # Errors
    ///
    /// - `AccountError::Validation` with every violated rule
    /// - `AccountError::Password` if hashing fails
    pub fn set_password(&mut self, candidate: &str, policy: &PasswordPolicy) -> AccountResult<()> {
        policy.validate_with(candidate, PasswordContext::new(&self.user_name, &self.email))?;
        self.password = hash_password(candidate)?;
        Ok(())
    }

    /// Marks the email verified and drops the pending token
    pub fn mark_email_verified(&mut self) {
        self.is_email_verified = true;
        self.email_verification_token = None;
    }

    /// Whether a verification token is outstanding
    pub fn is_verification_pending(&self) -> bool {
        !self.is_email_verified && self.email_verification_token.is_some()
    }

    /// Inserts a new account, letting the database assign `id`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `user_name` or `email` already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: NewAccount) -> Result<Self, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO accounts (user_name, email, password, is_email_verified, email_verification_token)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(data.user_name)
            .bind(data.email)
            .bind(data.password)
            .bind(data.is_email_verified)
            .bind(data.email_verification_token)
            .fetch_one(pool)
            .await
    }

    /// Finds an account by id
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", COLUMNS);

        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by exact user name
    pub async fn find_by_user_name(
        pool: &PgPool,
        user_name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM accounts WHERE user_name = $1", COLUMNS);

        sqlx::query_as::<_, Account>(&sql)
            .bind(user_name)
            .fetch_optional(pool)
            .await
    }

    /// Finds an account by exact email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {} FROM accounts WHERE email = $1", COLUMNS);

        sqlx::query_as::<_, Account>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the unverified account holding `token`
    pub async fn find_by_verification_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE email_verification_token = $1 AND NOT is_email_verified",
            COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Spends a verification token in a single statement
    ///
    /// Sets `is_email_verified`, clears the token and returns the account, or
    /// None if no unverified account holds `token`. Two callers racing on the
    /// same token cannot both get a row back.
    pub async fn consume_verification_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE accounts
            SET is_email_verified = TRUE, email_verification_token = NULL, updated_at = NOW()
            WHERE email_verification_token = $1 AND NOT is_email_verified
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Replaces the token of an account that is still unverified
    ///
    /// # Returns
    ///
    /// The updated account, or None if the id is unknown or already verified
    pub async fn replace_verification_token(
        pool: &PgPool,
        id: i32,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE accounts
            SET email_verification_token = $2, updated_at = NOW()
            WHERE id = $1 AND NOT is_email_verified
            RETURNING {}
            "#,
            COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Updates an existing account
    ///
    /// Only `Some` fields in `data` are written; `updated_at` is always set.
    ///
    /// # Returns
    ///
    /// The updated account, or None if no account has this id
    ///
    /// # Errors
    ///
    /// Returns an error if the new `user_name` or `email` belongs to another
    /// account, or if the database connection fails
    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: UpdateAccount,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE accounts SET updated_at = NOW()");
        let mut bind_count = 1;

        for (column, present) in [
            ("user_name", data.user_name.is_some()),
            ("email", data.email.is_some()),
            ("password", data.password.is_some()),
            ("is_email_verified", data.is_email_verified.is_some()),
            ("email_verification_token", data.email_verification_token.is_some()),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", COLUMNS));

        // Binds must follow the same column order as above
        let mut q = sqlx::query_as::<_, Account>(&query).bind(id);

        if let Some(user_name) = data.user_name {
            q = q.bind(user_name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password) = data.password {
            q = q.bind(password);
        }
        if let Some(verified) = data.is_email_verified {
            q = q.bind(verified);
        }
        if let Some(token) = data.email_verification_token {
            q = q.bind(token);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an account by id
    ///
    /// # Returns
    ///
    /// True if an account was deleted, false if none had this id
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists accounts ordered by id
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM accounts ORDER BY id LIMIT $1 OFFSET $2",
            COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts all accounts
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{verify_password, PasswordRule};
    use crate::error::AccountError;

    #[test]
    fn test_full_constructor_reads_back() {
        let account = Account::new(
            7,
            "alice",
            "alice@example.com",
            "secret",
            false,
            Some("token".to_string()),
        );

        assert_eq!(account.id, 7);
        assert_eq!(account.user_name, "alice");
        assert_eq!(account.email, "alice@example.com");
        assert_eq!(account.password, "secret");
        assert!(!account.is_email_verified);
        assert_eq!(account.email_verification_token.as_deref(), Some("token"));
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn test_empty_then_set_fields() {
        let mut account = Account::default();
        assert!(!account.is_email_verified);
        assert!(account.email_verification_token.is_none());

        account.user_name = "bob".to_string();
        account.email = "bob@example.com".to_string();
        account.password = "pw".to_string();
        account.is_email_verified = true;
        account.email_verification_token = Some("abc".to_string());

        assert_eq!(account.user_name, "bob");
        assert_eq!(account.email, "bob@example.com");
        assert_eq!(account.password, "pw");
        assert!(account.is_email_verified);
        assert_eq!(account.email_verification_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_set_password_hashes_accepted_password() {
        let mut account = Account::new(1, "carol", "carol@example.com", "old", false, None);
        account
            .set_password("N3w!Password", &PasswordPolicy::default())
            .expect("password should be accepted");

        assert!(account.password.starts_with("$argon2id$"));
        assert!(verify_password("N3w!Password", &account.password).unwrap());
    }

    #[test]
    fn test_set_password_rejects_and_keeps_old_value() {
        let mut account = Account::new(1, "Carol!2024", "carol@example.com", "old", false, None);

        let err = account
            .set_password("carol!2024", &PasswordPolicy::default())
            .unwrap_err();

        match err {
            AccountError::Validation(violations) => {
                assert_eq!(
                    violations.rules(),
                    &[PasswordRule::MissingUppercase, PasswordRule::MatchesUserName]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(account.password, "old");
    }

    #[test]
    fn test_mark_email_verified_clears_token() {
        let mut account = Account::new(1, "dave", "dave@example.com", "pw", false, Some("t".into()));
        assert!(account.is_verification_pending());

        account.mark_email_verified();

        assert!(account.is_email_verified);
        assert!(account.email_verification_token.is_none());
        assert!(!account.is_verification_pending());
    }

    #[test]
    fn test_serialization_hides_secrets() {
        let account = Account::new(1, "erin", "erin@example.com", "hash", false, Some("t".into()));
        let json = serde_json::to_value(&account).unwrap();

        assert_eq!(json["user_name"], "erin");
        assert!(json.get("password").is_none());
        assert!(json.get("email_verification_token").is_none());
    }

    #[test]
    fn test_new_account_validation() {
        let valid = NewAccount {
            user_name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let bad_email = NewAccount {
            email: "alice".to_string(),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let empty_name = NewAccount {
            user_name: String::new(),
            ..valid.clone()
        };
        assert!(empty_name.validate().is_err());

        let long_name = NewAccount {
            user_name: "x".repeat(65),
            ..valid
        };
        assert!(long_name.validate().is_err());
    }

    #[test]
    fn test_update_account_default() {
        let update = UpdateAccount::default();
        assert!(update.is_empty());
        assert!(update.user_name.is_none());
        assert!(update.password.is_none());
        assert!(update.email_verification_token.is_none());
    }

    #[test]
    fn test_update_apply_keeps_identity() {
        let mut account = Account::new(42, "frank", "frank@example.com", "pw", false, Some("t".into()));
        let created_at = account.created_at;

        UpdateAccount {
            email: Some("frank@example.org".to_string()),
            ..Default::default()
        }
        .apply_to(&mut account);
        UpdateAccount::mark_verified().apply_to(&mut account);

        assert_eq!(account.id, 42);
        assert_eq!(account.created_at, created_at);
        assert_eq!(account.email, "frank@example.org");
        assert!(account.is_email_verified);
        assert!(account.email_verification_token.is_none());
    }

    // Database-backed tests are in tests/db_account_tests.rs
}
