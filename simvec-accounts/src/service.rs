/// Account workflows
///
/// [`AccountService`] is the caller the record and the store expect: it runs
/// the password policy before every password write, hashes accepted
/// passwords, issues verification tokens and applies the token-clearing rule.
///
/// # Verification
///
/// A registered account starts with `is_email_verified = false` and a fresh
/// token. [`AccountService::verify_email`] sets the flag and clears the token
/// in the same write, so a token can be used once. Delivering the token (by
/// email or otherwise) is up to the caller.
///
/// # Example
///
/// ```
/// use simvec_accounts::auth::password::PasswordPolicy;
/// use simvec_accounts::service::{AccountService, Registration};
/// use simvec_accounts::store::MemoryAccountStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = AccountService::new(MemoryAccountStore::new(), PasswordPolicy::default());
///
/// let account = service
///     .register(Registration {
///         user_name: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password: "MyP@ssw0rd!".to_string(),
///     })
///     .await?;
///
/// let token = account.email_verification_token.clone().unwrap();
/// let verified = service.verify_email(&token).await?;
/// assert!(verified.is_email_verified);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::{
    hash_password, verify_against_decoy, verify_password, PasswordContext, PasswordError,
    PasswordPolicy,
};
use crate::auth::verification::{generate_verification_token, validate_verification_token_format};
use crate::error::{AccountError, AccountResult};
use crate::models::account::{Account, NewAccount, UpdateAccount};
use crate::store::AccountStore;
use serde::Deserialize;
use tracing::{debug, info, warn};
use validator::Validate;

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, max = 64, message = "User name must be 1-64 characters"))]
    pub user_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Plaintext candidate, checked against the policy then hashed
    pub password: String,
}

/// Registration, verification and credential workflows over an [`AccountStore`]
#[derive(Debug)]
pub struct AccountService<S> {
    store: S,
    policy: PasswordPolicy,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S, policy: PasswordPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Registers a new, unverified account
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a malformed user name or email
    /// - `Validation` with every violated password rule
    /// - `Conflict` if the user name or email is taken
    pub async fn register(&self, registration: Registration) -> AccountResult<Account> {
        registration.validate()?;

        self.policy.validate_with(
            &registration.password,
            PasswordContext::new(&registration.user_name, &registration.email),
        )?;

        let password = hash_password(&registration.password)?;

        let account = self
            .store
            .create(NewAccount {
                user_name: registration.user_name,
                email: registration.email,
                password,
                is_email_verified: false,
                email_verification_token: Some(generate_verification_token()),
            })
            .await?;

        info!(account_id = account.id, "Account registered, email verification pending");
        Ok(account)
    }

    /// Confirms an email address with its verification token
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the token is malformed
    /// - `InvalidToken` if no unverified account holds it
    pub async fn verify_email(&self, token: &str) -> AccountResult<Account> {
        if !validate_verification_token_format(token) {
            return Err(AccountError::InvalidInput(
                "Malformed verification token".to_string(),
            ));
        }

        let account = self
            .store
            .consume_verification_token(token)
            .await?
            .ok_or(AccountError::InvalidToken)?;

        info!(account_id = account.id, "Email address verified");
        Ok(account)
    }

    /// Replaces the pending verification token of an unverified account
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `AlreadyVerified` if there is nothing left to verify
    pub async fn regenerate_verification_token(&self, id: i32) -> AccountResult<Account> {
        let account = self
            .store
            .replace_verification_token(id, &generate_verification_token())
            .await?;

        debug!(account_id = id, "Verification token reissued");
        Ok(account)
    }

    /// Changes a password after checking the current one
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account does not exist
    /// - `InvalidCredentials` if `current` is wrong
    /// - `Validation` if `new` violates the policy
    pub async fn change_password(
        &self,
        id: i32,
        current: &str,
        new: &str,
    ) -> AccountResult<Account> {
        let mut account = self.store.get(id).await?;

        if !password_matches(current, &account.password)? {
            warn!(account_id = id, "Password change rejected: current password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        account.set_password(new, &self.policy)?;

        let account = self
            .store
            .update(
                id,
                UpdateAccount {
                    password: Some(account.password),
                    ..Default::default()
                },
            )
            .await?;

        info!(account_id = id, "Password changed");
        Ok(account)
    }

    /// Checks a login (user name or email) and password
    ///
    /// Unverified accounts authenticate too; callers that require a
    /// verified email check `is_email_verified` on the result.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown login, a wrong password or a
    /// stored password that is not an Argon2 hash, without saying which. An
    /// unknown login still pays for one Argon2 verification.
    pub async fn authenticate(&self, login: &str, password: &str) -> AccountResult<Account> {
        let account = match self.store.find_by_user_name(login).await? {
            Some(account) => Some(account),
            None => self.store.find_by_email(login).await?,
        };

        let Some(account) = account else {
            verify_against_decoy(password);
            warn!("Authentication failed: unknown login");
            return Err(AccountError::InvalidCredentials);
        };

        if !password_matches(password, &account.password)? {
            warn!(account_id = account.id, "Authentication failed: wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        debug!(account_id = account.id, "Authenticated");
        Ok(account)
    }

    /// Deletes an account
    pub async fn close_account(&self, id: i32) -> AccountResult<()> {
        self.store.delete(id).await?;
        info!(account_id = id, "Account closed");
        Ok(())
    }
}

/// Checks a password against a stored credential
///
/// A stored value that is not a PHC string never matches.
fn password_matches(password: &str, stored: &str) -> AccountResult<bool> {
    match verify_password(password, stored) {
        Ok(matches) => Ok(matches),
        Err(PasswordError::InvalidHash(reason)) => {
            debug!(%reason, "Stored password is not a PHC hash");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}
