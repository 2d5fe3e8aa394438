/// PostgreSQL account store
///
/// Thin adapter over the sqlx queries on [`Account`]. Identity comes from the
/// `GENERATED ALWAYS AS IDENTITY` column and uniqueness from the
/// `accounts_user_name_key` / `accounts_email_key` constraints, so concurrent
/// registrations are resolved by the database.

use super::AccountStore;
use crate::error::{AccountError, AccountResult};
use crate::models::account::{Account, NewAccount, UpdateAccount};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, warn};

/// Account store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, data: NewAccount) -> AccountResult<Account> {
        match Account::create(&self.pool, data).await {
            Ok(account) => {
                info!(account_id = account.id, "Account created");
                Ok(account)
            }
            Err(err) => {
                let err = AccountError::from(err);
                warn!(error = %err, "Account creation failed");
                Err(err)
            }
        }
    }

    async fn get(&self, id: i32) -> AccountResult<Account> {
        Account::find_by_id(&self.pool, id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    async fn find_by_user_name(&self, user_name: &str) -> AccountResult<Option<Account>> {
        Ok(Account::find_by_user_name(&self.pool, user_name).await?)
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        Ok(Account::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_verification_token(&self, token: &str) -> AccountResult<Option<Account>> {
        Ok(Account::find_by_verification_token(&self.pool, token).await?)
    }

    async fn consume_verification_token(&self, token: &str) -> AccountResult<Option<Account>> {
        let account = Account::consume_verification_token(&self.pool, token).await?;
        if let Some(account) = &account {
            debug!(account_id = account.id, "Verification token consumed");
        }
        Ok(account)
    }

    async fn replace_verification_token(&self, id: i32, token: &str) -> AccountResult<Account> {
        match Account::replace_verification_token(&self.pool, id, token).await? {
            Some(account) => {
                debug!(account_id = id, "Verification token replaced");
                Ok(account)
            }
            // No row matched: tell a missing account from a verified one
            None => match Account::find_by_id(&self.pool, id).await? {
                Some(_) => Err(AccountError::AlreadyVerified),
                None => Err(AccountError::NotFound(id)),
            },
        }
    }

    async fn update(&self, id: i32, data: UpdateAccount) -> AccountResult<Account> {
        if data.is_empty() {
            debug!(account_id = id, "Empty update, returning current record");
            return self.get(id).await;
        }

        let account = Account::update(&self.pool, id, data)
            .await?
            .ok_or(AccountError::NotFound(id))?;

        debug!(account_id = id, "Account updated");
        Ok(account)
    }

    async fn delete(&self, id: i32) -> AccountResult<()> {
        if Account::delete(&self.pool, id).await? {
            info!(account_id = id, "Account deleted");
            Ok(())
        } else {
            Err(AccountError::NotFound(id))
        }
    }

    async fn count(&self) -> AccountResult<u64> {
        let count = Account::count(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}
