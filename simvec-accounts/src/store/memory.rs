/// In-memory account store
///
/// Holds all accounts behind one `RwLock`. Every write takes the write lock
/// for its whole check-and-mutate, which gives the same atomic uniqueness
/// guarantee the database constraints give [`super::PgAccountStore`].
///
/// Ids start at 1 and are never reused, even after deletion. Uniqueness is
/// exact (case-sensitive) string equality.

use super::AccountStore;
use crate::error::{AccountError, AccountResult, UniqueField};
use crate::models::account::{Account, NewAccount, UpdateAccount};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Inner {
    accounts: BTreeMap<i32, Account>,
    last_id: i32,
}

impl Inner {
    /// Returns the field that `user_name`/`email` would duplicate, ignoring `skip`
    fn conflict(
        &self,
        user_name: Option<&str>,
        email: Option<&str>,
        skip: Option<i32>,
    ) -> Option<UniqueField> {
        self.accounts
            .values()
            .filter(|account| Some(account.id) != skip)
            .find_map(|account| {
                if user_name == Some(account.user_name.as_str()) {
                    Some(UniqueField::UserName)
                } else if email == Some(account.email.as_str()) {
                    Some(UniqueField::Email)
                } else {
                    None
                }
            })
    }
}

/// Process-local account store
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Inner>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, data: NewAccount) -> AccountResult<Account> {
        let mut inner = self.inner.write().await;

        if let Some(field) =
            inner.conflict(Some(data.user_name.as_str()), Some(data.email.as_str()), None)
        {
            debug!(%field, "Rejecting duplicate account");
            return Err(AccountError::Conflict { field });
        }

        inner.last_id += 1;
        let now = Utc::now();
        let account = Account {
            id: inner.last_id,
            user_name: data.user_name,
            email: data.email,
            password: data.password,
            is_email_verified: data.is_email_verified,
            email_verification_token: data.email_verification_token,
            created_at: now,
            updated_at: now,
        };
        inner.accounts.insert(account.id, account.clone());

        info!(account_id = account.id, "Account created");
        Ok(account)
    }

    async fn get(&self, id: i32) -> AccountResult<Account> {
        self.inner
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or(AccountError::NotFound(id))
    }

    async fn find_by_user_name(&self, user_name: &str) -> AccountResult<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.user_name == user_name)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_verification_token(&self, token: &str) -> AccountResult<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| {
                !account.is_email_verified
                    && account.email_verification_token.as_deref() == Some(token)
            })
            .cloned())
    }

    async fn consume_verification_token(&self, token: &str) -> AccountResult<Option<Account>> {
        let mut inner = self.inner.write().await;

        let Some(account) = inner.accounts.values_mut().find(|account| {
            !account.is_email_verified && account.email_verification_token.as_deref() == Some(token)
        }) else {
            return Ok(None);
        };
        UpdateAccount::mark_verified().apply_to(account);

        debug!(account_id = account.id, "Verification token consumed");
        Ok(Some(account.clone()))
    }

    async fn replace_verification_token(&self, id: i32, token: &str) -> AccountResult<Account> {
        let mut inner = self.inner.write().await;

        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or(AccountError::NotFound(id))?;
        if account.is_email_verified {
            return Err(AccountError::AlreadyVerified);
        }

        UpdateAccount {
            email_verification_token: Some(Some(token.to_string())),
            ..Default::default()
        }
        .apply_to(account);

        debug!(account_id = id, "Verification token replaced");
        Ok(account.clone())
    }

    async fn update(&self, id: i32, data: UpdateAccount) -> AccountResult<Account> {
        let mut inner = self.inner.write().await;

        if !inner.accounts.contains_key(&id) {
            return Err(AccountError::NotFound(id));
        }
        if let Some(field) =
            inner.conflict(data.user_name.as_deref(), data.email.as_deref(), Some(id))
        {
            debug!(account_id = id, %field, "Rejecting update that duplicates another account");
            return Err(AccountError::Conflict { field });
        }

        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or(AccountError::NotFound(id))?;
        data.apply_to(account);

        debug!(account_id = id, "Account updated");
        Ok(account.clone())
    }

    async fn delete(&self, id: i32) -> AccountResult<()> {
        let mut inner = self.inner.write().await;
        match inner.accounts.remove(&id) {
            Some(_) => {
                info!(account_id = id, "Account deleted");
                Ok(())
            }
            None => Err(AccountError::NotFound(id)),
        }
    }

    async fn count(&self) -> AccountResult<u64> {
        Ok(self.inner.read().await.accounts.len() as u64)
    }
}
