/// Account storage
///
/// [`AccountStore`] is the contract every storage backend implements. The
/// store, not the caller, assigns ids and guarantees that `user_name` and
/// `email` stay unique; check-and-insert must be atomic.
///
/// # Implementations
///
/// - [`PgAccountStore`]: PostgreSQL via sqlx; uniqueness from table constraints
/// - [`MemoryAccountStore`]: process-local, for tests and local development
///
/// # Example
///
/// ```
/// use simvec_accounts::models::account::NewAccount;
/// use simvec_accounts::store::{AccountStore, MemoryAccountStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryAccountStore::new();
///
/// let account = store
///     .create(NewAccount {
///         user_name: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password: "$argon2id$...".to_string(),
///         ..Default::default()
///     })
///     .await?;
///
/// assert_eq!(store.get(account.id).await?.user_name, "alice");
/// # Ok(())
/// # }
/// ```

use crate::error::AccountResult;
use crate::models::account::{Account, NewAccount, UpdateAccount};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

/// Storage backend for accounts
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account and returns it with `id` assigned
    ///
    /// Fails with `AccountError::Conflict` if `user_name` or `email` is taken.
    async fn create(&self, data: NewAccount) -> AccountResult<Account>;

    /// Fetches an account by id, `AccountError::NotFound` if absent
    async fn get(&self, id: i32) -> AccountResult<Account>;

    async fn find_by_user_name(&self, user_name: &str) -> AccountResult<Option<Account>>;

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>>;

    /// Finds the unverified account holding this verification token
    async fn find_by_verification_token(&self, token: &str) -> AccountResult<Option<Account>>;

    /// Atomically marks the holder of `token` verified and clears the token
    ///
    /// Returns None if no unverified account holds it. Of several concurrent
    /// calls with the same token, at most one returns an account.
    async fn consume_verification_token(&self, token: &str) -> AccountResult<Option<Account>>;

    /// Atomically replaces the token of an account that is still unverified
    ///
    /// Fails with `NotFound` for an unknown id and `AlreadyVerified` if the
    /// account was verified, including by a concurrent
    /// [`consume_verification_token`](Self::consume_verification_token).
    async fn replace_verification_token(&self, id: i32, token: &str) -> AccountResult<Account>;

    /// Applies a partial update; `id` is never changed
    ///
    /// Fails with `NotFound` or `Conflict`.
    async fn update(&self, id: i32, data: UpdateAccount) -> AccountResult<Account>;

    /// Removes an account, `AccountError::NotFound` if absent
    async fn delete(&self, id: i32) -> AccountResult<()>;

    async fn count(&self) -> AccountResult<u64>;
}
