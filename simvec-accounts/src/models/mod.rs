/// Database models for Simvec
///
/// # Models
///
/// - `account`: user accounts, credentials and email verification state
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
/// let new_account = NewAccount {
///     user_name: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     password: "$argon2id$...".to_string(),
///     ..Default::default()
/// };
///
/// let account = Account::create(&pool, new_account).await?;
/// # Ok(())
/// # }
/// ```

pub mod account;
