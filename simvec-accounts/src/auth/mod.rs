/// Credential handling for Simvec accounts
///
/// # Modules
///
/// - [`password`]: password policy validation and Argon2id hashing
/// - [`verification`]: email verification token generation
///
/// # Example
///
/// ```
/// use simvec_accounts::auth::password::{hash_password, verify_password, PasswordPolicy};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let policy = PasswordPolicy::default();
/// policy.validate("MyP@ssw0rd!")?;
///
/// let hash = hash_password("MyP@ssw0rd!")?;
/// assert!(verify_password("MyP@ssw0rd!", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod verification;
