/// Configuration management
///
/// Settings come from environment variables (and a `.env` file if present),
/// prefixed with `SIMVEC_` and nested with `__`. Anything unset falls back to
/// [`DatabaseConfig::default`] and [`PasswordPolicy::default`].
///
/// # Environment Variables
///
/// - `SIMVEC_DATABASE__URL`: PostgreSQL connection string (required)
/// - `SIMVEC_DATABASE__MAX_CONNECTIONS`: pool size (default: 10)
/// - `SIMVEC_PASSWORD_POLICY__MIN_LENGTH`: minimum password length (default: 8)
/// - `SIMVEC_PASSWORD_POLICY__MAX_LENGTH`: maximum password length (default: 128)
/// - `SIMVEC_PASSWORD_POLICY__REQUIRE_UPPERCASE`, `..._REQUIRE_LOWERCASE`,
///   `..._REQUIRE_DIGIT`, `..._REQUIRE_SYMBOL`, `..._REJECT_IDENTITY`: booleans
///   (default: true)
/// - `SIMVEC_PASSWORD_POLICY__DISALLOWED`: comma-separated rejected passwords
/// - `RUST_LOG`: log filter for whatever installs the subscriber
///
/// # Example
///
/// ```no_run
/// use simvec_accounts::config::Settings;
///
/// # fn example() -> anyhow::Result<()> {
/// let settings = Settings::from_env()?;
/// println!("Minimum password length: {}", settings.password_policy.min_length);
/// # Ok(())
/// # }
/// ```

use crate::auth::password::PasswordPolicy;
use crate::db::pool::DatabaseConfig;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SIMVEC";

/// Complete configuration for the account layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connection pool settings
    pub database: DatabaseConfig,

    /// Rules applied to every password write
    pub password_policy: PasswordPolicy,
}

impl Settings {
    /// Loads settings from `.env` and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A variable cannot be parsed into its field type
    /// - `SIMVEC_DATABASE__URL` is missing
    /// - The password policy contradicts itself
    pub fn from_env() -> anyhow::Result<Self> {
        // Development convenience; a missing .env is fine
        dotenvy::dotenv().ok();

        let settings = Self::from_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("password_policy.disallowed")
                .try_parsing(true),
        )?;

        if settings.database.url.is_empty() {
            anyhow::bail!("SIMVEC_DATABASE__URL environment variable is required");
        }

        Ok(settings)
    }

    /// Builds settings from any `config` source and validates them
    ///
    /// Does not require a database URL, which keeps it usable in tests.
    pub fn from_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        settings
            .password_policy
            .check_consistency()
            .map_err(anyhow::Error::msg)?;

        Ok(settings)
    }
}
