/// Email verification tokens
///
/// A token is issued at registration (and on request for unverified accounts)
/// and stored on the account until the address is confirmed. Delivering the
/// token to the user is the caller's job.
///
/// # Token Format
///
/// 32 base62 characters (`[A-Za-z0-9]`), about 190 bits of randomness, safe to
/// embed in URLs without escaping.
///
/// # Example
///
/// ```
/// use simvec_accounts::auth::verification::{
///     generate_verification_token, validate_verification_token_format,
/// };
///
/// let token = generate_verification_token();
/// assert_eq!(token.len(), 32);
/// assert!(validate_verification_token_format(&token));
/// ```

use rand::Rng;

/// Length of a verification token (characters)
pub const VERIFICATION_TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a new email verification token
///
/// Uses `rand::thread_rng()`, a CSPRNG seeded from the OS.
pub fn generate_verification_token() -> String {
    let mut rng = rand::thread_rng();

    (0..VERIFICATION_TOKEN_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Checks that a string could be a verification token
///
/// This only checks shape; whether the token belongs to an account is a
/// storage lookup.
///
/// ```
/// use simvec_accounts::auth::verification::validate_verification_token_format;
///
/// assert!(validate_verification_token_format("abcdefghijklmnopqrstuvwxyz012345"));
/// assert!(!validate_verification_token_format("short"));
/// assert!(!validate_verification_token_format("abcdefghijklmnopqrstuvwxyz01234!"));
/// ```
pub fn validate_verification_token_format(token: &str) -> bool {
    token.len() == VERIFICATION_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_verification_token() {
        let token = generate_verification_token();
        assert_eq!(token.len(), VERIFICATION_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_verification_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_validate_format() {
        assert!(validate_verification_token_format(&generate_verification_token()));
        assert!(!validate_verification_token_format(""));
        assert!(!validate_verification_token_format(&"a".repeat(33)));
        // Non-ASCII alphanumerics are rejected even at the right byte length
        assert!(!validate_verification_token_format(&format!("{}ä", "a".repeat(30))));
    }
}
