use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

/// The size of the session token in bytes.
const SESSION_TOKEN_SIZE: usize = 32;

/// Generates a new random session token.
///
/// # Returns
///
/// A URL-safe base64-encoded token.
pub fn generate_session_token() -> Result<String> {
    let mut token = [0u8; SESSION_TOKEN_SIZE];
    OsRng
        .try_fill_bytes(&mut token)
        .map_err(|e| AppError::Internal(format!("Failed to generate session token: {}", e)))?;

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(token))
}

/// Compares two tokens without leaking where they differ.
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_decodes_to_expected_length() {
        let token = generate_session_token().unwrap();
        let bytes = general_purpose::URL_SAFE_NO_PAD.decode(token.as_bytes()).unwrap();
        assert_eq!(bytes.len(), SESSION_TOKEN_SIZE);
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_session_token().unwrap(), generate_session_token().unwrap());
    }

    #[test]
    fn tokens_match_is_exact() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
    }
}
