use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::config::HashCost;
use crate::error::{AppError, Result};

/// Hashes and verifies account passwords with Argon2id.
#[derive(Clone, Copy, Debug, Default)]
pub struct CredentialHasher {
    cost: HashCost,
}

impl CredentialHasher {
    /// Creates a hasher producing hashes at `cost`.
    pub fn new(cost: HashCost) -> Self {
        Self { cost }
    }

    /// Hashes a password using Argon2id with a fresh random salt.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to hash.
    ///
    /// # Returns
    ///
    /// A `Result` containing the PHC-formatted hash.
    pub fn hash(&self, password: &str) -> Result<String> {
        let password_bytes = Zeroizing::new(password.as_bytes().to_vec());

        let mut salt_bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| AppError::Internal(format!("Failed to generate salt: {}", e)))?;

        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| AppError::Encryption(format!("Salt encoding error: {}", e)))?;

        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            ParamsBuilder::new()
                .m_cost(self.cost.memory_kib)
                .t_cost(self.cost.iterations)
                .p_cost(self.cost.parallelism)
                .build()
                .map_err(|e| AppError::Encryption(format!("Argon2 params: {}", e)))?,
        );

        let password_hash = argon2
            .hash_password(password_bytes.as_slice(), &salt)
            .map_err(|e| AppError::Encryption(format!("Argon2 hash error: {}", e)))?
            .to_string();

        tracing::debug!("Password hashed successfully with Argon2");
        Ok(password_hash)
    }

    /// Verifies a password against a stored hash.
    ///
    /// The cost parameters are read from the hash itself, so records hashed
    /// under an older cost keep verifying.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password_bytes = Zeroizing::new(password.as_bytes().to_vec());
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Encryption(format!("Hash parse error: {}", e)))?;
        let result = Argon2::default()
            .verify_password(password_bytes.as_slice(), &parsed_hash)
            .is_ok();

        tracing::debug!("Password verification completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(HashCost::minimal())
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hasher().hash("Secret1!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher().verify("Secret1!", &hash).unwrap());
        assert!(!hasher().verify("secret1!", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hasher().hash("Secret1!").unwrap();
        let b = hasher().hash("Secret1!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(hasher().verify("Secret1!", "plaintext").is_err());
    }

    #[test]
    fn invalid_cost_is_an_error() {
        let hasher = CredentialHasher::new(HashCost {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert!(matches!(
            hasher.hash("Secret1!"),
            Err(AppError::Encryption(_))
        ));
    }
}
