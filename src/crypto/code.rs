use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of digits in a verification code.
pub const CODE_LENGTH: usize = 6;

/// A six-digit code sent to the user to confirm a password reset.
///
/// Lives only in memory and is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Draws a code uniformly from 100000..=999999.
    pub fn generate() -> Self {
        let value: u32 = OsRng.gen_range(100_000..1_000_000);
        Self(value.to_string())
    }

    /// The digits, for delivery to the user.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a submitted code.
    pub fn matches(&self, submitted: &str) -> bool {
        self.0.as_bytes().ct_eq(submitted.as_bytes()).into()
    }
}

impl std::fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VerificationCode(******)")
    }
}

#[cfg(test)]
impl VerificationCode {
    pub(crate) fn from_digits(digits: &str) -> Self {
        Self(digits.to_string())
    }
}
