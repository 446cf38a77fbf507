use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::crypto::code::CODE_LENGTH;
use crate::error::{AppError, Result};
use crate::validation::phone::digits_only;
use crate::validation::strength::score_password;

/// Field identifiers reported in `ValidationFailed`.
pub mod field {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const CONFIRM_PASSWORD: &str = "confirm_password";
    pub const PHONE: &str = "phone";
    pub const CODE: &str = "code";
    pub const MESSAGE: &str = "message";
    pub const TERMS: &str = "accept_terms";
}

static EMAIL_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Minimum password length at signup and reset.
pub const SIGNUP_PASSWORD_MIN: usize = 8;
/// Minimum password length accepted by the login form.
pub const LOGIN_PASSWORD_MIN: usize = 6;
/// Minimum name length.
pub const NAME_MIN: usize = 2;
pub const CONTACT_NAME_MAX: usize = 50;
pub const CONTACT_EMAIL_MAX: usize = 100;
pub const CONTACT_MESSAGE_MAX: usize = 500;

/// The outcome of checking one field, as shown next to the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCheck {
    pub is_valid: bool,
    /// Empty when the field is valid.
    pub message: String,
}

impl FieldCheck {
    /// Collapses a validator result into a `FieldCheck`.
    pub fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                is_valid: true,
                message: String::new(),
            },
            Err(AppError::ValidationFailed { reason, .. }) => Self {
                is_valid: false,
                message: reason,
            },
            Err(other) => Self {
                is_valid: false,
                message: other.into_response().message,
            },
        }
    }
}

/// Whether `email` has the `local@domain.tld` shape. No DNS lookup is made.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.as_ref().is_some_and(|regex| regex.is_match(email))
}

/// Validates an email address.
///
/// # Arguments
///
/// * `email` - The raw input; surrounding whitespace is ignored.
///
/// # Returns
///
/// A `Result<()>` indicating whether the email is valid.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(AppError::validation(field::EMAIL, "Email is required."));
    }

    if !is_valid_email(email) {
        return Err(AppError::validation(
            field::EMAIL,
            "Enter a valid email (e.g. user@domain.com).",
        ));
    }

    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || ('À'..='ÿ').contains(&c) || c.is_whitespace()
}

/// Validates a person's name: at least two characters, letters and spaces only.
/// Accented Latin letters are accepted.
pub fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::validation(field::NAME, "Name is required."));
    }

    if name.chars().count() < NAME_MIN {
        return Err(AppError::validation(
            field::NAME,
            "Name must be at least 2 characters long.",
        ));
    }

    if !name.chars().all(is_name_char) {
        return Err(AppError::validation(
            field::NAME,
            "Name can only contain letters and spaces.",
        ));
    }

    Ok(())
}

/// Validates a password chosen at signup or reset.
///
/// Requires at least 8 characters and a strength score of 3 or more.
pub fn validate_new_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::validation(field::PASSWORD, "Password is required."));
    }

    if password.chars().count() < SIGNUP_PASSWORD_MIN {
        return Err(AppError::validation(
            field::PASSWORD,
            "Password must be at least 8 characters long.",
        ));
    }

    if !score_password(password).is_acceptable() {
        return Err(AppError::validation(
            field::PASSWORD,
            "Password is too weak. Use upper and lower case letters, numbers and symbols.",
        ));
    }

    Ok(())
}

/// Validates a password typed into the login form. No strength requirement.
pub fn validate_login_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::validation(field::PASSWORD, "Password is required."));
    }

    if password.chars().count() < LOGIN_PASSWORD_MIN {
        return Err(AppError::validation(
            field::PASSWORD,
            "Password must be at least 6 characters long.",
        ));
    }

    Ok(())
}

/// Validates that the confirmation repeats the password.
pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<()> {
    if confirmation.is_empty() {
        return Err(AppError::validation(
            field::CONFIRM_PASSWORD,
            "Please confirm your password.",
        ));
    }

    if password != confirmation {
        return Err(AppError::validation(
            field::CONFIRM_PASSWORD,
            "Passwords do not match.",
        ));
    }

    Ok(())
}

/// Validates a Brazilian phone number: 10 (landline) or 11 (mobile) digits
/// once formatting characters are stripped.
pub fn validate_phone(phone: &str) -> Result<()> {
    let digits = digits_only(phone);

    if digits.is_empty() {
        return Err(AppError::validation(field::PHONE, "Phone is required."));
    }

    if !(10..=11).contains(&digits.len()) {
        return Err(AppError::validation(
            field::PHONE,
            "Phone must have 10 or 11 digits including area code.",
        ));
    }

    Ok(())
}

/// Validates a password-reset verification code: exactly six digits.
pub fn validate_verification_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(AppError::validation(field::CODE, "Enter the verification code."));
    }

    if code.chars().count() != CODE_LENGTH {
        return Err(AppError::validation(field::CODE, "The code must have 6 digits."));
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(
            field::CODE,
            "The code must contain only numbers.",
        ));
    }

    Ok(())
}

/// Validates the name on the contact form (at most 50 characters).
pub fn validate_contact_name(name: &str) -> Result<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::validation(field::NAME, "Please enter your name."));
    }

    if name.chars().count() > CONTACT_NAME_MAX {
        return Err(AppError::validation(
            field::NAME,
            "Name must be at most 50 characters.",
        ));
    }

    Ok(())
}

/// Validates the email on the contact form (at most 100 characters).
pub fn validate_contact_email(email: &str) -> Result<()> {
    validate_email(email)?;

    if email.trim().chars().count() > CONTACT_EMAIL_MAX {
        return Err(AppError::validation(
            field::EMAIL,
            "Email must be at most 100 characters.",
        ));
    }

    Ok(())
}

/// Validates the optional phone on the contact form.
pub fn validate_optional_phone(phone: &str) -> Result<()> {
    if digits_only(phone).is_empty() {
        return Ok(());
    }
    validate_phone(phone)
}

/// Validates the message on the contact form (at most 500 characters).
pub fn validate_message(message: &str) -> Result<()> {
    let message = message.trim();

    if message.is_empty() {
        return Err(AppError::validation(field::MESSAGE, "Please write your message."));
    }

    if message.chars().count() > CONTACT_MESSAGE_MAX {
        return Err(AppError::validation(
            field::MESSAGE,
            "Message must be at most 500 characters.",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_accepts_basic_shapes() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("  name.surname@example.co  ").is_ok());
        assert!(validate_email("user+tag@mail.example.com.br").is_ok());
    }

    #[test]
    fn email_rejects_missing_parts() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing-at.example.com").is_err());
        assert!(validate_email("missing-dot@example").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spa ce@example.com").is_err());
    }

    #[test]
    fn name_accepts_accented_letters() {
        assert!(validate_name("João Ávila").is_ok());
        assert!(validate_name("Lu").is_ok());
    }

    #[test]
    fn name_rejects_short_or_symbolic_input() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("A").is_err());
        assert!(validate_name("R2D2").is_err());
        assert!(validate_name("ana_souza").is_err());
    }

    #[test]
    fn signup_password_needs_length_and_strength() {
        assert!(validate_new_password("Abcdef12!").is_ok());
        assert!(validate_new_password("Ab1!").is_err());
        // long enough, but only length + lowercase
        assert!(validate_new_password("abcdefgh").is_err());
        assert!(validate_new_password("abcdefg1").is_ok());
    }

    #[test]
    fn login_password_only_needs_six_characters() {
        assert!(validate_login_password("abcdef").is_ok());
        assert!(validate_login_password("abcde").is_err());
        assert!(validate_login_password("").is_err());
    }

    #[test]
    fn confirmation_must_match() {
        assert!(validate_confirmation("Abcdef12!", "Abcdef12!").is_ok());
        assert!(validate_confirmation("Abcdef12!", "").is_err());
        assert!(validate_confirmation("Abcdef12!", "abcdef12!").is_err());
    }

    #[test]
    fn phone_counts_digits_only() {
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("1134567890").is_ok());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("119876543210").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn verification_code_is_six_digits() {
        assert!(validate_verification_code("012345").is_ok());
        assert!(validate_verification_code("12345").is_err());
        assert!(validate_verification_code("12345a").is_err());
        assert!(validate_verification_code("").is_err());
    }

    #[test]
    fn contact_limits_are_enforced() {
        assert!(validate_contact_name(&"a".repeat(50)).is_ok());
        assert!(validate_contact_name(&"a".repeat(51)).is_err());
        assert!(validate_message(&"m".repeat(500)).is_ok());
        assert!(validate_message(&"m".repeat(501)).is_err());
        let long_email = format!("{}@example.com", "a".repeat(95));
        assert!(validate_contact_email(&long_email).is_err());
        assert!(validate_optional_phone("").is_ok());
        assert!(validate_optional_phone("123").is_err());
    }

    #[test]
    fn field_check_carries_message() {
        let check = FieldCheck::from_result(validate_email("nope"));
        assert!(!check.is_valid);
        assert_eq!(check.message, "Enter a valid email (e.g. user@domain.com).");

        let ok = FieldCheck::from_result(validate_email("a@b.com"));
        assert!(ok.is_valid);
        assert!(ok.message.is_empty());
    }
}
