//! Whole-form validation.
//!
//! Each form struct runs the field validators as `garde` custom rules and
//! reports the first failing field as `AppError::ValidationFailed`.

use garde::Validate;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::validation::fields;

fn rule(result: Result<()>) -> garde::Result {
    match result {
        Ok(()) => Ok(()),
        Err(AppError::ValidationFailed { reason, .. }) => Err(garde::Error::new(reason)),
        Err(other) => Err(garde::Error::new(other.to_string())),
    }
}

fn name_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_name(value))
}

fn email_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_email(value))
}

fn new_password_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_new_password(value))
}

fn login_password_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_login_password(value))
}

fn code_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_verification_code(value))
}

fn contact_name_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_contact_name(value))
}

fn contact_email_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_contact_email(value))
}

fn optional_phone_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_optional_phone(value))
}

fn message_rule(value: &str, _ctx: &()) -> garde::Result {
    rule(fields::validate_message(value))
}

fn terms_rule(value: &bool, _ctx: &()) -> garde::Result {
    if *value {
        Ok(())
    } else {
        Err(garde::Error::new(
            "You must accept the Terms of Service and Privacy Policy.",
        ))
    }
}

/// Converts the first entry of a garde report into a `ValidationFailed` error.
fn first_failure(report: garde::Report) -> AppError {
    match report.iter().next() {
        Some((path, error)) => AppError::validation(path.to_string(), error.message()),
        None => AppError::Internal("empty validation report".to_string()),
    }
}

/// A form that can be checked as a whole before submission.
pub trait FormCheck {
    /// Validates every field, returning the first failure.
    fn check(&self) -> Result<()>;
}

/// The account creation form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupForm {
    #[garde(custom(name_rule))]
    pub name: String,
    #[garde(custom(email_rule))]
    pub email: String,
    #[garde(custom(new_password_rule))]
    pub password: String,
    #[garde(skip)]
    pub confirm_password: String,
    #[garde(custom(terms_rule))]
    pub accept_terms: bool,
}

impl FormCheck for SignupForm {
    fn check(&self) -> Result<()> {
        self.validate().map_err(first_failure)?;
        fields::validate_confirmation(&self.password, &self.confirm_password)
    }
}

/// The email/password login form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[garde(custom(email_rule))]
    pub email: String,
    #[garde(custom(login_password_rule))]
    pub password: String,
    #[garde(skip)]
    #[serde(default)]
    pub remember_me: bool,
}

impl FormCheck for LoginForm {
    fn check(&self) -> Result<()> {
        self.validate().map_err(first_failure)
    }
}

/// First step of password recovery.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecoveryRequestForm {
    #[garde(custom(email_rule))]
    pub email: String,
}

impl FormCheck for RecoveryRequestForm {
    fn check(&self) -> Result<()> {
        self.validate().map_err(first_failure)
    }
}

/// Second step of password recovery.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerificationForm {
    #[garde(custom(code_rule))]
    pub code: String,
}

impl FormCheck for VerificationForm {
    fn check(&self) -> Result<()> {
        self.validate().map_err(first_failure)
    }
}

/// Last step of password recovery.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPasswordForm {
    #[garde(custom(new_password_rule))]
    pub password: String,
    #[garde(skip)]
    pub confirm_password: String,
}

impl FormCheck for NewPasswordForm {
    fn check(&self) -> Result<()> {
        self.validate().map_err(first_failure)?;
        fields::validate_confirmation(&self.password, &self.confirm_password)
    }
}

/// The public contact form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactForm {
    #[garde(custom(contact_name_rule))]
    pub name: String,
    #[garde(custom(contact_email_rule))]
    pub email: String,
    #[garde(custom(optional_phone_rule))]
    #[serde(default)]
    pub phone: String,
    #[garde(custom(message_rule))]
    pub message: String,
}

impl FormCheck for ContactForm {
    fn check(&self) -> Result<()> {
        self.validate().map_err(first_failure)
    }
}
