//! Password recovery: email → code → new password.
//!
//! The flow lives only in memory. Dropping it (a page reload) starts over at
//! `RequestEmail`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    config::MAX_RESET_CODE_TTL_SECS,
    crypto::code::VerificationCode,
    error::{AppError, Result},
    repositories::user::CredentialStore,
    validation::fields::{
        validate_confirmation, validate_email, validate_new_password,
        validate_verification_code,
    },
};

/// Delivers verification codes to the user.
pub trait CodeNotifier: Send + Sync {
    fn deliver(&self, email: &str, code: &VerificationCode) -> Result<()>;
}

/// Writes the code to the log. Stands in for a mailer during development.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl CodeNotifier for LogNotifier {
    fn deliver(&self, email: &str, code: &VerificationCode) -> Result<()> {
        tracing::info!("📧 Verification code for {}: {}", email, code.as_str());
        Ok(())
    }
}

/// Keeps the last code sent to each address in memory.
#[derive(Debug, Default, Clone)]
pub struct OutboxNotifier {
    sent: Arc<Mutex<HashMap<String, String>>>,
}

impl OutboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent code delivered to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent.lock().ok()?.get(email).cloned()
    }
}

impl CodeNotifier for OutboxNotifier {
    fn deliver(&self, email: &str, code: &VerificationCode) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| AppError::Internal("outbox lock poisoned".to_string()))?
            .insert(email.to_string(), code.as_str().to_string());
        Ok(())
    }
}

/// Where the recovery currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetStep {
    RequestEmail,
    AwaitingCode,
    SetNewPassword,
    Done,
}

/// One password recovery attempt.
pub struct PasswordResetFlow {
    step: ResetStep,
    email: Option<String>,
    code: Option<VerificationCode>,
    code_issued_at: Option<DateTime<Utc>>,
    countdown: Duration,
    enforce_expiry: bool,
    credentials: CredentialStore,
    notifier: Arc<dyn CodeNotifier>,
}

impl PasswordResetFlow {
    /// Creates a flow in `RequestEmail`.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Accounts whose password is replaced on completion.
    /// * `notifier` - Channel used to send the code.
    /// * `countdown_secs` - Seconds before a code can be resent, clamped to
    ///   `0..=MAX_RESET_CODE_TTL_SECS`.
    /// * `enforce_expiry` - Reject codes submitted after the countdown.
    pub fn new(
        credentials: CredentialStore,
        notifier: Arc<dyn CodeNotifier>,
        countdown_secs: i64,
        enforce_expiry: bool,
    ) -> Self {
        Self {
            step: ResetStep::RequestEmail,
            email: None,
            code: None,
            code_issued_at: None,
            countdown: Duration::seconds(countdown_secs.clamp(0, MAX_RESET_CODE_TTL_SECS)),
            enforce_expiry,
            credentials,
            notifier,
        }
    }

    pub fn step(&self) -> ResetStep {
        self.step
    }

    /// The address the code was sent to.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn expect_step(&self, expected: ResetStep, action: &str) -> Result<()> {
        if self.step != expected {
            return Err(AppError::InvalidTransition(format!(
                "{} while in {:?}",
                action, self.step
            )));
        }
        Ok(())
    }

    fn issue_code(&mut self, email: &str, now: DateTime<Utc>) -> Result<()> {
        let code = VerificationCode::generate();
        self.notifier.deliver(email, &code)?;
        self.code = Some(code);
        self.code_issued_at = Some(now);
        Ok(())
    }

    /// Sends a code to `email` and moves to `AwaitingCode`.
    ///
    /// Any well-formed address is accepted, registered or not.
    pub fn request_code(&mut self, email: &str, now: DateTime<Utc>) -> Result<()> {
        self.expect_step(ResetStep::RequestEmail, "request code")?;
        validate_email(email)?;

        let email = email.trim().to_string();
        self.issue_code(&email, now)?;
        self.email = Some(email);
        self.step = ResetStep::AwaitingCode;

        tracing::info!("✅ Recovery code issued");
        Ok(())
    }

    /// Seconds left before a resend is allowed.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        match self.code_issued_at {
            Some(issued_at) => (issued_at + self.countdown - now).num_seconds().max(0),
            None => 0,
        }
    }

    /// Whether the countdown for the current code has elapsed.
    pub fn is_code_expired(&self, now: DateTime<Utc>) -> bool {
        self.code_issued_at
            .is_some_and(|issued_at| now >= issued_at + self.countdown)
    }

    /// The countdown as `MM:SS`.
    pub fn countdown_display(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining_secs(now);
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }

    /// Issues a fresh code once the countdown has elapsed.
    pub fn resend(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.expect_step(ResetStep::AwaitingCode, "resend")?;

        let remaining_secs = self.remaining_secs(now);
        if remaining_secs > 0 {
            return Err(AppError::ResendUnavailable { remaining_secs });
        }

        let email = self
            .email
            .clone()
            .ok_or_else(|| AppError::Internal("awaiting code without email".to_string()))?;
        self.issue_code(&email, now)?;

        tracing::info!("✅ Recovery code resent");
        Ok(())
    }

    /// Checks the submitted code. A mismatch leaves the flow in `AwaitingCode`.
    pub fn submit_code(&mut self, submitted: &str, now: DateTime<Utc>) -> Result<()> {
        self.expect_step(ResetStep::AwaitingCode, "submit code")?;
        validate_verification_code(submitted)?;

        if self.is_code_expired(now) {
            if self.enforce_expiry {
                return Err(AppError::CodeExpired);
            }
            tracing::debug!("Accepting code after countdown elapsed");
        }

        let matches = self
            .code
            .as_ref()
            .is_some_and(|code| code.matches(submitted));

        if !matches {
            tracing::debug!("Recovery code mismatch");
            return Err(AppError::CodeMismatch);
        }

        self.step = ResetStep::SetNewPassword;
        tracing::info!("✅ Recovery code verified");
        Ok(())
    }

    /// Sets the new password and finishes the flow.
    ///
    /// The stored account, if any, gets the new password; the code and email
    /// are forgotten either way.
    pub fn set_new_password(&mut self, password: &str, confirmation: &str) -> Result<()> {
        self.expect_step(ResetStep::SetNewPassword, "set password")?;
        validate_new_password(password)?;
        validate_confirmation(password, confirmation)?;

        let email = self
            .email
            .take()
            .ok_or_else(|| AppError::Internal("reset without email".to_string()))?;

        match self.credentials.update_password(&email, password) {
            Ok(_) | Err(AppError::NotFound) => {}
            Err(e) => {
                self.email = Some(email);
                return Err(e);
            }
        }

        self.code = None;
        self.code_issued_at = None;
        self.step = ResetStep::Done;

        tracing::info!("✅ Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashCost;
    use crate::crypto::password::CredentialHasher;
    use crate::storage::MemoryStore;

    fn flow_with(enforce_expiry: bool) -> (PasswordResetFlow, OutboxNotifier, CredentialStore) {
        let credentials = CredentialStore::new(
            Arc::new(MemoryStore::new()),
            CredentialHasher::new(HashCost::minimal()),
        );
        let outbox = OutboxNotifier::new();
        let flow = PasswordResetFlow::new(
            credentials.clone(),
            Arc::new(outbox.clone()),
            300,
            enforce_expiry,
        );
        (flow, outbox, credentials)
    }

    fn wrong_code(right: &str) -> &'static str {
        if right == "000000" { "111111" } else { "000000" }
    }

    #[test]
    fn full_recovery_scenario() {
        let (mut flow, outbox, _) = flow_with(false);
        let now = Utc::now();

        flow.request_code("a@b.com", now).unwrap();
        assert_eq!(flow.step(), ResetStep::AwaitingCode);
        let code = outbox.last_code_for("a@b.com").unwrap();
        assert_eq!(code.len(), 6);

        let result = flow.submit_code(wrong_code(&code), now);
        assert!(matches!(result, Err(AppError::CodeMismatch)));
        assert_eq!(flow.step(), ResetStep::AwaitingCode);

        flow.submit_code(&code, now).unwrap();
        assert_eq!(flow.step(), ResetStep::SetNewPassword);

        flow.set_new_password("Abcdef12!", "Abcdef12!").unwrap();
        assert_eq!(flow.step(), ResetStep::Done);
        assert!(flow.email().is_none());
    }

    #[test]
    fn invalid_email_keeps_first_step() {
        let (mut flow, _, _) = flow_with(false);
        let result = flow.request_code("not-an-email", Utc::now());
        assert!(matches!(result, Err(AppError::ValidationFailed { .. })));
        assert_eq!(flow.step(), ResetStep::RequestEmail);
    }

    #[test]
    fn resend_waits_for_countdown() {
        let (mut flow, outbox, _) = flow_with(false);
        let start = Utc::now();
        flow.request_code("a@b.com", start).unwrap();

        let early = flow.resend(start + Duration::seconds(100));
        assert!(matches!(early, Err(AppError::ResendUnavailable { remaining_secs: 200 })));
        assert_eq!(flow.countdown_display(start + Duration::seconds(100)), "03:20");

        let later = start + Duration::seconds(300);
        flow.resend(later).unwrap();
        assert_eq!(flow.countdown_display(later), "05:00");
        assert!(outbox.last_code_for("a@b.com").is_some());
    }

    #[test]
    fn expired_code_still_accepted_unless_enforced() {
        let start = Utc::now();
        let late = start + Duration::seconds(301);

        let (mut lenient, outbox, _) = flow_with(false);
        lenient.request_code("a@b.com", start).unwrap();
        let code = outbox.last_code_for("a@b.com").unwrap();
        assert!(lenient.is_code_expired(late));
        lenient.submit_code(&code, late).unwrap();
        assert_eq!(lenient.step(), ResetStep::SetNewPassword);

        let (mut strict, outbox, _) = flow_with(true);
        strict.request_code("a@b.com", start).unwrap();
        let code = outbox.last_code_for("a@b.com").unwrap();
        assert!(matches!(strict.submit_code(&code, late), Err(AppError::CodeExpired)));
        assert_eq!(strict.step(), ResetStep::AwaitingCode);
    }

    #[test]
    fn weak_or_mismatched_password_keeps_step() {
        let (mut flow, outbox, _) = flow_with(false);
        let now = Utc::now();
        flow.request_code("a@b.com", now).unwrap();
        let code = outbox.last_code_for("a@b.com").unwrap();
        flow.submit_code(&code, now).unwrap();

        assert!(flow.set_new_password("abc", "abc").is_err());
        assert!(flow.set_new_password("Abcdef12!", "Abcdef12?").is_err());
        assert_eq!(flow.step(), ResetStep::SetNewPassword);
    }

    #[test]
    fn completion_updates_stored_password() {
        let (mut flow, outbox, credentials) = flow_with(false);
        credentials.register("Ana", "a@b.com", "Secret1!").unwrap();
        let now = Utc::now();

        flow.request_code("a@b.com", now).unwrap();
        let code = outbox.last_code_for("a@b.com").unwrap();
        flow.submit_code(&code, now).unwrap();
        flow.set_new_password("Abcdef12!", "Abcdef12!").unwrap();

        assert!(credentials.verify("a@b.com", "Abcdef12!").unwrap().is_some());
        assert!(credentials.verify("a@b.com", "Secret1!").unwrap().is_none());
    }

    #[test]
    fn done_is_terminal() {
        let (mut flow, outbox, _) = flow_with(false);
        let now = Utc::now();
        flow.request_code("a@b.com", now).unwrap();
        let code = outbox.last_code_for("a@b.com").unwrap();
        flow.submit_code(&code, now).unwrap();
        flow.set_new_password("Abcdef12!", "Abcdef12!").unwrap();

        assert!(matches!(
            flow.request_code("a@b.com", now),
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(flow.submit_code(&code, now), Err(AppError::InvalidTransition(_))));
        assert_eq!(flow.step(), ResetStep::Done);
    }

    #[test]
    fn oversized_countdown_is_clamped() {
        let credentials = CredentialStore::new(
            Arc::new(MemoryStore::new()),
            CredentialHasher::new(HashCost::minimal()),
        );
        let mut flow =
            PasswordResetFlow::new(credentials, Arc::new(OutboxNotifier::new()), i64::MAX, false);
        let now = Utc::now();

        flow.request_code("a@b.com", now).unwrap();
        assert_eq!(flow.remaining_secs(now), MAX_RESET_CODE_TTL_SECS);
    }

    #[test]
    fn code_cannot_be_submitted_before_request() {
        let (mut flow, _, _) = flow_with(false);
        let result = flow.submit_code("123456", Utc::now());
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }
}
