use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::{
    error::{AppError, Result},
    handlers::auth::FormResponse,
    middleware_layer::in_flight::InFlightGuard,
    services::reset::{PasswordResetFlow, ResetStep},
    state::AppState,
    validation::forms::{FormCheck, NewPasswordForm, RecoveryRequestForm, VerificationForm},
};

/// Drives the three-step "forgot password" page.
#[derive(Clone)]
pub struct ResetController {
    state: AppState,
    flow: Arc<Mutex<PasswordResetFlow>>,
    guard: InFlightGuard,
}

impl ResetController {
    /// Creates a new `ResetController` with a fresh flow.
    pub fn new(state: AppState) -> Self {
        let flow = state.new_reset_flow();
        Self {
            state,
            flow: Arc::new(Mutex::new(flow)),
            guard: InFlightGuard::new(),
        }
    }

    fn with_flow<T>(&self, action: impl FnOnce(&mut PasswordResetFlow) -> Result<T>) -> Result<T> {
        let mut flow = self
            .flow
            .lock()
            .map_err(|_| AppError::Internal("reset flow lock poisoned".to_string()))?;
        action(&mut flow)
    }

    /// The current step.
    pub fn step(&self) -> Result<ResetStep> {
        self.with_flow(|flow| Ok(flow.step()))
    }

    /// Seconds until a new code can be requested.
    pub fn remaining_secs(&self) -> Result<i64> {
        self.with_flow(|flow| Ok(flow.remaining_secs(Utc::now())))
    }

    /// The resend countdown as `MM:SS`.
    pub fn countdown(&self) -> Result<String> {
        self.with_flow(|flow| Ok(flow.countdown_display(Utc::now())))
    }

    /// Throws the current attempt away and starts over at `RequestEmail`.
    pub fn restart(&self) -> Result<()> {
        let fresh = self.state.new_reset_flow();
        self.with_flow(|flow| {
            *flow = fresh;
            Ok(())
        })
    }

    /// Handles the email step.
    pub async fn request_code(&self, form: RecoveryRequestForm) -> Result<FormResponse> {
        tracing::info!("🔑 Password recovery requested for: {}", form.email);
        form.check()?;

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.reset_request).await;

        self.with_flow(|flow| flow.request_code(&form.email, Utc::now()))?;
        Ok(FormResponse::ok(format!(
            "We sent a verification code to {}.",
            form.email.trim()
        )))
    }

    /// Sends another code once the countdown has elapsed.
    pub async fn resend(&self) -> Result<FormResponse> {
        let remaining_secs = self.remaining_secs()?;
        if remaining_secs > 0 {
            return Err(AppError::ResendUnavailable { remaining_secs });
        }

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.reset_request).await;

        self.with_flow(|flow| flow.resend(Utc::now()))?;
        Ok(FormResponse::ok("A new code was sent to your email."))
    }

    /// Handles the code step.
    pub async fn verify_code(&self, form: VerificationForm) -> Result<FormResponse> {
        form.check()?;

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.reset_verify).await;

        self.with_flow(|flow| flow.submit_code(form.code.trim(), Utc::now()))?;
        Ok(FormResponse::ok("Code verified. Choose a new password."))
    }

    /// Handles the new password step.
    pub async fn set_new_password(&self, form: NewPasswordForm) -> Result<FormResponse> {
        form.check()?;

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.reset_password).await;

        self.with_flow(|flow| flow.set_new_password(&form.password, &form.confirm_password))?;
        Ok(FormResponse::ok(
            "Password changed successfully! You can now log in.",
        ))
    }
}
