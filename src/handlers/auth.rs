use serde::Serialize;

use crate::{
    error::Result,
    middleware_layer::in_flight::InFlightGuard,
    models::session::ExternalProfile,
    state::AppState,
    validation::fields::validate_email,
    validation::forms::{FormCheck, LoginForm, SignupForm},
};

/// The response payload for a successful form submission.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FormResponse {
    pub success: bool,
    pub message: String,
}

impl FormResponse {
    /// A successful response carrying `message`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Drives the login form.
#[derive(Clone)]
pub struct LoginController {
    state: AppState,
    guard: InFlightGuard,
}

impl LoginController {
    /// Creates a new `LoginController`.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            guard: InFlightGuard::new(),
        }
    }

    /// The email to prefill, if the last login asked to be remembered.
    pub fn prefill(&self) -> Result<Option<String>> {
        self.state.sessions.saved_email()
    }

    /// Whether a submission is running.
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Handles user login.
    ///
    /// # Arguments
    ///
    /// * `form` - The submitted login form.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `FormResponse`, or the first validation
    /// failure, `InvalidCredentials` or `Busy`.
    pub async fn submit(&self, form: LoginForm) -> Result<FormResponse> {
        tracing::info!("🔐 Login attempt for: {}", form.email);
        form.check()?;

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.login).await;

        let session = self
            .state
            .sessions
            .login(form.email.trim(), &form.password, form.remember_me)?;

        tracing::info!("✅ Login succeeded: {}", session.user.id);
        Ok(FormResponse::ok(format!("Welcome back, {}!", session.user.name)))
    }
}

/// Drives the account creation form.
#[derive(Clone)]
pub struct SignupController {
    state: AppState,
    guard: InFlightGuard,
}

impl SignupController {
    /// Creates a new `SignupController`.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            guard: InFlightGuard::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Handles user registration. The new account is logged in right away.
    pub async fn submit(&self, form: SignupForm) -> Result<FormResponse> {
        tracing::info!("📝 Signup attempt for: {}", form.email);
        form.check()?;
        tracing::debug!("✅ Validations passed for: {}", form.email);

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.signup).await;

        let session = self
            .state
            .sessions
            .signup(form.name.trim(), form.email.trim(), &form.password)?;

        tracing::info!("✅ User registered: {}", session.user.id);
        Ok(FormResponse::ok(format!(
            "Account created successfully! Welcome to CBikeAI, {}.",
            session.user.name
        )))
    }
}

/// Completes logins that went through Google, Facebook or Apple.
#[derive(Clone)]
pub struct SocialLoginController {
    state: AppState,
    guard: InFlightGuard,
}

impl SocialLoginController {
    /// Creates a new `SocialLoginController`.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            guard: InFlightGuard::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Opens a session from the provider's callback payload.
    pub async fn complete(&self, mut profile: ExternalProfile) -> Result<FormResponse> {
        tracing::info!("🔐 {:?} login for: {}", profile.provider, profile.email);
        validate_email(&profile.email)?;
        profile.email = profile.email.trim().to_string();

        let _permit = self.guard.acquire()?;
        tokio::time::sleep(self.state.config.latency.social).await;

        let session = self.state.sessions.login_external(&profile)?;

        Ok(FormResponse::ok(format!(
            "Logged in with {}.",
            session.login_method.label()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::AppError;
    use crate::models::session::{IdentityProvider, LoginMethod};
    use std::time::Duration;

    fn state() -> AppState {
        AppState::in_memory(&Config::instant())
    }

    fn signup_form(email: &str) -> SignupForm {
        SignupForm {
            name: "Ana Souza".to_string(),
            email: email.to_string(),
            password: "Abcdef12!".to_string(),
            confirm_password: "Abcdef12!".to_string(),
            accept_terms: true,
        }
    }

    fn login_form(email: &str, password: &str, remember_me: bool) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
            remember_me,
        }
    }

    #[tokio::test]
    async fn signup_then_login_with_remember_me() {
        let state = state();
        let signup = SignupController::new(state.clone());
        let login = LoginController::new(state.clone());

        let response = signup.submit(signup_form("ana@example.com")).await.unwrap();
        assert!(response.success);

        state.sessions.logout().unwrap();
        login
            .submit(login_form("ana@example.com", "Abcdef12!", true))
            .await
            .unwrap();

        assert_eq!(login.prefill().unwrap().as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let signup = SignupController::new(state());
        signup.submit(signup_form("ana@example.com")).await.unwrap();

        let result = signup.submit(signup_form("ana@example.com")).await;
        assert!(matches!(result, Err(AppError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let state = state();
        SignupController::new(state.clone())
            .submit(signup_form("ana@example.com"))
            .await
            .unwrap();

        let result = LoginController::new(state)
            .submit(login_form("ana@example.com", "Wrong123!", false))
            .await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_store() {
        let state = state();
        let mut form = signup_form("ana@example.com");
        form.accept_terms = false;

        let result = SignupController::new(state.clone()).submit(form).await;
        assert!(matches!(result, Err(AppError::ValidationFailed { .. })));
        assert_eq!(state.credentials.count().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn double_submission_is_busy() {
        let mut config = Config::instant();
        config.latency.signup = Duration::from_millis(2000);
        let signup = SignupController::new(AppState::in_memory(&config));

        let first = tokio::spawn({
            let signup = signup.clone();
            async move { signup.submit(signup_form("ana@example.com")).await }
        });
        tokio::task::yield_now().await;

        assert!(signup.is_busy());
        let second = signup.submit(signup_form("bia@example.com")).await;
        assert!(matches!(second, Err(AppError::Busy)));

        assert!(first.await.unwrap().is_ok());
        assert!(!signup.is_busy());
    }

    #[tokio::test]
    async fn social_login_records_provider() {
        let state = state();
        let social = SocialLoginController::new(state.clone());

        let response = social
            .complete(ExternalProfile {
                provider: IdentityProvider::Apple,
                email: "ana@icloud.com".to_string(),
                name: "Ana".to_string(),
                picture: None,
            })
            .await
            .unwrap();

        assert_eq!(response.message, "Logged in with Apple.");
        let session = state.sessions.require_session().unwrap();
        assert_eq!(session.login_method, LoginMethod::Apple);
    }

    #[tokio::test]
    async fn repeated_social_login_with_padded_email_reuses_account() {
        let state = state();
        let social = SocialLoginController::new(state.clone());
        let profile = ExternalProfile {
            provider: IdentityProvider::Google,
            email: " ana@gmail.com ".to_string(),
            name: "Ana".to_string(),
            picture: None,
        };

        social.complete(profile.clone()).await.unwrap();
        state.sessions.logout().unwrap();
        let second = social.complete(profile).await.unwrap();

        assert_eq!(second.message, "Logged in with Google.");
        assert_eq!(state.credentials.count().unwrap(), 1);
        let session = state.sessions.require_session().unwrap();
        assert_eq!(session.user.email, "ana@gmail.com");
    }
}
