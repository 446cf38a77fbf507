use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    crypto::token::{generate_session_token, tokens_match},
    error::{AppError, Result},
    models::{
        session::{ExternalProfile, LoginMethod, Session},
        user::UserRecord,
    },
    repositories::user::CredentialStore,
    storage::{get_json, keys, set_json, KeyValueStore},
};

/// Opens, reads and closes the device's session.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    credentials: CredentialStore,
    /// Zero keeps sessions until logout.
    session_duration_days: i64,
}

impl SessionManager {
    /// Creates a new `SessionManager`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        credentials: CredentialStore,
        session_duration_days: i64,
    ) -> Self {
        Self {
            store,
            credentials,
            session_duration_days,
        }
    }

    /// The credential store sessions are checked against.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Mints a token and persists a session for `user`.
    fn open_session(
        &self,
        user: &UserRecord,
        remember_me: bool,
        login_method: LoginMethod,
    ) -> Result<Session> {
        let created_at = Utc::now();
        let expires_at = if self.session_duration_days > 0 {
            let expires_at = Duration::try_days(self.session_duration_days)
                .and_then(|lifetime| created_at.checked_add_signed(lifetime))
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "session duration of {} days is out of range",
                        self.session_duration_days
                    ))
                })?;
            Some(expires_at)
        } else {
            None
        };

        let session = Session {
            token: generate_session_token()?,
            user: user.snapshot(),
            remember_me,
            login_method,
            created_at,
            expires_at,
        };

        set_json(self.store.as_ref(), keys::SESSION, &session)?;
        set_json(self.store.as_ref(), keys::PREFERENCES, &user.preferences)?;

        tracing::info!("✅ Session opened for user: {}", user.id);
        Ok(session)
    }

    /// Checks the credentials and opens a session.
    ///
    /// # Arguments
    ///
    /// * `email` - The account email.
    /// * `password` - The claimed password.
    /// * `remember_me` - Keep the email for prefill on the next visit.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `Session`, or `InvalidCredentials`.
    pub fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<Session> {
        tracing::debug!("🔐 Authenticating user: {}", email);

        let user = self
            .credentials
            .verify(email, password)?
            .ok_or(AppError::InvalidCredentials)?;

        let session = self.open_session(&user, remember_me, LoginMethod::Email)?;

        if remember_me {
            self.store.set(keys::SAVED_EMAIL, &user.email)?;
            self.store.set(keys::REMEMBER_ME, "true")?;
        } else {
            self.store.remove(keys::SAVED_EMAIL)?;
            self.store.remove(keys::REMEMBER_ME)?;
        }

        tracing::info!("✅ User logged in: {}", user.id);
        Ok(session)
    }

    /// Registers a new account and logs it in.
    pub fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        tracing::debug!("🔐 Creating user: {}", email);

        let user = self.credentials.register(name, email, password)?;
        let session = self.open_session(&user, false, LoginMethod::Email)?;

        tracing::info!("✅ User registered: {}", user.id);
        Ok(session)
    }

    /// Opens a session from an identity provider's callback payload.
    ///
    /// The provider already authenticated the user, so no password is checked.
    pub fn login_external(&self, profile: &ExternalProfile) -> Result<Session> {
        tracing::debug!("🔐 External login via {:?}: {}", profile.provider, profile.email);

        let user = self.credentials.find_or_create_external(profile)?;
        let session = self.open_session(&user, false, profile.provider.into())?;

        tracing::info!("✅ User logged in via {:?}: {}", profile.provider, user.id);
        Ok(session)
    }

    /// Reads the persisted session. Expired sessions are removed and reported as absent.
    pub fn current_session(&self) -> Result<Option<Session>> {
        let Some(session) = get_json::<Session>(self.store.as_ref(), keys::SESSION)? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            tracing::info!("⌛ Session expired for user: {}", session.user.id);
            self.store.remove(keys::SESSION)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// The current session, or `NotAuthenticated`.
    pub fn require_session(&self) -> Result<Session> {
        self.current_session()?.ok_or(AppError::NotAuthenticated)
    }

    /// Whether `token` is the token of the live session.
    pub fn is_current_token(&self, token: &str) -> Result<bool> {
        Ok(self
            .current_session()?
            .is_some_and(|session| tokens_match(&session.token, token)))
    }

    /// Clears the session.
    ///
    /// Device preferences stay. The remembered email stays only when
    /// remember-me was requested at login.
    pub fn logout(&self) -> Result<()> {
        let session = get_json::<Session>(self.store.as_ref(), keys::SESSION)?;

        self.store.remove(keys::SESSION)?;

        match session {
            Some(session) => {
                if !session.remember_me {
                    self.store.remove(keys::SAVED_EMAIL)?;
                    self.store.remove(keys::REMEMBER_ME)?;
                }
                tracing::info!("✅ User logged out: {}", session.user.id);
            }
            None => tracing::debug!("Logout without an active session"),
        }

        Ok(())
    }

    /// The email to prefill on the login form, when remember-me was used.
    pub fn saved_email(&self) -> Result<Option<String>> {
        let remembered = self.store.get(keys::REMEMBER_ME)?.as_deref() == Some("true");
        if !remembered {
            return Ok(None);
        }
        self.store.get(keys::SAVED_EMAIL)
    }

    /// Changes the password of the logged-in user after re-checking the current one.
    pub fn change_password(&self, current_password: &str, new_password: &str) -> Result<()> {
        let session = self.require_session()?;
        tracing::info!("🔑 Changing password for user: {}", session.user.id);

        if self
            .credentials
            .verify(&session.user.email, current_password)?
            .is_none()
        {
            return Err(AppError::InvalidCredentials);
        }

        self.credentials
            .update_password(&session.user.email, new_password)?;
        Ok(())
    }

    /// Preferences kept on this device, surviving logout.
    pub fn device_preferences(&self) -> Result<BTreeMap<String, String>> {
        Ok(get_json(self.store.as_ref(), keys::PREFERENCES)?.unwrap_or_default())
    }

    /// Merges `preferences` into the logged-in user's record and the device copy,
    /// and refreshes the session snapshot.
    pub fn update_preferences(&self, preferences: &BTreeMap<String, String>) -> Result<Session> {
        let mut session = self.require_session()?;

        let user = self
            .credentials
            .update_preferences(&session.user.email, preferences)?;

        set_json(self.store.as_ref(), keys::PREFERENCES, &user.preferences)?;
        session.user = user.snapshot();
        set_json(self.store.as_ref(), keys::SESSION, &session)?;

        tracing::info!("✅ Preferences updated for user: {}", user.id);
        Ok(session)
    }

    /// Updates the logged-in user's name and/or avatar and refreshes the snapshot.
    pub fn update_profile(&self, name: Option<&str>, avatar: Option<&str>) -> Result<Session> {
        let mut session = self.require_session()?;

        let user = self
            .credentials
            .update_profile(&session.user.email, name, avatar)?;

        session.user = user.snapshot();
        set_json(self.store.as_ref(), keys::SESSION, &session)?;
        Ok(session)
    }
}
