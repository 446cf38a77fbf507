use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    error::Result,
    handlers::auth::FormResponse,
    models::{session::Session, user::default_avatar_url},
    state::AppState,
    validation::fields::{validate_confirmation, validate_name, validate_new_password},
};

/// Preference values shown when the user never chose one.
pub const DEFAULT_PREFERENCES: [(&str, &str); 4] = [
    ("bikeType", "Urbana"),
    ("experienceLevel", "Intermediário"),
    ("preferredDistance", "10-20 km"),
    ("notifications", "Ativas"),
];

/// Everything the profile page renders.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub avatar: String,
    /// `dd/mm/YYYY`.
    pub member_since: String,
    pub login_method: String,
    pub preferences: BTreeMap<String, String>,
}

impl From<&Session> for ProfileView {
    fn from(session: &Session) -> Self {
        let user = &session.user;

        let mut preferences: BTreeMap<String, String> = DEFAULT_PREFERENCES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        preferences.extend(user.preferences.clone());

        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user
                .avatar
                .clone()
                .unwrap_or_else(|| default_avatar_url(&user.name)),
            member_since: user.created_at.format("%d/%m/%Y").to_string(),
            login_method: session.login_method.label().to_string(),
            preferences,
        }
    }
}

/// Drives the profile page of the logged-in user.
#[derive(Clone)]
pub struct ProfileController {
    state: AppState,
}

impl ProfileController {
    /// Creates a new `ProfileController`.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Renders the current session, or `NotAuthenticated`.
    pub fn view(&self) -> Result<ProfileView> {
        let session = self.state.sessions.require_session()?;
        Ok(ProfileView::from(&session))
    }

    /// Merges `preferences` into the profile.
    pub fn save_preferences(&self, preferences: BTreeMap<String, String>) -> Result<ProfileView> {
        let session = self.state.sessions.update_preferences(&preferences)?;
        Ok(ProfileView::from(&session))
    }

    /// Changes the display name and/or avatar.
    pub fn update_profile(&self, name: Option<&str>, avatar: Option<&str>) -> Result<ProfileView> {
        if let Some(name) = name {
            validate_name(name)?;
        }
        let session = self.state.sessions.update_profile(name, avatar)?;
        Ok(ProfileView::from(&session))
    }

    /// Changes the password after re-checking the current one.
    pub fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<FormResponse> {
        validate_new_password(new_password)?;
        validate_confirmation(new_password, confirmation)?;

        self.state
            .sessions
            .change_password(current_password, new_password)?;
        Ok(FormResponse::ok("Password changed successfully."))
    }

    /// Ends the session.
    pub fn logout(&self) -> Result<FormResponse> {
        self.state.sessions.logout()?;
        Ok(FormResponse::ok("You have been logged out."))
    }
}
