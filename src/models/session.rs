use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserRecord;

/// How the session was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Email,
    Google,
    Facebook,
    Apple,
}

impl LoginMethod {
    /// Label shown on the profile page.
    pub fn label(&self) -> &'static str {
        match self {
            LoginMethod::Email => "E-mail",
            LoginMethod::Google => "Google",
            LoginMethod::Facebook => "Facebook",
            LoginMethod::Apple => "Apple",
        }
    }
}

/// Third-party identity providers whose callback payload can open a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    Google,
    Facebook,
    Apple,
}

impl From<IdentityProvider> for LoginMethod {
    fn from(provider: IdentityProvider) -> Self {
        match provider {
            IdentityProvider::Google => LoginMethod::Google,
            IdentityProvider::Facebook => LoginMethod::Facebook,
            IdentityProvider::Apple => LoginMethod::Apple,
        }
    }
}

/// The profile handed back by an identity provider after the user signed in there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub provider: IdentityProvider,
    pub email: String,
    pub name: String,
    /// Picture URL, when the provider shares one.
    pub picture: Option<String>,
}

/// Represents the authenticated state of the current device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token minted at login.
    pub token: String,
    /// Copy of the account taken at login time.
    pub user: UserRecord,
    /// Whether the email was kept for prefill.
    pub remember_me: bool,
    pub login_method: LoginMethod,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires. `None` lasts until logout.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Whether the session is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}
