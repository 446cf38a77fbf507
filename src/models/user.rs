use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base URL of the generated-initials avatar service used when a user has no picture.
const AVATAR_SERVICE_URL: &str = "https://ui-avatars.com/api/";

/// Represents a registered account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// The unique identifier for the user.
    pub id: Uuid,
    /// The user's display name.
    pub name: String,
    /// The user's email address. Unique across records.
    pub email: String,
    /// Argon2id PHC string. `None` for accounts created through an identity provider.
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Picture URL, either from the identity provider or generated from the name.
    #[serde(default)]
    pub avatar: Option<String>,
    /// The timestamp when the user was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Free-form profile preferences (`bikeType`, `experienceLevel`, ...).
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

impl UserRecord {
    /// Builds a fresh record stamped with the current time.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: Option<String>) -> Self {
        let now = Utc::now();
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            avatar: Some(default_avatar_url(&name)),
            name,
            email: email.into(),
            password_hash,
            created_at: now,
            updated_at: now,
            preferences: BTreeMap::new(),
        }
    }

    /// A copy safe to keep in a session: the password hash is dropped.
    pub fn snapshot(&self) -> Self {
        Self {
            password_hash: None,
            ..self.clone()
        }
    }
}

/// Generated-initials avatar for `name`.
pub fn default_avatar_url(name: &str) -> String {
    match url::Url::parse_with_params(
        AVATAR_SERVICE_URL,
        &[("name", name), ("background", "09e331"), ("color", "000"), ("size", "200")],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => AVATAR_SERVICE_URL.to_string(),
    }
}
