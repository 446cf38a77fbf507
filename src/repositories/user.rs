use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    crypto::password::CredentialHasher,
    error::{AppError, Result},
    models::{session::ExternalProfile, user::UserRecord},
    storage::{get_json, keys, set_json, KeyValueStore},
};

/// The collection of registered accounts, keyed by email.
///
/// Records live as one serialized list under `keys::USERS`; lookups are a
/// linear scan.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    hasher: CredentialHasher,
}

impl CredentialStore {
    /// Creates a new `CredentialStore` over `store`.
    pub fn new(store: Arc<dyn KeyValueStore>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    fn load(&self) -> Result<Vec<UserRecord>> {
        Ok(get_json(self.store.as_ref(), keys::USERS)?.unwrap_or_default())
    }

    fn save(&self, users: &[UserRecord]) -> Result<()> {
        set_json(self.store.as_ref(), keys::USERS, users)
    }

    /// Applies `change` to the record registered under `email` and persists it.
    fn modify<F>(&self, email: &str, change: F) -> Result<UserRecord>
    where
        F: FnOnce(&mut UserRecord) -> Result<()>,
    {
        let mut users = self.load()?;
        let user = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or(AppError::NotFound)?;

        change(user)?;
        user.updated_at = Utc::now();
        let updated = user.clone();

        self.save(&users)?;
        Ok(updated)
    }

    /// Every registered record.
    pub fn all(&self) -> Result<Vec<UserRecord>> {
        self.load()
    }

    /// Number of registered records.
    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Finds a user by their email address. Case-sensitive exact match.
    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self.load()?.into_iter().find(|u| u.email == email))
    }

    /// Appends `record` unless its email is already registered.
    pub fn add(&self, record: UserRecord) -> Result<UserRecord> {
        let mut users = self.load()?;

        if users.iter().any(|u| u.email == record.email) {
            tracing::debug!("Duplicate email rejected: {}", record.email);
            return Err(AppError::DuplicateEmail);
        }

        users.push(record.clone());
        self.save(&users)?;

        tracing::info!("✅ User stored with ID: {}", record.id);
        Ok(record)
    }

    /// Hashes `password` and registers a new account.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<UserRecord> {
        if self.find_by_email(email)?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password)?;
        self.add(UserRecord::new(name, email, Some(password_hash)))
    }

    /// Returns the record only if both `email` and `password` match.
    pub fn verify(&self, email: &str, password: &str) -> Result<Option<UserRecord>> {
        let Some(user) = self.find_by_email(email)? else {
            tracing::debug!("No account for {}", email);
            return Ok(None);
        };

        let Some(hash) = user.password_hash.as_deref() else {
            tracing::debug!("Account {} has no password (external login)", user.id);
            return Ok(None);
        };

        if self.hasher.verify(password, hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Replaces the password of the account registered under `email`.
    pub fn update_password(&self, email: &str, new_password: &str) -> Result<UserRecord> {
        let new_hash = self.hasher.hash(new_password)?;
        let user = self.modify(email, |user| {
            user.password_hash = Some(new_hash);
            Ok(())
        })?;

        tracing::info!("✅ Password changed for user: {}", user.id);
        Ok(user)
    }

    /// Updates the display name and/or avatar.
    pub fn update_profile(
        &self,
        email: &str,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserRecord> {
        self.modify(email, |user| {
            if let Some(name) = name {
                user.name = name.trim().to_string();
            }
            if let Some(avatar) = avatar {
                user.avatar = Some(avatar.to_string());
            }
            Ok(())
        })
    }

    /// Merges `preferences` into the stored preference map.
    pub fn update_preferences(
        &self,
        email: &str,
        preferences: &BTreeMap<String, String>,
    ) -> Result<UserRecord> {
        self.modify(email, |user| {
            user.preferences
                .extend(preferences.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(())
        })
    }

    /// Resolves the account for an identity-provider login, creating a
    /// password-less record the first time the email is seen.
    ///
    /// Surrounding whitespace in the email is ignored for both the lookup and
    /// the new record.
    pub fn find_or_create_external(&self, profile: &ExternalProfile) -> Result<UserRecord> {
        let email = profile.email.trim();

        if let Some(existing) = self.find_by_email(email)? {
            if existing.avatar.is_none() && profile.picture.is_some() {
                return self.update_profile(email, None, profile.picture.as_deref());
            }
            return Ok(existing);
        }

        let mut record = UserRecord::new(profile.name.trim(), email, None);
        if let Some(picture) = &profile.picture {
            record.avatar = Some(picture.clone());
        }
        self.add(record)
    }
}
