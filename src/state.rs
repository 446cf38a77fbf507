use std::sync::Arc;

use crate::config::Config;
use crate::crypto::password::CredentialHasher;
use crate::error::Result;
use crate::repositories::user::CredentialStore;
use crate::services::auth::SessionManager;
use crate::services::reset::{CodeNotifier, LogNotifier, PasswordResetFlow};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The device-local key-value store.
    pub store: Arc<dyn KeyValueStore>,
    /// The application's configuration.
    pub config: Config,
    /// Registered accounts.
    pub credentials: CredentialStore,
    /// The active session.
    pub sessions: SessionManager,
    /// Where recovery codes are sent.
    pub notifier: Arc<dyn CodeNotifier>,
}

impl AppState {
    /// Creates a new `AppState` backed by the JSON file at `config.store_path`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.store_path)?;
        tracing::info!("✅ Store opened at {}", store.path().display());

        Ok(Self::with_store(config, Arc::new(store), Arc::new(LogNotifier)))
    }

    /// Creates an `AppState` that keeps everything in memory.
    pub fn in_memory(config: &Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()), Arc::new(LogNotifier))
    }

    /// Wires the services over an existing store and notifier.
    pub fn with_store(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn CodeNotifier>,
    ) -> Self {
        let credentials = CredentialStore::new(
            Arc::clone(&store),
            CredentialHasher::new(config.hash_cost),
        );
        let sessions = SessionManager::new(
            Arc::clone(&store),
            credentials.clone(),
            config.session_duration_days,
        );

        AppState {
            store,
            config: config.clone(),
            credentials,
            sessions,
            notifier,
        }
    }

    /// Starts a fresh password recovery.
    pub fn new_reset_flow(&self) -> PasswordResetFlow {
        PasswordResetFlow::new(
            self.credentials.clone(),
            Arc::clone(&self.notifier),
            self.config.reset_code_ttl_secs,
            self.config.reset_enforce_expiry,
        )
    }
}
