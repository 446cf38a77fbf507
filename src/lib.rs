//! Account core of the CBikeAI site: credentials, sessions, form validation,
//! password strength and password recovery over a device-local key-value store.

pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod code;
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod reset;
}

pub mod handlers {
    pub mod auth;
    pub mod contact;
    pub mod profile;
    pub mod reset;
}

pub mod middleware_layer {
    pub mod in_flight;
}

pub mod storage;

pub mod validation {
    pub mod fields;
    pub mod forms;
    pub mod phone;
    pub mod strength;
}

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
