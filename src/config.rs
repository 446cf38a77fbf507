use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

/// Simulated latency for each kind of form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Latency {
    pub login: Duration,
    pub signup: Duration,
    pub social: Duration,
    pub reset_request: Duration,
    pub reset_verify: Duration,
    pub reset_password: Duration,
}

impl Latency {
    /// The same delay for every submission.
    pub fn uniform(delay: Duration) -> Self {
        Self {
            login: delay,
            signup: delay,
            social: delay,
            reset_request: delay,
            reset_verify: delay,
            reset_password: delay,
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            login: Duration::from_millis(1500),
            signup: Duration::from_millis(2000),
            social: Duration::from_millis(1500),
            reset_request: Duration::from_millis(2000),
            reset_verify: Duration::from_millis(1500),
            reset_password: Duration::from_millis(2000),
        }
    }
}

/// Argon2id cost parameters used when hashing new passwords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 3,
            parallelism: 6,
        }
    }
}

impl HashCost {
    /// Minimal cost, for tests and throwaway stores.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Longest accepted session lifetime, in days.
pub const MAX_SESSION_DURATION_DAYS: i64 = 3650;
/// Longest accepted reset countdown, in seconds.
pub const MAX_RESET_CODE_TTL_SECS: i64 = 86_400;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Path of the JSON file backing the key-value store.
    pub store_path: PathBuf,
    /// The duration of a session in days. Zero keeps sessions until logout.
    pub session_duration_days: i64,
    /// Seconds before a reset code can be resent.
    pub reset_code_ttl_secs: i64,
    /// Reject correct codes submitted after the countdown elapsed.
    pub reset_enforce_expiry: bool,
    /// Delays applied by the form controllers.
    pub latency: Latency,
    /// Password hashing cost.
    pub hash_cost: HashCost,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("cbikeai-store.json"),
            session_duration_days: 7,
            reset_code_ttl_secs: 300,
            reset_enforce_expiry: false,
            latency: Latency::default(),
            hash_cost: HashCost::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Unset variables fall back to the defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let latency = match env::var("SIMULATED_LATENCY_MS") {
            Ok(raw) => {
                let millis: u64 = raw.parse().context("Invalid SIMULATED_LATENCY_MS")?;
                Latency::uniform(Duration::from_millis(millis))
            }
            Err(_) => defaults.latency,
        };

        let session_duration_days =
            parse_session_duration_days(env::var("SESSION_DURATION_DAYS").ok().as_deref())?;
        let reset_code_ttl_secs =
            parse_reset_code_ttl_secs(env::var("RESET_CODE_TTL_SECS").ok().as_deref())?;

        Ok(Self {
            store_path: env::var("CBIKEAI_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            session_duration_days,
            reset_code_ttl_secs,
            reset_enforce_expiry: env::var("RESET_ENFORCE_EXPIRY")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            latency,
            hash_cost: defaults.hash_cost,
        })
    }

    /// A configuration with no simulated latency and cheap hashing, for tests
    /// and scripted use.
    pub fn instant() -> Self {
        Self {
            latency: Latency::uniform(Duration::ZERO),
            hash_cost: HashCost::minimal(),
            ..Self::default()
        }
    }
}

/// Reads `SESSION_DURATION_DAYS`, defaulting to 7.
fn parse_session_duration_days(raw: Option<&str>) -> Result<i64> {
    let days: i64 = raw
        .unwrap_or("7")
        .trim()
        .parse()
        .context("Invalid SESSION_DURATION_DAYS")?;

    if !(0..=MAX_SESSION_DURATION_DAYS).contains(&days) {
        anyhow::bail!(
            "SESSION_DURATION_DAYS must be between 0 and {}",
            MAX_SESSION_DURATION_DAYS
        );
    }
    Ok(days)
}

/// Reads `RESET_CODE_TTL_SECS`, defaulting to 300.
fn parse_reset_code_ttl_secs(raw: Option<&str>) -> Result<i64> {
    let secs: i64 = raw
        .unwrap_or("300")
        .trim()
        .parse()
        .context("Invalid RESET_CODE_TTL_SECS")?;

    if !(0..=MAX_RESET_CODE_TTL_SECS).contains(&secs) {
        anyhow::bail!(
            "RESET_CODE_TTL_SECS must be between 0 and {}",
            MAX_RESET_CODE_TTL_SECS
        );
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_site_behaviour() {
        let config = Config::default();
        assert_eq!(config.reset_code_ttl_secs, 300);
        assert_eq!(config.session_duration_days, 7);
        assert!(!config.reset_enforce_expiry);
        assert_eq!(config.latency.login, Duration::from_millis(1500));
    }

    #[test]
    fn instant_config_has_no_delay() {
        let config = Config::instant();
        assert_eq!(config.latency, Latency::uniform(Duration::ZERO));
    }

    #[test]
    fn session_duration_must_stay_in_range() {
        assert_eq!(parse_session_duration_days(None).unwrap(), 7);
        assert_eq!(parse_session_duration_days(Some("0")).unwrap(), 0);
        assert_eq!(parse_session_duration_days(Some("3650")).unwrap(), 3650);
        assert!(parse_session_duration_days(Some("-1")).is_err());
        assert!(parse_session_duration_days(Some("3651")).is_err());
        assert!(parse_session_duration_days(Some("4611686018427387903")).is_err());
        assert!(parse_session_duration_days(Some("seven")).is_err());
    }

    #[test]
    fn reset_ttl_must_stay_in_range() {
        assert_eq!(parse_reset_code_ttl_secs(None).unwrap(), 300);
        assert_eq!(parse_reset_code_ttl_secs(Some("60")).unwrap(), 60);
        assert!(parse_reset_code_ttl_secs(Some("-5")).is_err());
        assert!(parse_reset_code_ttl_secs(Some("86401")).is_err());
        assert!(parse_reset_code_ttl_secs(Some("9223372036854775807")).is_err());
    }
}
