//! Configuration module for the homework board.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Machine key accepted on the JSON API in place of a session
    pub api_key: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Days a login session stays valid without an explicit logout
    pub session_ttl_days: i64,
    /// Seeds the first super admin when the users table is empty
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Rejected settings, logged once tracing is up
    pub warnings: Vec<String>,
}

/// Credentials for the initial super admin account.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
const MAX_SESSION_TTL_DAYS: i64 = 365;

/// Session lifetime from `HW_SESSION_TTL_DAYS`. Unset means the default;
/// a value that is not a whole number of days in `1..=365` falls back to
/// the default with a warning.
fn session_ttl_days(raw: Option<&str>) -> Result<i64, String> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SESSION_TTL_DAYS);
    };
    match raw.trim().parse::<i64>() {
        Ok(days) if (1..=MAX_SESSION_TTL_DAYS).contains(&days) => Ok(days),
        _ => Err(format!(
            "Invalid HW_SESSION_TTL_DAYS {:?} (expected 1..={}), using {} days",
            raw, MAX_SESSION_TTL_DAYS, DEFAULT_SESSION_TTL_DAYS
        )),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_key = env::var("HW_API_KEY").ok().filter(|k| !k.is_empty());

        let db_path = env::var("HW_DB_PATH")
            .unwrap_or_else(|_| "./data/homework.sqlite".to_string())
            .into();

        let bind_addr = env::var("HW_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid HW_BIND_ADDR format");

        let log_level = env::var("HW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut warnings = Vec::new();
        let session_ttl_days = session_ttl_days(env::var("HW_SESSION_TTL_DAYS").ok().as_deref())
            .unwrap_or_else(|warning| {
                warnings.push(warning);
                DEFAULT_SESSION_TTL_DAYS
            });

        let bootstrap_admin = match (
            env::var("HW_BOOTSTRAP_EMAIL"),
            env::var("HW_BOOTSTRAP_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Self {
            api_key,
            db_path,
            bind_addr,
            log_level,
            session_ttl_days,
            bootstrap_admin,
            warnings,
        }
    }
}
