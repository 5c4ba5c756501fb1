//! Sign-in, sessions and the API key check.
//!
//! Passwords are stored as argon2 PHC strings. The API key is compared in
//! constant time to mitigate timing attacks.

mod gate;

pub use gate::*;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::config::BootstrapAdmin;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Position, UpsertUserRequest};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "hw_session";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Check email and password and open a session. Returns the session token.
pub async fn sign_in(
    repo: &Repository,
    email: &str,
    password: &str,
    ttl_days: i64,
) -> Result<String, AppError> {
    let email = email.trim();
    let stored = repo.get_password_hash(email).await?;

    match stored {
        Some(hash) if verify_password(password, &hash) => {
            let token = repo.create_session(email, ttl_days).await?;
            tracing::info!(email, "Signed in");
            Ok(token)
        }
        _ => {
            tracing::info!(email, "Rejected sign-in");
            Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ))
        }
    }
}

pub async fn sign_out(repo: &Repository, token: &str) -> Result<(), AppError> {
    repo.delete_session(token).await
}

/// Create the configured super admin if there are no users at all.
pub async fn bootstrap_admin(repo: &Repository, admin: &BootstrapAdmin) -> Result<bool, AppError> {
    if repo.count_users().await? > 0 {
        return Ok(false);
    }

    let request = UpsertUserRequest {
        full_name: "Administrator".to_string(),
        roll: String::new(),
        student_id: String::new(),
        position: Position::SuperAdmin,
        password: None,
    };
    let hash = hash_password(&admin.password)?;
    repo.upsert_user(&admin.email, &request, Some(&hash)).await?;
    tracing::info!(email = %admin.email, "Created bootstrap super admin");
    Ok(true)
}

/// `Set-Cookie` value opening a session.
pub fn session_cookie(token: &str, ttl_days: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl_days.saturating_mul(24 * 60 * 60)
    )
}

/// `Set-Cookie` value dropping the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

/// Value of cookie `name` from the request headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

/// API key from `x-api-key` or a bearer token.
pub fn provided_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

/// True if a key is configured and the request carries it.
pub fn api_key_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    match (expected, provided_api_key(headers)) {
        (Some(expected), Some(provided)) => constant_time_compare(provided, expected),
        _ => false,
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
