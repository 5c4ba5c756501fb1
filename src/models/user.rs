//! User profile model. The login email doubles as the primary key.

use serde::{Deserialize, Serialize};

/// Account level. Only `SuperAdmin` may manage other users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "super admin")]
    SuperAdmin,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Admin => "admin",
            Position::SuperAdmin => "super admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Position::Admin),
            "super admin" => Some(Position::SuperAdmin),
            _ => None,
        }
    }
}

/// A user as shown to clients. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub student_id: String,
    pub position: Position,
}

impl UserProfile {
    pub fn is_super_admin(&self) -> bool {
        self.position == Position::SuperAdmin
    }
}

/// Request body for creating or replacing a user, keyed by email.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub position: Position,
    /// New password. Blank keeps the existing one; required for new users.
    #[serde(default)]
    pub password: Option<String>,
}

/// Partial update of the caller's own profile. Position and email are not
/// self-editable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub roll: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Returns the password only if it carries something other than whitespace.
pub fn non_blank(password: &Option<String>) -> Option<&str> {
    password.as_deref().filter(|p| !p.trim().is_empty())
}
