//! Admin mutations shared by the HTML forms and the JSON API.
//!
//! Each operation is one store call. Nothing is retried or rolled back; the
//! new state reaches readers only through the republished snapshot.

use crate::auth::hash_password;
use crate::errors::AppError;
use crate::feed::{refresh_homework, refresh_users};
use crate::models::{
    non_blank, HomeworkEntry, HomeworkInput, UpdateProfileRequest, UpsertUserRequest,
    UserProfile,
};
use crate::AppState;

async fn publish_homework(state: &AppState) {
    if let Err(e) = refresh_homework(&state.repo, &state.feed).await {
        tracing::warn!("Failed to publish homework snapshot: {}", e);
    }
}

async fn publish_users(state: &AppState) {
    if let Err(e) = refresh_users(&state.repo, &state.users).await {
        tracing::warn!("Failed to publish user snapshot: {}", e);
    }
}

pub async fn create_homework(
    state: &AppState,
    input: &HomeworkInput,
) -> Result<HomeworkEntry, AppError> {
    input.validate().map_err(AppError::Validation)?;

    let entry = state.repo.create_homework(input).await?;
    tracing::info!(id = %entry.id, date = %entry.date, periods = entry.periods.len(), "Homework created");
    publish_homework(state).await;
    Ok(entry)
}

/// Replace an entry wholesale.
pub async fn edit_homework(
    state: &AppState,
    id: &str,
    input: &HomeworkInput,
) -> Result<HomeworkEntry, AppError> {
    input.validate().map_err(AppError::Validation)?;

    let entry = state.repo.replace_homework(id, input).await?;
    tracing::info!(id, "Homework replaced");
    publish_homework(state).await;
    Ok(entry)
}

pub async fn delete_homework(state: &AppState, id: &str) -> Result<(), AppError> {
    state.repo.delete_homework(id).await?;
    tracing::info!(id, "Homework deleted");
    publish_homework(state).await;
    Ok(())
}

/// Create or replace the user keyed by `email`.
pub async fn save_user(
    state: &AppState,
    email: &str,
    request: &UpsertUserRequest,
) -> Result<UserProfile, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if request.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }

    let hash = non_blank(&request.password).map(hash_password).transpose()?;
    let profile = state.repo.upsert_user(email, request, hash.as_deref()).await?;
    tracing::info!(email, position = profile.position.as_str(), "User saved");
    publish_users(state).await;
    Ok(profile)
}

pub async fn delete_user(state: &AppState, email: &str) -> Result<(), AppError> {
    state.repo.delete_user(email).await?;
    tracing::info!(email, "User deleted");
    publish_users(state).await;
    Ok(())
}

/// Partial update of the caller's own profile. Blank fields are left as
/// they are.
pub async fn update_profile(
    state: &AppState,
    email: &str,
    request: &UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    if request
        .full_name
        .as_deref()
        .is_some_and(|name| name.trim().is_empty())
    {
        return Err(AppError::Validation("Full name is required".to_string()));
    }

    let hash = non_blank(&request.password).map(hash_password).transpose()?;
    let profile = state
        .repo
        .update_profile(email, request, hash.as_deref())
        .await?;
    tracing::info!(email, password_changed = hash.is_some(), "Profile updated");
    publish_users(state).await;
    Ok(profile)
}
