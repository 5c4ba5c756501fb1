//! User management API endpoints. Routed behind the super admin check.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{UpsertUserRequest, UserProfile};
use crate::panel;
use crate::AppState;

/// GET /api/users - Latest user snapshot.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    let snapshot = state.users.current();
    success(snapshot.items.to_vec(), snapshot.revision)
}

/// GET /api/users/:email - Get a single user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<UserProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_user(&email).await {
        Ok(Some(user)) => success(user, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("User {} not found", email)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/users/:email - Create or replace a user.
pub async fn put_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(request): Json<UpsertUserRequest>,
) -> ApiResult<UserProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match panel::save_user(&state, &email, &request).await {
        Ok(user) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(user, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/users/:email - Delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match panel::delete_user(&state, &email).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
