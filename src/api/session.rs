//! The caller's own identity and profile.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::auth::Viewer;
use crate::errors::AppError;
use crate::models::{Position, UpdateProfileRequest, UserProfile};
use crate::panel;
use crate::AppState;

/// What the session gate resolved for this request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// GET /api/session - Current viewer.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<SessionInfo> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    success(
        SessionInfo {
            signed_in: viewer.is_signed_in(),
            email: viewer.email().map(str::to_string),
            display_name: viewer.display_name().to_string(),
            position: viewer.profile().map(|p| p.position),
        },
        revision_id,
    )
}

/// PUT /api/profile - Update the caller's own profile.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let Some(email) = viewer.email() else {
        return error(
            AppError::Unauthorized("Profile updates need a session".to_string()),
            revision_id,
        );
    };

    match panel::update_profile(&state, email, &request).await {
        Ok(profile) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(profile, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
