//! Homework API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::feed::FilterState;
use crate::models::{HomeworkEntry, HomeworkInput};
use crate::panel;
use crate::AppState;

/// GET /api/homework - Latest snapshot, filtered by `term`, `date`, `subject`.
pub async fn list_homework(
    State(state): State<AppState>,
    Query(filter): Query<FilterState>,
) -> ApiResult<Vec<HomeworkEntry>> {
    let snapshot = state.feed.current();
    success(filter.apply(&snapshot.items), snapshot.revision)
}

/// GET /api/homework/:id - Get a single entry.
pub async fn get_homework(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<HomeworkEntry> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_homework(&id).await {
        Ok(Some(entry)) => success(entry, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Homework {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/homework - Create an entry.
pub async fn create_homework(
    State(state): State<AppState>,
    Json(input): Json<HomeworkInput>,
) -> ApiResult<HomeworkEntry> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match panel::create_homework(&state, &input).await {
        Ok(entry) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(entry, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/homework/:id - Replace an entry.
pub async fn update_homework(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<HomeworkInput>,
) -> ApiResult<HomeworkEntry> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match panel::edit_homework(&state, &id, &input).await {
        Ok(entry) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(entry, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/homework/:id - Delete an entry.
pub async fn delete_homework(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match panel::delete_homework(&state, &id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
