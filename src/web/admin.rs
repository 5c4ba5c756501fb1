//! Admin panel pages. Routed behind `require_signed_in`; the settings and
//! user pages additionally behind `require_super_admin_page`.

use std::collections::HashMap;

use axum::{
    extract::{Form, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use maud::Markup;

use super::{homework_input, prefers_dark, NoticeQuery, ProfileForm, UserForm};
use crate::auth::Viewer;
use crate::errors::AppError;
use crate::panel;
use crate::render::{
    admin_shell, dashboard_body, homework_admin_body, homework_form, page, profile_body,
    settings_body, user_form, AdminTab, DashboardStats, Popup,
};
use crate::AppState;

fn admin_page(
    viewer: &Viewer,
    headers: &HeaderMap,
    tab: AdminTab,
    popup: Option<&Popup>,
    content: Markup,
) -> Markup {
    let chrome = viewer.chrome(prefers_dark(headers));
    let title = match tab {
        AdminTab::Dashboard => "Dashboard",
        AdminTab::Homework => "Homework",
        AdminTab::Profile => "Profile",
        AdminTab::Settings => "Settings",
    };
    page(title, &chrome, popup, admin_shell(&chrome, tab, content))
}

/// Re-render a page with the error popup and the error's status.
fn failed(
    error: AppError,
    viewer: &Viewer,
    headers: &HeaderMap,
    tab: AdminTab,
    content: Markup,
) -> Response {
    tracing::warn!(code = error.error_code(), "Admin operation failed: {}", error.message());
    let popup = Popup::error(error.message());
    (
        error.status_code(),
        admin_page(viewer, headers, tab, Some(&popup), content),
    )
        .into_response()
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
) -> Response {
    let stats = async {
        Ok::<_, AppError>(DashboardStats {
            homework_count: state.repo.count_homework().await?,
            online_count: state.repo.count_active_sessions().await?,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }
    .await;

    match stats {
        Ok(stats) => {
            admin_page(&viewer, &headers, AdminTab::Dashboard, None, dashboard_body(&stats))
                .into_response()
        }
        Err(e) => failed(e, &viewer, &headers, AdminTab::Dashboard, maud::html! {}),
    }
}

/// GET /admin/profile
pub async fn profile_page(
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Markup {
    let popup = query.popup();
    let email = viewer.email().unwrap_or_default();
    admin_page(
        &viewer,
        &headers,
        AdminTab::Profile,
        popup.as_ref(),
        profile_body(email, viewer.profile()),
    )
}

/// POST /admin/profile
pub async fn submit_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Form(form): Form<ProfileForm>,
) -> Response {
    let Some(email) = viewer.email() else {
        return Redirect::to("/login").into_response();
    };

    match panel::update_profile(&state, email, &form.request()).await {
        Ok(_) => Redirect::to("/admin/profile?notice=profile-saved").into_response(),
        Err(e) => {
            let content = profile_body(email, viewer.profile());
            failed(e, &viewer, &headers, AdminTab::Profile, content)
        }
    }
}

/// GET /admin/homework
pub async fn homework_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Markup {
    let snapshot = state.feed.current();
    let popup = query.popup();
    admin_page(
        &viewer,
        &headers,
        AdminTab::Homework,
        popup.as_ref(),
        homework_admin_body(&snapshot.items),
    )
}

/// POST /admin/homework
pub async fn submit_homework(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let input = homework_input(&form);

    match panel::create_homework(&state, &input).await {
        Ok(_) => Redirect::to("/admin/homework?notice=upload-success").into_response(),
        Err(e) => {
            let snapshot = state.feed.current();
            let content = homework_admin_body(&snapshot.items);
            failed(e, &viewer, &headers, AdminTab::Homework, content)
        }
    }
}

/// GET /admin/homework/:id/edit
pub async fn edit_homework_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let action = format!("/admin/homework/{}/edit", id);

    match state.repo.get_homework(&id).await {
        Ok(Some(entry)) => admin_page(
            &viewer,
            &headers,
            AdminTab::Homework,
            None,
            homework_form(&action, Some(&entry)),
        )
        .into_response(),
        Ok(None) => failed(
            AppError::NotFound(format!("Homework {} not found", id)),
            &viewer,
            &headers,
            AdminTab::Homework,
            homework_admin_body(&state.feed.current().items),
        ),
        Err(e) => failed(
            e,
            &viewer,
            &headers,
            AdminTab::Homework,
            homework_admin_body(&state.feed.current().items),
        ),
    }
}

/// POST /admin/homework/:id/edit - Full replacement of the entry.
pub async fn submit_homework_edit(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let input = homework_input(&form);

    match panel::edit_homework(&state, &id, &input).await {
        Ok(_) => Redirect::to("/admin/homework?notice=upload-success").into_response(),
        Err(e) => {
            let action = format!("/admin/homework/{}/edit", id);
            let content = match state.repo.get_homework(&id).await {
                Ok(Some(entry)) => homework_form(&action, Some(&entry)),
                _ => homework_admin_body(&state.feed.current().items),
            };
            failed(e, &viewer, &headers, AdminTab::Homework, content)
        }
    }
}

/// POST /admin/homework/:id/delete
pub async fn submit_homework_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    match panel::delete_homework(&state, &id).await {
        Ok(()) => Redirect::to("/admin/homework?notice=delete-success").into_response(),
        Err(e) => {
            let content = homework_admin_body(&state.feed.current().items);
            failed(e, &viewer, &headers, AdminTab::Homework, content)
        }
    }
}

/// GET /admin/settings
pub async fn settings_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Markup {
    let snapshot = state.users.current();
    let popup = query.popup();
    admin_page(
        &viewer,
        &headers,
        AdminTab::Settings,
        popup.as_ref(),
        settings_body(&snapshot.items),
    )
}

/// POST /admin/users - Create, or replace when the email already exists.
pub async fn submit_user(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Form(form): Form<UserForm>,
) -> Response {
    match panel::save_user(&state, &form.email, &form.request()).await {
        Ok(_) => Redirect::to("/admin/settings?notice=add-success").into_response(),
        Err(e) => {
            let content = settings_body(&state.users.current().items);
            failed(e, &viewer, &headers, AdminTab::Settings, content)
        }
    }
}

/// GET /admin/users/:email/edit
pub async fn edit_user_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Response {
    let action = format!("/admin/users/{}/edit", email);

    match state.repo.get_user(&email).await {
        Ok(Some(user)) => admin_page(
            &viewer,
            &headers,
            AdminTab::Settings,
            None,
            user_form(&action, Some(&user)),
        )
        .into_response(),
        Ok(None) => failed(
            AppError::NotFound(format!("User {} not found", email)),
            &viewer,
            &headers,
            AdminTab::Settings,
            settings_body(&state.users.current().items),
        ),
        Err(e) => failed(
            e,
            &viewer,
            &headers,
            AdminTab::Settings,
            settings_body(&state.users.current().items),
        ),
    }
}

/// POST /admin/users/:email/edit - The path email wins over the form field.
pub async fn submit_user_edit(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(email): Path<String>,
    Form(form): Form<UserForm>,
) -> Response {
    match panel::save_user(&state, &email, &form.request()).await {
        Ok(_) => Redirect::to("/admin/settings?notice=upload-success").into_response(),
        Err(e) => {
            let content = settings_body(&state.users.current().items);
            failed(e, &viewer, &headers, AdminTab::Settings, content)
        }
    }
}

/// POST /admin/users/:email/delete
pub async fn submit_user_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Response {
    match panel::delete_user(&state, &email).await {
        Ok(()) => Redirect::to("/admin/settings?notice=delete-success").into_response(),
        Err(e) => {
            let content = settings_body(&state.users.current().items);
            failed(e, &viewer, &headers, AdminTab::Settings, content)
        }
    }
}
