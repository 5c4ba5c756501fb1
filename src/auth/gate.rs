//! Session gate: who is looking at this page, and may they.
//!
//! Every request is resolved to a [`Viewer`] once, before any handler runs.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{api_key_matches, read_cookie, SESSION_COOKIE};
use crate::db::Repository;
use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::UserProfile;
use crate::render::{Chrome, GUEST_NAME};
use crate::AppState;

/// Identity behind a request.
#[derive(Debug, Clone)]
pub enum Viewer {
    Guest,
    /// A valid session. `profile` is `None` when no user record matches the
    /// session email; such a viewer is shown like a guest.
    Member {
        email: String,
        session: String,
        profile: Option<UserProfile>,
    },
}

impl Viewer {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Viewer::Member { .. })
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Viewer::Member { email, .. } => Some(email),
            Viewer::Guest => None,
        }
    }

    pub fn session(&self) -> Option<&str> {
        match self {
            Viewer::Member { session, .. } => Some(session),
            Viewer::Guest => None,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Viewer::Member { profile, .. } => profile.as_ref(),
            Viewer::Guest => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.profile()
            .map(|p| p.full_name.as_str())
            .unwrap_or(GUEST_NAME)
    }

    pub fn is_super_admin(&self) -> bool {
        self.profile().is_some_and(UserProfile::is_super_admin)
    }

    pub fn chrome(&self, dark: bool) -> Chrome {
        let mut chrome = Chrome::guest(dark);
        chrome.signed_in = self.is_signed_in();
        if let Some(profile) = self.profile() {
            chrome.display_name = profile.full_name.clone();
            chrome.super_admin = profile.is_super_admin();
        }
        chrome
    }
}

/// Look up the session cookie and the matching profile.
///
/// Store failures degrade to `Guest` rather than failing the page.
pub async fn resolve_viewer(repo: &Repository, headers: &HeaderMap) -> Viewer {
    let Some(token) = read_cookie(headers, SESSION_COOKIE).filter(|t| !t.is_empty()) else {
        return Viewer::Guest;
    };

    let email = match repo.find_session_email(token).await {
        Ok(Some(email)) => email,
        Ok(None) => return Viewer::Guest,
        Err(e) => {
            tracing::warn!("Session lookup failed: {}", e);
            return Viewer::Guest;
        }
    };

    let profile = match repo.get_user(&email).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Profile lookup failed for {}: {}", email, e);
            None
        }
    };
    if profile.is_none() {
        tracing::debug!(%email, "Session has no matching profile");
    }

    Viewer::Member {
        email,
        session: token.to_string(),
        profile,
    }
}

/// Resolve the viewer and stash it in the request extensions.
pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let viewer = resolve_viewer(&state.repo, request.headers()).await;
    request.extensions_mut().insert(viewer);
    next.run(request).await
}

fn viewer_of(request: &Request) -> Viewer {
    request
        .extensions()
        .get::<Viewer>()
        .cloned()
        .unwrap_or(Viewer::Guest)
}

/// Admin pages: guests are sent to the login page.
pub async fn require_signed_in(request: Request, next: Next) -> Response {
    if viewer_of(&request).is_signed_in() {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Settings pages: anyone below super admin goes back to the dashboard.
pub async fn require_super_admin_page(request: Request, next: Next) -> Response {
    let viewer = viewer_of(&request);
    if !viewer.is_signed_in() {
        Redirect::to("/login").into_response()
    } else if !viewer.is_super_admin() {
        tracing::info!(email = ?viewer.email(), "Settings denied below super admin");
        Redirect::to("/admin/dashboard").into_response()
    } else {
        next.run(request).await
    }
}

/// API writes on homework: a session or the API key.
pub async fn require_editor(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if api_key_matches(state.config.api_key.as_deref(), request.headers())
        || viewer_of(&request).is_signed_in()
    {
        return next.run(request).await;
    }
    reject(AppError::Unauthorized(
        "Missing session or API key".to_string(),
    ))
}

/// API user management: a super admin session or the API key.
pub async fn require_super_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if api_key_matches(state.config.api_key.as_deref(), request.headers()) {
        return next.run(request).await;
    }

    let viewer = viewer_of(&request);
    if viewer.is_super_admin() {
        next.run(request).await
    } else if viewer.is_signed_in() {
        reject(AppError::Forbidden(
            "User management requires a super admin".to_string(),
        ))
    } else {
        reject(AppError::Unauthorized(
            "Missing session or API key".to_string(),
        ))
    }
}

fn reject(error: AppError) -> Response {
    AppErrorWithRevision {
        error,
        revision_id: 0,
    }
    .into_response()
}
