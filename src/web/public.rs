//! Public feed, shared entry links, theme, and sign-in.

use std::convert::Infallible;

use axum::{
    extract::{Form, Path, Query, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Redirect, Response,
    },
    Extension,
};
use futures::Stream;
use maud::Markup;
use serde::Deserialize;

use super::{local_path, prefers_dark, theme_cookie, LoginForm, NoticeQuery};
use crate::auth::{self, clear_session_cookie, session_cookie, Viewer};
use crate::feed::{FeedView, FilterState};
use crate::render::{self, entry_body, feed_body, login_body, page, Popup};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(flatten)]
    pub filter: FilterState,
    #[serde(default)]
    pub notice: Option<String>,
}

/// GET / - The filtered feed. The list re-renders live from `/feed/stream`
/// with the same query.
pub async fn feed_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(query): Query<FeedQuery>,
) -> Markup {
    let snapshot = state.feed.current();
    let visible = FeedView::new(query.filter.clone()).apply_snapshot(&snapshot);
    let stream_url = match raw.as_deref() {
        Some(q) if !q.is_empty() => format!("/feed/stream?{}", q),
        _ => "/feed/stream".to_string(),
    };
    let popup = query.notice.as_deref().and_then(Popup::from_notice);

    page(
        "হোমওয়ার্ক",
        &viewer.chrome(prefers_dark(&headers)),
        popup.as_ref(),
        feed_body(
            &snapshot.items,
            &visible,
            &query.filter,
            &render::today_local(),
            &stream_url,
        ),
    )
}

/// GET /feed/stream - One rendered list fragment per published snapshot,
/// starting with the current one.
pub async fn feed_stream(
    State(state): State<AppState>,
    Query(filter): Query<FilterState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.feed.subscribe();
    tracing::debug!(filtered = !filter.is_empty(), "Feed stream opened");
    let mut view = FeedView::new(filter);

    let stream = async_stream::stream! {
        while let Some(snapshot) = subscription.next().await {
            let visible = view.apply_snapshot(&snapshot);
            let fragment = render::render(&visible, &render::today_local()).into_string();
            yield Ok(Event::default()
                .event("snapshot")
                .id(snapshot.revision.to_string())
                .data(fragment));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /homework/:id - Single entry, the share target.
pub async fn entry_page(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let chrome = viewer.chrome(prefers_dark(&headers));
    let snapshot = state.feed.current();

    match snapshot.items.iter().find(|hw| hw.id == id) {
        Some(entry) => {
            let host = headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("localhost");
            let page_url = format!("http://{}/homework/{}", host, entry.id);
            page(
                &entry.date,
                &chrome,
                None,
                entry_body(entry, &render::today_local(), &page_url),
            )
            .into_response()
        }
        None => {
            let popup = Popup::error("Homework not found");
            (
                StatusCode::NOT_FOUND,
                page("হোমওয়ার্ক", &chrome, Some(&popup), render::render(&[], "")),
            )
                .into_response()
        }
    }
}

/// POST /theme - Flip the theme cookie and go back where the form was.
pub async fn toggle_theme(headers: HeaderMap) -> Response {
    let dark = !prefers_dark(&headers);
    let back = local_path(headers.get(header::REFERER).and_then(|v| v.to_str().ok()));

    (
        [(header::SET_COOKIE, theme_cookie(dark))],
        Redirect::to(&back),
    )
        .into_response()
}

/// GET /login
pub async fn login_page(
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Query(query): Query<NoticeQuery>,
) -> Response {
    if viewer.is_signed_in() {
        return Redirect::to("/admin/dashboard").into_response();
    }
    let popup = query.popup();
    page(
        "Login",
        &viewer.chrome(prefers_dark(&headers)),
        popup.as_ref(),
        login_body(""),
    )
    .into_response()
}

/// POST /login - Open a session and land on the dashboard.
pub async fn login(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let ttl = state.config.session_ttl_days;

    match auth::sign_in(&state.repo, &form.email, &form.password, ttl).await {
        Ok(token) => (
            [(header::SET_COOKIE, session_cookie(&token, ttl))],
            Redirect::to("/admin/dashboard"),
        )
            .into_response(),
        Err(e) => {
            let popup = Popup::error(e.message());
            (
                e.status_code(),
                page(
                    "Login",
                    &viewer.chrome(prefers_dark(&headers)),
                    Some(&popup),
                    login_body(form.email.trim()),
                ),
            )
                .into_response()
        }
    }
}

/// POST /logout - Drop the session and show the logout popup.
pub async fn logout(State(state): State<AppState>, Extension(viewer): Extension<Viewer>) -> Response {
    if let Some(token) = viewer.session() {
        match auth::sign_out(&state.repo, token).await {
            Ok(()) => tracing::info!(email = ?viewer.email(), "Signed out"),
            Err(e) => tracing::warn!("Failed to delete session: {}", e),
        }
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/?notice=logged-out"),
    )
        .into_response()
}
