//! Server-rendered pages.
//!
//! Handlers read the viewer placed by the session gate, call into the store
//! or the admin panel, and answer with a maud page or a `303` redirect that
//! carries a `?notice=` popup code.

mod admin;
mod forms;
mod public;

pub use admin::*;
pub use forms::*;
pub use public::*;

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::auth::read_cookie;
use crate::render::Popup;

/// Cookie remembering the light/dark choice.
pub const THEME_COOKIE: &str = "theme";

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    #[serde(default)]
    pub notice: Option<String>,
}

impl NoticeQuery {
    pub fn popup(&self) -> Option<Popup> {
        self.notice.as_deref().and_then(Popup::from_notice)
    }
}

pub fn prefers_dark(headers: &HeaderMap) -> bool {
    read_cookie(headers, THEME_COOKIE) == Some("dark")
}

pub fn theme_cookie(dark: bool) -> String {
    format!(
        "{}={}; SameSite=Lax; Path=/; Max-Age=31536000",
        THEME_COOKIE,
        if dark { "dark" } else { "light" }
    )
}

/// Path part of a `Referer`, so redirects never leave this site.
pub fn local_path(referer: Option<&str>) -> String {
    let Some(referer) = referer else {
        return "/".to_string();
    };
    let path = match referer.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => referer,
    };
    if path.starts_with('/') && !path.starts_with("//") {
        path.to_string()
    } else {
        "/".to_string()
    }
}
