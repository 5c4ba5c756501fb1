//! Transient confirmation popups.

use maud::{html, Markup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupKind {
    /// Plain confirmation with an OK button.
    Dismiss,
    /// After sign-out: links home and back to login.
    Logout,
    /// A failed operation; blocks until dismissed.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub message: String,
    pub kind: PopupKind,
}

impl Popup {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PopupKind::Dismiss,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: PopupKind::Error,
        }
    }

    /// Popups carried across a redirect as `?notice=<code>`.
    pub fn from_notice(code: &str) -> Option<Self> {
        let popup = match code {
            "upload-success" => Popup::success("Upload Success"),
            "delete-success" => Popup::success("Delete Success"),
            "add-success" => Popup::success("Add Success"),
            "profile-saved" => Popup::success("আপলোড Success"),
            "logged-out" => Popup {
                message: "Log Out Successful".to_string(),
                kind: PopupKind::Logout,
            },
            _ => return None,
        };
        Some(popup)
    }
}

pub fn render_popup(popup: &Popup) -> Markup {
    let error = popup.kind == PopupKind::Error;
    html! {
        div.popup.active.popup-error[error] role="alertdialog" {
            div.popup-content {
                @if error {
                    div.popup-icon.popup-icon-error { "✖" }
                } @else {
                    div.popup-icon { "✔" }
                }
                h3 { (popup.message) }
                div.popup-actions {
                    @match popup.kind {
                        PopupKind::Logout => {
                            a.btn href="/" { "Go to Home" }
                            " "
                            a.btn href="/login" { "Login" }
                        }
                        PopupKind::Dismiss | PopupKind::Error => {
                            button.btn type="button" data-dismiss="popup" { "OK" }
                        }
                    }
                }
            }
        }
    }
}
