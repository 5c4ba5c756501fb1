//! Shared page chrome: theme, navigation, identity dropdown, footer.

use chrono::Datelike;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use super::popup::{render_popup, Popup};
use super::SHARE_PREFIX;

/// What the chrome needs to know about the current request.
#[derive(Debug, Clone)]
pub struct Chrome {
    /// Full name from the profile, or "Guest".
    pub display_name: String,
    pub signed_in: bool,
    /// Reveals super-admin links. Visibility only.
    pub super_admin: bool,
    pub dark: bool,
    pub year: i32,
}

impl Chrome {
    pub fn guest(dark: bool) -> Self {
        Self {
            display_name: GUEST_NAME.to_string(),
            signed_in: false,
            super_admin: false,
            dark,
            year: chrono::Local::now().year(),
        }
    }
}

pub const GUEST_NAME: &str = "Guest";

/// Full HTML document around `body`.
pub fn page(title: &str, chrome: &Chrome, popup: Option<&Popup>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="bn" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | Homework Board" }
                style { (PreEscaped(CSS)) }
            }
            body data-theme=[chrome.dark.then_some("dark")] {
                div #"scroll-progress" {}
                (navbar(chrome))
                main.container {
                    (body)
                }
                @if let Some(popup) = popup {
                    (render_popup(popup))
                }
                button #"back-to-top" type="button" title="Back to top" { "↑" }
                footer {
                    "© " span #"currentYear" { (chrome.year) } " Homework Board"
                }
                script { (PreEscaped(script())) }
            }
        }
    }
}

fn navbar(chrome: &Chrome) -> Markup {
    html! {
        nav.navbar {
            a.brand href="/" { "হোমওয়ার্ক" }
            div.nav-actions {
                form.inline method="post" action="/theme" {
                    button #"theme-toggle" type="submit" title="Toggle theme" {
                        @if chrome.dark { "☀" } @else { "☾" }
                    }
                }
                @if chrome.signed_in {
                    details.avatar {
                        summary #"user-avatar" {
                            span #"dropdown-username" { (chrome.display_name) }
                        }
                        div #"avatar-dropdown" {
                            a #"btn-dashboard" href="/admin/dashboard" { "Dashboard" }
                            @if chrome.super_admin {
                                a #"btn-dashboard-users" href="/admin/settings" { "Settings" }
                            }
                            form method="post" action="/logout" {
                                button type="submit" { "Log Out" }
                            }
                        }
                    }
                } @else {
                    a.avatar #"user-avatar" href="/login" {
                        span #"dropdown-username" { (GUEST_NAME) }
                    }
                }
            }
        }
    }
}

fn script() -> String {
    format!(
        "const SHARE_PREFIX = {prefix};\n{body}",
        prefix = serde_json::Value::String(SHARE_PREFIX.to_string()),
        body = JAVASCRIPT
    )
}

const JAVASCRIPT: &str = r#"
document.addEventListener('click', (e) => {
  const share = e.target.closest('[data-share]');
  if (share) {
    const link = new URL(share.dataset.share, window.location.origin).href;
    navigator.clipboard.writeText(SHARE_PREFIX + link)
      .then(() => alert('লিংক কপি করা হয়েছে!'));
    return;
  }
  const dismiss = e.target.closest('[data-dismiss="popup"]');
  if (dismiss) {
    dismiss.closest('.popup').remove();
  }
});

const progress = document.getElementById('scroll-progress');
const backToTop = document.getElementById('back-to-top');
window.addEventListener('scroll', () => {
  const top = document.documentElement.scrollTop;
  const height = document.documentElement.scrollHeight - document.documentElement.clientHeight;
  progress.style.width = (height > 0 ? (top / height) * 100 : 0) + '%';
  backToTop.classList.toggle('show', top > 300);
});
backToTop.addEventListener('click', () => window.scrollTo({ top: 0, behavior: 'smooth' }));

const list = document.getElementById('hw-list');
let source = null;
const listen = (url) => {
  if (source) source.close();
  source = new EventSource(url);
  source.addEventListener('snapshot', (e) => { list.innerHTML = e.data; });
};
if (list && list.dataset.stream) {
  listen(list.dataset.stream);
}

const filters = document.getElementById('hw-filters');
if (filters && list) {
  const refilter = () => {
    const params = new URLSearchParams();
    for (const [key, value] of new FormData(filters)) {
      if (value) params.set(key, value);
    }
    const query = params.toString();
    history.replaceState(null, '', query ? '/?' + query : '/');
    listen(query ? '/feed/stream?' + query : '/feed/stream');
  };
  document.getElementById('search-hw').addEventListener('input', refilter);
  document.getElementById('filter-date').addEventListener('change', refilter);
  document.getElementById('filter-subject').addEventListener('change', refilter);
  filters.addEventListener('submit', (e) => {
    e.preventDefault();
    refilter();
  });
}

const clock = document.getElementById('live-clock');
if (clock) {
  const tick = () => {
    clock.textContent = new Date().toLocaleString('bn-BD', {
      weekday: 'long', year: 'numeric', month: 'long', day: 'numeric',
      hour: 'numeric', minute: 'numeric', second: 'numeric', hour12: true
    });
  };
  tick();
  setInterval(tick, 1000);
}
"#;

const CSS: &str = r#"
:root { --bg: #f5f7fb; --fg: #1f2937; --card: #ffffff; --accent: #4f46e5; --success: #16a34a; --danger: #dc2626; }
body[data-theme="dark"] { --bg: #111827; --fg: #e5e7eb; --card: #1f2937; --accent: #818cf8; }
* { box-sizing: border-box; }
body { margin: 0; font-family: "Hind Siliguri", system-ui, sans-serif; background: var(--bg); color: var(--fg); }
#scroll-progress { position: fixed; top: 0; left: 0; height: 3px; width: 0; background: var(--accent); z-index: 10; }
.navbar { display: flex; justify-content: space-between; align-items: center; padding: 12px 20px; background: var(--card); }
.nav-actions { display: flex; gap: 12px; align-items: center; }
.brand { font-weight: 700; color: var(--accent); text-decoration: none; }
.inline { display: inline; }
.avatar summary { cursor: pointer; list-style: none; }
#avatar-dropdown { position: absolute; right: 20px; background: var(--card); padding: 8px; display: flex; flex-direction: column; gap: 6px; }
.container { max-width: 900px; margin: 0 auto; padding: 20px; }
.filters { display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 16px; }
.hw-card { background: var(--card); border-radius: 8px; padding: 14px; margin-bottom: 14px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.hw-card.today { border-left: 4px solid var(--accent); }
.hw-header { display: flex; justify-content: space-between; font-weight: 600; margin-bottom: 8px; }
.period-row { padding: 6px 0; border-top: 1px dashed rgba(127,127,127,.3); }
.badge { display: inline-block; padding: 1px 8px; border-radius: 10px; font-size: .8rem; }
.badge-cw { background: #dbeafe; color: #1e40af; }
.badge-hw { background: #dcfce7; color: #166534; }
.badge-pt { background: #fee2e2; color: #991b1b; }
.badge-as { background: #fef9c3; color: #854d0e; }
.badge-nt { background: #ede9fe; color: #5b21b6; }
.text-center { text-align: center; }
.popup { position: fixed; inset: 0; display: flex; align-items: center; justify-content: center; background: rgba(0,0,0,.4); }
.popup-content { background: var(--card); padding: 24px; border-radius: 10px; text-align: center; min-width: 260px; }
.popup-icon { color: var(--success); font-size: 3rem; }
.popup-icon-error { color: var(--danger); }
.btn, button { cursor: pointer; padding: 6px 12px; border-radius: 6px; border: 1px solid rgba(127,127,127,.4); background: var(--card); color: var(--fg); text-decoration: none; }
.btn-delete { color: var(--danger); }
.hidden { display: none; }
table { width: 100%; border-collapse: collapse; }
td, th { padding: 6px; border-bottom: 1px solid rgba(127,127,127,.3); text-align: left; }
.admin-layout { display: grid; grid-template-columns: 200px 1fr; gap: 20px; }
.sidebar a { display: block; padding: 6px 0; }
.period-input-group { border: 1px solid rgba(127,127,127,.4); padding: 10px; margin-bottom: 10px; border-radius: 5px; }
#back-to-top { position: fixed; right: 20px; bottom: 20px; display: none; }
#back-to-top.show { display: block; }
footer { text-align: center; padding: 20px; opacity: .7; }
"#;
