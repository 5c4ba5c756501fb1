//! HTML rendering with maud.
//!
//! Everything here is a pure function of its arguments: no store access,
//! no clock reads except through [`today_local`].

mod admin;
mod layout;
mod popup;
mod public;

pub use admin::*;
pub use layout::*;
pub use popup::*;
pub use public::*;

use maud::{html, Markup};

use crate::models::{HomeworkEntry, PeriodType};

/// Shown instead of cards when nothing matches.
pub const EMPTY_FEED: &str = "কোনো হোমওয়ার্ক নেই";

/// Prefix of the text the share button puts on the clipboard.
pub const SHARE_PREFIX: &str = "হোমওয়ার্ক দেখুন: ";

/// Subjects offered by the pickers even before any homework mentions them.
pub const SUBJECTS: [&str; 3] = ["বাংলা ১ম", "গণিত", "ইংরেজি"];

/// Local calendar date as `YYYY-MM-DD`.
pub fn today_local() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Style class for a period type badge. Unrecognised types get none.
pub fn badge_class(kind: &PeriodType) -> Option<&'static str> {
    match kind {
        PeriodType::Classwork => Some("badge-cw"),
        PeriodType::Homework => Some("badge-hw"),
        PeriodType::PopTest => Some("badge-pt"),
        PeriodType::Assignment => Some("badge-as"),
        PeriodType::Notice => Some("badge-nt"),
        PeriodType::Other(_) => None,
    }
}

pub fn share_message(url: &str) -> String {
    format!("{}{}", SHARE_PREFIX, url)
}

/// Render the homework list. Cards dated `today` get the `today` class.
pub fn render(entries: &[HomeworkEntry], today: &str) -> Markup {
    html! {
        @if entries.is_empty() {
            div.no-results.text-center { (EMPTY_FEED) }
        } @else {
            @for hw in entries {
                (render_card(hw, today))
            }
        }
    }
}

fn render_card(hw: &HomeworkEntry, today: &str) -> Markup {
    let is_today = hw.date == today;

    html! {
        div.hw-card.today[is_today] data-id=(hw.id) {
            div.hw-header {
                span.hw-date { (hw.date) " (" (hw.day) ")" }
                button.action-btn type="button" data-share={"/homework/" (hw.id)} title="Share" { "⤴" }
            }
            div.hw-body {
                @for (index, p) in hw.periods.iter().enumerate() {
                    @let badge = match badge_class(&p.kind) {
                        Some(class) => format!("badge {}", class),
                        None => "badge".to_string(),
                    };
                    div.period-row {
                        strong { "Period " (index + 1) ":" }
                        " " (p.subject) " - "
                        small { (p.teacher) }
                        br;
                        span class=(badge) { (p.kind.as_str()) }
                        @if let Some(description) = p.description.as_deref().filter(|d| !d.is_empty()) {
                            " - " (description)
                        }
                    }
                }
            }
        }
    }
}

/// Subject picker options: the fixed list plus any subject seen in `entries`,
/// without duplicates, in first-seen order.
pub fn subject_options(entries: &[HomeworkEntry]) -> Vec<String> {
    let mut subjects: Vec<String> = SUBJECTS.iter().map(|s| s.to_string()).collect();
    for p in entries.iter().flat_map(|hw| hw.periods.iter()) {
        if !p.subject.is_empty() && !subjects.contains(&p.subject) {
            subjects.push(p.subject.clone());
        }
    }
    subjects
}
