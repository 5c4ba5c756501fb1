//! Public pages: the homework feed and a single shared entry.

use maud::{html, Markup};

use super::{render, share_message, subject_options};
use crate::feed::FilterState;
use crate::models::HomeworkEntry;

/// Feed body: filter controls plus the rendered list. The list subscribes
/// to `stream_url` for live replacement; editing any filter control
/// resubscribes with the new query. Submitting still works without script.
pub fn feed_body(
    all: &[HomeworkEntry],
    visible: &[HomeworkEntry],
    filter: &FilterState,
    today: &str,
    stream_url: &str,
) -> Markup {
    html! {
        form.filters #"hw-filters" method="get" action="/" {
            input #"search-hw" type="search" name="term" placeholder="খুঁজুন..." value=(filter.term);
            input #"filter-date" type="date" name="date" value=(filter.date);
            select #"filter-subject" name="subject" {
                option value="" selected[filter.subject.is_empty()] { "সব বিষয়" }
                @for subject in subject_options(all) {
                    option value=(subject) selected[subject == filter.subject] { (subject) }
                }
            }
            button type="submit" { "Filter" }
        }
        div #"hw-list" data-stream=(stream_url) {
            (render(visible, today))
        }
    }
}

/// Deep-link target for one entry.
pub fn entry_body(entry: &HomeworkEntry, today: &str, page_url: &str) -> Markup {
    html! {
        div #"hw-list" {
            (render(std::slice::from_ref(entry), today))
        }
        div.share-box {
            label for="share-text" { "শেয়ার" }
            input #"share-text" type="text" readonly value=(share_message(page_url));
        }
        a.btn href="/" { "← সব হোমওয়ার্ক" }
    }
}
