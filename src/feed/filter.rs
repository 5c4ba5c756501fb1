//! Homework filtering: free-text search, exact date, exact subject.

use serde::{Deserialize, Serialize};

use crate::models::HomeworkEntry;

/// The three feed filter inputs. Empty means "no filter" for each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub subject: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.term.is_empty() && self.date.is_empty() && self.subject.is_empty()
    }

    pub fn apply(&self, entries: &[HomeworkEntry]) -> Vec<HomeworkEntry> {
        apply_filter(entries, &self.term, &self.date, &self.subject)
    }
}

/// Keep the entries that pass all three filters, in input order.
///
/// `term` is matched case-insensitively against the JSON form of the whole
/// entry, nested periods included.
pub fn apply_filter(
    entries: &[HomeworkEntry],
    term: &str,
    date: &str,
    subject: &str,
) -> Vec<HomeworkEntry> {
    let needle = term.to_lowercase();

    entries
        .iter()
        .filter(|hw| date.is_empty() || hw.date == date)
        .filter(|hw| subject.is_empty() || hw.has_subject(subject))
        .filter(|hw| needle.is_empty() || search_text(hw).contains(&needle))
        .cloned()
        .collect()
}

fn search_text(hw: &HomeworkEntry) -> String {
    serde_json::to_string(hw)
        .unwrap_or_default()
        .to_lowercase()
}
