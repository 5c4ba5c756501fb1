//! Homework entry model: one day's worth of periods.

use serde::{Deserialize, Serialize};

/// Kind of work recorded for a period.
///
/// The wire form is the label shown in the admin form. Labels outside the
/// known five are kept verbatim in `Other` and render without a badge style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeriodType {
    Classwork,
    Homework,
    PopTest,
    Assignment,
    Notice,
    Other(String),
}

impl PeriodType {
    /// All recognised types, in the order the admin form offers them.
    pub const KNOWN: [PeriodType; 5] = [
        PeriodType::Classwork,
        PeriodType::Homework,
        PeriodType::PopTest,
        PeriodType::Assignment,
        PeriodType::Notice,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PeriodType::Classwork => "Classwork",
            PeriodType::Homework => "Homework",
            PeriodType::PopTest => "Pop Test",
            PeriodType::Assignment => "Assignment",
            PeriodType::Notice => "Notice",
            PeriodType::Other(label) => label,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Classwork" => PeriodType::Classwork,
            "Homework" => PeriodType::Homework,
            "Pop Test" => PeriodType::PopTest,
            "Assignment" => PeriodType::Assignment,
            "Notice" => PeriodType::Notice,
            other => PeriodType::Other(other.to_string()),
        }
    }
}

impl Default for PeriodType {
    fn default() -> Self {
        PeriodType::Classwork
    }
}

impl From<String> for PeriodType {
    fn from(s: String) -> Self {
        PeriodType::parse(&s)
    }
}

impl From<PeriodType> for String {
    fn from(t: PeriodType) -> Self {
        t.as_str().to_string()
    }
}

/// A single class slot inside a day's entry. Position in the entry is the
/// period number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(rename = "type", default)]
    pub kind: PeriodType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Homework for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkEntry {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub periods: Vec<Period>,
    /// Server-assigned creation time, kept across edits.
    pub timestamp: String,
}

impl HomeworkEntry {
    pub fn has_subject(&self, subject: &str) -> bool {
        self.periods.iter().any(|p| p.subject == subject)
    }
}

/// Request body for creating or fully replacing a homework entry.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeworkInput {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub periods: Vec<Period>,
}

impl HomeworkInput {
    /// A date and at least one period are required before anything is stored.
    pub fn validate(&self) -> Result<(), String> {
        if self.date.trim().is_empty() || self.periods.is_empty() {
            return Err(MISSING_DATE_OR_PERIOD.to_string());
        }
        Ok(())
    }
}

/// Operator-facing rejection for a homework form without date or periods.
pub const MISSING_DATE_OR_PERIOD: &str = "তারিখ এবং অন্তত একটি পিরিয়ড যোগ করুন";
