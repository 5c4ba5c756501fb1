//! Form bodies posted by the HTML pages.

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use crate::models::{
    HomeworkInput, Period, PeriodType, Position, UpdateProfileRequest, UpsertUserRequest,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn field<'a>(form: &'a HashMap<String, String>, name: &str) -> &'a str {
    form.get(name).map(|v| v.trim()).unwrap_or_default()
}

/// Row numbers of every `period_{n}_*` field posted, in ascending order.
fn period_rows(form: &HashMap<String, String>) -> BTreeSet<usize> {
    form.keys()
        .filter_map(|key| key.strip_prefix("period_")?.split_once('_'))
        .filter_map(|(slot, _)| slot.parse::<usize>().ok())
        .collect()
}

/// Collect the period rows in order. A row is kept when any of its fields
/// was filled in; the type select alone counts only when it moved off the
/// default.
pub fn homework_input(form: &HashMap<String, String>) -> HomeworkInput {
    let periods = period_rows(form)
        .into_iter()
        .filter_map(|slot| {
            let subject = field(form, &format!("period_{}_subject", slot));
            let teacher = field(form, &format!("period_{}_teacher", slot));
            let description = field(form, &format!("period_{}_description", slot));
            let kind = match field(form, &format!("period_{}_type", slot)) {
                "" => PeriodType::default(),
                other => PeriodType::parse(other),
            };
            let filled = !subject.is_empty()
                || !teacher.is_empty()
                || !description.is_empty()
                || kind != PeriodType::default();
            if !filled {
                return None;
            }
            Some(Period {
                subject: subject.to_string(),
                teacher: teacher.to_string(),
                kind,
                description: (!description.is_empty()).then(|| description.to_string()),
            })
        })
        .collect();

    HomeworkInput {
        date: field(form, "date").to_string(),
        day: field(form, "day").to_string(),
        periods,
    }
}

#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub password: String,
}

impl UserForm {
    pub fn request(&self) -> UpsertUserRequest {
        UpsertUserRequest {
            full_name: self.full_name.trim().to_string(),
            roll: self.roll.trim().to_string(),
            student_id: self.student_id.trim().to_string(),
            position: Position::from_str(&self.position).unwrap_or_default(),
            password: Some(self.password.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub password: String,
}

impl ProfileForm {
    pub fn request(&self) -> UpdateProfileRequest {
        UpdateProfileRequest {
            full_name: Some(self.full_name.trim().to_string()),
            roll: Some(self.roll.trim().to_string()),
            student_id: Some(self.student_id.trim().to_string()),
            password: Some(self.password.clone()),
        }
    }
}
