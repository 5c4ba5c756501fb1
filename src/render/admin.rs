//! Admin panel pages and the login form.

use maud::{html, Markup};

use super::{Chrome, SUBJECTS};
use crate::models::{HomeworkEntry, PeriodType, Position, UserProfile};

/// Period rows offered by an empty homework form. An entry with more
/// periods gets one row per period.
pub const PERIOD_SLOTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTab {
    Dashboard,
    Homework,
    Profile,
    Settings,
}

/// Sidebar + content. The settings link is only shown to super admins.
pub fn admin_shell(chrome: &Chrome, active: AdminTab, content: Markup) -> Markup {
    let link = |tab: AdminTab, href: &str, label: &str| {
        html! {
            a.nav-link.active[active == tab] href=(href) { (label) }
        }
    };

    html! {
        div.admin-layout {
            aside.sidebar {
                p { "Signed in as " strong.user-name-display { (chrome.display_name) } }
                (link(AdminTab::Dashboard, "/admin/dashboard", "Dashboard"))
                (link(AdminTab::Homework, "/admin/homework", "Homework"))
                (link(AdminTab::Profile, "/admin/profile", "Profile"))
                @if chrome.super_admin {
                    span.restricted-super-admin {
                        (link(AdminTab::Settings, "/admin/settings", "Settings"))
                    }
                }
                a href="/" { "Public page" }
            }
            section { (content) }
        }
    }
}

pub fn login_body(email: &str) -> Markup {
    html! {
        div.hw-card {
            h2 { "Login" }
            form method="post" action="/login" {
                p { input type="email" name="email" placeholder="Email" required value=(email); }
                p { input type="password" name="password" placeholder="Password" required; }
                button type="submit" { "Login" }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub homework_count: i64,
    /// Distinct users holding an unexpired session.
    pub online_count: i64,
    pub generated_at: String,
}

pub fn dashboard_body(stats: &DashboardStats) -> Markup {
    html! {
        h2 { "Dashboard" }
        p #"live-clock" { (stats.generated_at) }
        div.stats {
            div.hw-card {
                h3 { "Homework" }
                span #"stat-hw-count" { (stats.homework_count) }
            }
            div.hw-card {
                h3 { "Signed in" }
                span #"stat-online" { (stats.online_count) }
            }
        }
    }
}

/// Own-profile form. Email and position are shown but not editable.
pub fn profile_body(email: &str, profile: Option<&UserProfile>) -> Markup {
    html! {
        h2 { "Profile" }
        @match profile {
            Some(profile) => {
                form method="post" action="/admin/profile" {
                    p { label { "Email" } input #"p-username" type="email" value=(profile.username) readonly; }
                    p { label { "Full name" } input #"p-fullname" type="text" name="full_name" value=(profile.full_name) required; }
                    p { label { "Roll" } input #"p-roll" type="text" name="roll" value=(profile.roll); }
                    p { label { "Student ID" } input #"p-studentid" type="text" name="student_id" value=(profile.student_id); }
                    p { label { "New password" } input #"p-password" type="password" name="password" placeholder="Leave blank to keep"; }
                    p { label { "Position" } input #"p-position" type="text" value=(profile.position.as_str()) readonly; }
                    button type="submit" { "Save" }
                }
            }
            None => {
                p { "No profile is stored for " (email) "." }
            }
        }
    }
}

/// Admin homework list with the create form.
pub fn homework_admin_body(entries: &[HomeworkEntry]) -> Markup {
    html! {
        h2 { "Homework" }
        details.hw-card #"hw-modal" {
            summary { "+ Add homework" }
            (homework_form("/admin/homework", None))
        }
        div #"admin-hw-list" {
            @for hw in entries {
                div.hw-card {
                    div.hw-header {
                        span { (hw.date) " (" (hw.day) ")" }
                        div {
                            a.btn.btn-edit href={"/admin/homework/" (hw.id) "/edit"} { "Edit" }
                            " "
                            form.inline method="post" action={"/admin/homework/" (hw.id) "/delete"}
                                onsubmit="return confirm('Are you sure?')" {
                                button.btn-delete type="submit" { "Delete" }
                            }
                        }
                    }
                    div { (hw.periods.len()) " periods added." }
                }
            }
        }
    }
}

/// Create or edit form for one day's homework.
pub fn homework_form(action: &str, entry: Option<&HomeworkEntry>) -> Markup {
    let date = entry.map(|e| e.date.as_str()).unwrap_or_default();
    let day = entry.map(|e| e.day.as_str()).unwrap_or_default();
    let periods = entry.map(|e| e.periods.as_slice()).unwrap_or_default();
    let slots = PERIOD_SLOTS.max(periods.len());

    html! {
        form method="post" action=(action) {
            p { label { "Date" } input #"hw-date" type="date" name="date" value=(date); }
            p { label { "Day" } input #"hw-day" type="text" name="day" value=(day); }
            div #"periods-container" {
                @for slot in 1..=slots {
                    @let current = periods.get(slot - 1);
                    @let subject = current.map(|p| p.subject.as_str()).unwrap_or_default();
                    @let kind = current.map(|p| p.kind.as_str()).unwrap_or("Classwork");
                    div.period-input-group {
                        h6 { "পিরিয়ড " (slot) }
                        select name={"period_" (slot) "_subject"} {
                            option value="" { "বিষয় সিলেক্ট" }
                            @for s in SUBJECTS {
                                option value=(s) selected[s == subject] { (s) }
                            }
                            @if !subject.is_empty() && !SUBJECTS.contains(&subject) {
                                option value=(subject) selected { (subject) }
                            }
                        }
                        input type="text" name={"period_" (slot) "_teacher"} placeholder="শিক্ষকের নাম"
                            value=(current.map(|p| p.teacher.as_str()).unwrap_or_default());
                        select name={"period_" (slot) "_type"} {
                            @for t in PeriodType::KNOWN.iter() {
                                option value=(t.as_str()) selected[t.as_str() == kind] { (t.as_str()) }
                            }
                            @if !PeriodType::KNOWN.iter().any(|t| t.as_str() == kind) {
                                option value=(kind) selected { (kind) }
                            }
                        }
                        input type="text" name={"period_" (slot) "_description"} placeholder="বিবরণ"
                            value=(current.and_then(|p| p.description.as_deref()).unwrap_or_default());
                    }
                }
            }
            button type="submit" { "Save" }
        }
    }
}

/// Super-admin user table with the add-user form.
pub fn settings_body(users: &[UserProfile]) -> Markup {
    html! {
        h2 { "Users" }
        table {
            thead {
                tr { th { "Email" } th { "Name" } th { "Roll" } th { "Position" } th {} }
            }
            tbody #"user-table-body" {
                @for u in users {
                    tr {
                        td { (u.username) }
                        td { (u.full_name) }
                        td { (u.roll) }
                        td { (u.position.as_str()) }
                        td {
                            a.btn.btn-edit href={"/admin/users/" (u.username) "/edit"} { "Edit" }
                            " "
                            form.inline method="post" action={"/admin/users/" (u.username) "/delete"}
                                onsubmit="return confirm('Are you sure?')" {
                                button.btn-delete type="submit" { "Delete" }
                            }
                        }
                    }
                }
            }
        }
        details.hw-card #"user-modal" {
            summary { "+ Add user" }
            (user_form("/admin/users", None))
        }
    }
}

/// Create or edit form for a user. The email is fixed when editing.
pub fn user_form(action: &str, user: Option<&UserProfile>) -> Markup {
    let position = user.map(|u| u.position).unwrap_or_default();

    html! {
        form method="post" action=(action) {
            @match user {
                Some(u) => {
                    p { label { "Email" } input type="email" name="email" value=(u.username) readonly; }
                }
                None => {
                    p { label { "Email" } input #"new-u-email" type="email" name="email" required; }
                }
            }
            p { label { "Full name" } input #"new-u-name" type="text" name="full_name" required
                value=(user.map(|u| u.full_name.as_str()).unwrap_or_default()); }
            p { label { "Roll" } input #"new-u-roll" type="text" name="roll"
                value=(user.map(|u| u.roll.as_str()).unwrap_or_default()); }
            p { label { "Student ID" } input #"new-u-sid" type="text" name="student_id"
                value=(user.map(|u| u.student_id.as_str()).unwrap_or_default()); }
            p {
                label { "Position" }
                select #"new-u-pos" name="position" {
                    @for choice in [Position::Admin, Position::SuperAdmin] {
                        option value=(choice.as_str()) selected[choice == position] { (choice.as_str()) }
                    }
                }
            }
            p {
                label { "Password" }
                @if user.is_some() {
                    input #"new-u-pass" type="password" name="password" placeholder="Leave blank to keep";
                } @else {
                    input #"new-u-pass" type="password" name="password" required;
                }
            }
            button type="submit" { "Save" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;

    fn chrome(super_admin: bool) -> Chrome {
        Chrome {
            display_name: "Ayesha".to_string(),
            signed_in: true,
            super_admin,
            dark: false,
            year: 2024,
        }
    }

    #[test]
    fn test_settings_link_only_for_super_admin() {
        let html = admin_shell(&chrome(false), AdminTab::Dashboard, html! {}).into_string();
        assert!(!html.contains("/admin/settings"));
        assert!(html.contains("user-name-display"));

        let html = admin_shell(&chrome(true), AdminTab::Settings, html! {}).into_string();
        assert!(html.contains("restricted-super-admin"));
        assert!(html.contains("class=\"nav-link active\" href=\"/admin/settings\""));
    }

    #[test]
    fn test_edit_form_is_prefilled() {
        let entry = HomeworkEntry {
            id: "abc".to_string(),
            date: "2024-05-01".to_string(),
            day: "Wednesday".to_string(),
            periods: vec![Period {
                subject: "ইংরেজি".to_string(),
                teacher: "Karim".to_string(),
                kind: PeriodType::Assignment,
                description: Some("essay".to_string()),
            }],
            timestamp: "2024-05-01T08:00:00.000Z".to_string(),
        };
        let html = homework_form("/admin/homework/abc/edit", Some(&entry)).into_string();
        assert!(html.contains("value=\"2024-05-01\""));
        assert!(html.contains("<option value=\"ইংরেজি\" selected>"));
        assert!(html.contains("<option value=\"Assignment\" selected>"));
        assert!(html.contains("value=\"essay\""));
        assert_eq!(html.matches("period-input-group").count(), PERIOD_SLOTS);
    }

    #[test]
    fn test_profile_never_shows_password() {
        let profile = UserProfile {
            username: "a@school.test".to_string(),
            full_name: "Ayesha".to_string(),
            roll: "7".to_string(),
            student_id: "S-07".to_string(),
            position: Position::Admin,
        };
        let html = profile_body("a@school.test", Some(&profile)).into_string();
        assert!(html.contains("Leave blank to keep"));
        assert!(html.contains("value=\"admin\" readonly"));

        let html = profile_body("ghost@school.test", None).into_string();
        assert!(html.contains("No profile is stored"));
    }
}
