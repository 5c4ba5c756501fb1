//! Integration tests for the homework board.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{redirect::Policy, Client, Response};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::hash_password;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::feed::refresh_users;
use crate::models::{Position, UpsertUserRequest, MISSING_DATE_OR_PERIOD};
use crate::render::EMPTY_FEED;
use crate::{create_router, AppState};

const API_KEY: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    state: AppState,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            api_key: Some(API_KEY.to_string()),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            session_ttl_days: 30,
            bootstrap_admin: None,
            warnings: Vec::new(),
        };

        let state = AppState::load(repo, config)
            .await
            .expect("Failed to load state");
        let app = create_router(state.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        TestFixture {
            client: Client::builder().redirect(Policy::none()).build().unwrap(),
            base_url,
            state,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn add_user(&self, email: &str, name: &str, password: &str, position: Position) {
        let request = UpsertUserRequest {
            full_name: name.to_string(),
            roll: "7".to_string(),
            student_id: "S-7".to_string(),
            position,
            password: None,
        };
        let hash = hash_password(password).unwrap();
        self.state
            .repo
            .upsert_user(email, &request, Some(&hash))
            .await
            .unwrap();
        refresh_users(&self.state.repo, &self.state.users)
            .await
            .unwrap();
    }

    /// Sign in through the login form and return the `Cookie` header value.
    async fn login(&self, email: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        assert_eq!(location(&resp), "/admin/dashboard");

        let set_cookie = resp
            .headers()
            .get("set-cookie")
            .expect("No session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn post_homework(&self, body: Value) -> Response {
        self.client
            .post(self.url("/api/homework"))
            .header("x-api-key", API_KEY)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

fn location(resp: &Response) -> &str {
    resp.headers()
        .get("location")
        .expect("No location header")
        .to_str()
        .unwrap()
}

fn homework(date: &str, subject: &str, description: &str) -> Value {
    json!({
        "date": date,
        "day": "Thursday",
        "periods": [
            { "subject": subject, "teacher": "Rahim", "type": "Homework", "description": description }
        ]
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_empty_feed_shows_placeholder_for_guest() {
    let fixture = TestFixture::new().await;

    let resp = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let html = resp.text().await.unwrap();
    assert!(html.contains(EMPTY_FEED));
    assert!(html.contains("Guest"));
    assert!(!html.contains("href=\"/admin/settings\""));
}

#[tokio::test]
async fn test_homework_create_list_and_filter() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post_homework(homework("2024-05-01", "গণিত", "Exercise 3.2"))
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    let first_revision = body["revisionId"].as_i64().unwrap();
    assert!(body["data"]["id"].is_string());
    assert!(body["data"]["timestamp"].is_string());

    let resp = fixture
        .post_homework(homework("2024-05-02", "ইংরেজি", "Write an ESSAY"))
        .await;
    let body: Value = resp.json().await.unwrap();
    assert!(body["revisionId"].as_i64().unwrap() > first_revision);

    // Newest date first
    let resp = fixture
        .client
        .get(fixture.url("/api/homework"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["date"], "2024-05-02");
    assert_eq!(list[1]["date"], "2024-05-01");

    // Term matches nested period text, case-insensitively
    let resp = fixture
        .client
        .get(fixture.url("/api/homework?term=essay"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["periods"][0]["subject"], "ইংরেজি");

    // Exact date and subject
    let resp = fixture
        .client
        .get(fixture.url("/api/homework"))
        .query(&[("date", "2024-05-01"), ("subject", "গণিত")])
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // The public page renders from the same snapshot
    let html = fixture
        .client
        .get(fixture.url("/?subject=%E0%A6%97%E0%A6%A3%E0%A6%BF%E0%A6%A4"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Exercise 3.2"));
    assert!(!html.contains("Write an ESSAY"));
    assert!(html.contains("badge-hw"));
}

#[tokio::test]
async fn test_homework_requires_date_and_period() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .post_homework(json!({ "date": "2024-05-01", "day": "Wednesday", "periods": [] }))
        .await;
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], MISSING_DATE_OR_PERIOD);

    let count = fixture.state.repo.count_homework().await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_homework_update_and_delete() {
    let fixture = TestFixture::new().await;

    let body: Value = fixture
        .post_homework(homework("2024-05-01", "গণিত", "Old"))
        .await
        .json()
        .await
        .unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let timestamp = body["data"]["timestamp"].clone();

    let resp = fixture
        .client
        .put(fixture.url(&format!("/api/homework/{}", id)))
        .header("x-api-key", API_KEY)
        .json(&homework("2024-05-03", "ইংরেজি", "New"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["date"], "2024-05-03");
    assert_eq!(body["data"]["timestamp"], timestamp);

    let resp = fixture
        .client
        .delete(fixture.url(&format!("/api/homework/{}", id)))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/homework/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_writes_rejected_without_credentials() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/homework"))
        .json(&homework("2024-05-01", "গণিত", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = fixture
        .client
        .post(fixture.url("/api/homework"))
        .header("x-api-key", "wrong-key")
        .json(&homework("2024-05-01", "গণিত", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Reads stay public
    let resp = fixture
        .client
        .get(fixture.url("/api/homework"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_guest_is_redirected_from_admin_pages() {
    let fixture = TestFixture::new().await;

    for path in ["/admin/dashboard", "/admin/homework", "/admin/settings"] {
        let resp = fixture.client.get(fixture.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 303, "{}", path);
        assert_eq!(location(&resp), "/login");
    }
}

#[tokio::test]
async fn test_login_session_and_logout() {
    let fixture = TestFixture::new().await;
    fixture
        .add_user("head@school.test", "Head Teacher", "hunter22", Position::SuperAdmin)
        .await;

    let cookie = fixture.login("head@school.test", "hunter22").await;

    let resp = fixture
        .client
        .get(fixture.url("/api/session"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["signedIn"], true);
    assert_eq!(body["data"]["email"], "head@school.test");
    assert_eq!(body["data"]["displayName"], "Head Teacher");
    assert_eq!(body["data"]["position"], "super admin");

    let resp = fixture
        .client
        .get(fixture.url("/admin/dashboard"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Head Teacher"));
    assert!(html.contains("stat-online"));
    assert!(html.contains("href=\"/admin/settings\""));

    let resp = fixture
        .client
        .post(fixture.url("/logout"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/?notice=logged-out");

    let resp = fixture
        .client
        .get(fixture.url("/api/session"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["signedIn"], false);
    assert_eq!(body["data"]["displayName"], "Guest");

    let html = fixture
        .client
        .get(fixture.url("/?notice=logged-out"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Log Out Successful"));
}

#[tokio::test]
async fn test_bad_password_shows_error_popup() {
    let fixture = TestFixture::new().await;
    fixture
        .add_user("a@school.test", "Ayesha", "right-pass", Position::Admin)
        .await;

    let resp = fixture
        .client
        .post(fixture.url("/login"))
        .form(&[("email", "a@school.test"), ("password", "wrong-pass")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(resp.headers().get("set-cookie").is_none());
    let html = resp.text().await.unwrap();
    assert!(html.contains("Invalid email or password"));
    assert!(html.contains("value=\"a@school.test\""));
}

#[tokio::test]
async fn test_admin_below_super_admin_cannot_manage_users() {
    let fixture = TestFixture::new().await;
    fixture
        .add_user("a@school.test", "Ayesha", "pass-1234", Position::Admin)
        .await;
    let cookie = fixture.login("a@school.test", "pass-1234").await;

    let resp = fixture
        .client
        .get(fixture.url("/admin/settings"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/dashboard");

    let resp = fixture
        .client
        .get(fixture.url("/api/users"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // The settings link is not offered either
    let html = fixture
        .client
        .get(fixture.url("/admin/dashboard"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!html.contains("href=\"/admin/settings\""));

    // A session is enough to write homework
    let resp = fixture
        .client
        .post(fixture.url("/api/homework"))
        .header("cookie", &cookie)
        .json(&homework("2024-05-01", "গণিত", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_session_without_profile_is_shown_as_guest() {
    let fixture = TestFixture::new().await;
    let token = fixture
        .state
        .repo
        .create_session("ghost@school.test", 1)
        .await
        .unwrap();
    let cookie = format!("hw_session={}", token);

    let resp = fixture
        .client
        .get(fixture.url("/api/session"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["signedIn"], true);
    assert_eq!(body["data"]["displayName"], "Guest");
    assert!(body["data"].get("position").is_none());

    let resp = fixture
        .client
        .get(fixture.url("/admin/profile"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("No profile is stored for ghost@school.test"));
}

#[tokio::test]
async fn test_user_upsert_never_returns_password() {
    let fixture = TestFixture::new().await;

    // A new user needs a password
    let resp = fixture
        .client
        .put(fixture.url("/api/users/new@school.test"))
        .header("x-api-key", API_KEY)
        .json(&json!({ "fullName": "New Admin", "position": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = fixture
        .client
        .put(fixture.url("/api/users/new@school.test"))
        .header("x-api-key", API_KEY)
        .json(&json!({
            "fullName": "New Admin",
            "roll": "12",
            "studentId": "S-12",
            "position": "admin",
            "password": "first-pass"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["username"], "new@school.test");
    assert!(body["data"].get("password").is_none());

    // Replacing without a password keeps the old one
    let resp = fixture
        .client
        .put(fixture.url("/api/users/new@school.test"))
        .header("x-api-key", API_KEY)
        .json(&json!({ "fullName": "Renamed Admin", "position": "super admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/users"))
        .header("x-api-key", API_KEY)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["fullName"], "Renamed Admin");
    assert_eq!(users[0]["position"], "super admin");
    assert!(!body.to_string().contains("first-pass"));

    let cookie = fixture.login("new@school.test", "first-pass").await;
    assert!(cookie.starts_with("hw_session="));
}

#[tokio::test]
async fn test_admin_form_creates_homework() {
    let fixture = TestFixture::new().await;
    fixture
        .add_user("a@school.test", "Ayesha", "pass-1234", Position::Admin)
        .await;
    let cookie = fixture.login("a@school.test", "pass-1234").await;

    // Missing period is rejected with the popup message
    let resp = fixture
        .client
        .post(fixture.url("/admin/homework"))
        .header("cookie", &cookie)
        .form(&[("date", "2024-05-01"), ("day", "Wednesday")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().contains(MISSING_DATE_OR_PERIOD));

    let resp = fixture
        .client
        .post(fixture.url("/admin/homework"))
        .header("cookie", &cookie)
        .form(&[
            ("date", "2024-05-01"),
            ("day", "Wednesday"),
            ("period_1_subject", "গণিত"),
            ("period_1_teacher", "Rahim"),
            ("period_1_type", "Pop Test"),
            ("period_1_description", "Chapter 4"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/admin/homework?notice=upload-success");

    let html = fixture
        .client
        .get(fixture.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Chapter 4"));
    assert!(html.contains("badge-pt"));
}

#[tokio::test]
async fn test_entry_page_and_missing_entry() {
    let fixture = TestFixture::new().await;

    let body: Value = fixture
        .post_homework(homework("2024-05-01", "গণিত", "Share me"))
        .await
        .json()
        .await
        .unwrap();
    let id = body["data"]["id"].as_str().unwrap();

    let resp = fixture
        .client
        .get(fixture.url(&format!("/homework/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Share me"));
    assert!(html.contains(&format!("/homework/{}", id)));
    assert!(html.contains("হোমওয়ার্ক দেখুন: "));

    let resp = fixture
        .client
        .get(fixture.url("/homework/does-not-exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_theme_toggle_sets_cookie_and_returns() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/theme"))
        .header("referer", fixture.url("/?term=math"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/?term=math");
    let cookie = resp.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with("theme=dark;"));

    let html = fixture
        .client
        .get(fixture.url("/"))
        .header("cookie", "theme=dark")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("data-theme=\"dark\""));
}

#[tokio::test]
async fn test_feed_stream_sends_current_snapshot_then_updates() {
    let fixture = TestFixture::new().await;

    let mut resp = fixture
        .client
        .get(fixture.url("/feed/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let first = tokio::time::timeout(Duration::from_secs(5), resp.chunk())
        .await
        .expect("No initial event")
        .unwrap()
        .unwrap();
    let first = String::from_utf8_lossy(&first).to_string();
    assert!(first.contains("event: snapshot"));
    assert!(first.contains(EMPTY_FEED));

    fixture
        .post_homework(homework("2024-05-01", "গণিত", "Live update"))
        .await;

    let mut received = String::new();
    while !received.contains("Live update") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), resp.chunk())
            .await
            .expect("No update event")
            .unwrap()
            .unwrap();
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(received.contains("event: snapshot"));
}

#[tokio::test]
async fn test_reopened_feed_stream_follows_new_filter() {
    let fixture = TestFixture::new().await;
    fixture
        .post_homework(homework("2024-05-01", "গণিত", "Algebra"))
        .await;
    fixture
        .post_homework(homework("2024-05-02", "ইংরেজি", "Essay"))
        .await;

    let mut resp = fixture
        .client
        .get(fixture.url("/feed/stream"))
        .query(&[("subject", "ইংরেজি"), ("term", "essay")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let mut received = String::new();
    while !received.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), resp.chunk())
            .await
            .expect("No initial event")
            .unwrap()
            .unwrap();
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(received.contains("Essay"));
    assert!(!received.contains("Algebra"));
}
