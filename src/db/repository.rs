//! Database repository for CRUD operations.
//!
//! Every write is a single statement followed by a revision bump. There are no
//! cross-table transactions.

use chrono::{Duration, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    HomeworkEntry, HomeworkInput, Period, Position, RevisionInfo, UpdateProfileRequest,
    UpsertUserRequest, UserProfile,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = now_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    // ==================== HOMEWORK OPERATIONS ====================

    /// List all homework, newest date first.
    pub async fn list_homework(&self) -> Result<Vec<HomeworkEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT id, date, day, periods, timestamp FROM homework ORDER BY date DESC, timestamp DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(homework_from_row).collect())
    }

    /// Get a homework entry by ID.
    pub async fn get_homework(&self, id: &str) -> Result<Option<HomeworkEntry>, AppError> {
        let row = sqlx::query("SELECT id, date, day, periods, timestamp FROM homework WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(homework_from_row))
    }

    pub async fn count_homework(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM homework")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Append a homework entry with a server-assigned id and timestamp.
    pub async fn create_homework(&self, input: &HomeworkInput) -> Result<HomeworkEntry, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let periods_json = serde_json::to_string(&input.periods)?;

        sqlx::query("INSERT INTO homework (id, date, day, periods, timestamp) VALUES (?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(&input.date)
            .bind(&input.day)
            .bind(&periods_json)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(HomeworkEntry {
            id,
            date: input.date.clone(),
            day: input.day.clone(),
            periods: input.periods.clone(),
            timestamp: now,
        })
    }

    /// Replace date, day and periods of an existing entry. The creation
    /// timestamp is kept.
    pub async fn replace_homework(
        &self,
        id: &str,
        input: &HomeworkInput,
    ) -> Result<HomeworkEntry, AppError> {
        let periods_json = serde_json::to_string(&input.periods)?;

        let result = sqlx::query("UPDATE homework SET date = ?, day = ?, periods = ? WHERE id = ?")
            .bind(&input.date)
            .bind(&input.day)
            .bind(&periods_json)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Homework {} not found", id)));
        }

        self.increment_revision().await?;

        self.get_homework(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Homework {} not found", id)))
    }

    /// Delete a homework entry.
    pub async fn delete_homework(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM homework WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Homework {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== USER OPERATIONS ====================

    /// List all users ordered by email.
    pub async fn list_users(&self) -> Result<Vec<UserProfile>, AppError> {
        let rows = sqlx::query(
            "SELECT username, full_name, roll, student_id, position FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Point read by primary key (the login email).
    pub async fn get_user(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query(
            "SELECT username, full_name, roll, student_id, position FROM users WHERE username = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Stored PHC hash for a user, if the user exists.
    pub async fn get_password_hash(&self, email: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT password_hash FROM users WHERE username = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("password_hash")))
    }

    /// Create or replace the user keyed by `email`.
    ///
    /// A `None` hash keeps the stored password; it is an error for a new user.
    pub async fn upsert_user(
        &self,
        email: &str,
        request: &UpsertUserRequest,
        password_hash: Option<&str>,
    ) -> Result<UserProfile, AppError> {
        let now = now_rfc3339();

        let result = sqlx::query(
            r#"UPDATE users SET full_name = ?, roll = ?, student_id = ?, position = ?,
                   password_hash = COALESCE(?, password_hash), updated_at = ?
               WHERE username = ?"#,
        )
        .bind(&request.full_name)
        .bind(&request.roll)
        .bind(&request.student_id)
        .bind(request.position.as_str())
        .bind(password_hash)
        .bind(&now)
        .bind(email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let hash = password_hash.ok_or_else(|| {
                AppError::Validation("Password is required for a new user".to_string())
            })?;

            sqlx::query(
                r#"INSERT INTO users (username, full_name, roll, student_id, position, password_hash, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(email)
            .bind(&request.full_name)
            .bind(&request.roll)
            .bind(&request.student_id)
            .bind(request.position.as_str())
            .bind(hash)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        self.increment_revision().await?;

        Ok(UserProfile {
            username: email.to_string(),
            full_name: request.full_name.clone(),
            roll: request.roll.clone(),
            student_id: request.student_id.clone(),
            position: request.position,
        })
    }

    /// Partial update of the fields a user may change on their own profile.
    pub async fn update_profile(
        &self,
        email: &str,
        request: &UpdateProfileRequest,
        password_hash: Option<&str>,
    ) -> Result<UserProfile, AppError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                   full_name = COALESCE(?, full_name),
                   roll = COALESCE(?, roll),
                   student_id = COALESCE(?, student_id),
                   password_hash = COALESCE(?, password_hash),
                   updated_at = ?
               WHERE username = ?"#,
        )
        .bind(&request.full_name)
        .bind(&request.roll)
        .bind(&request.student_id)
        .bind(password_hash)
        .bind(now_rfc3339())
        .bind(email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", email)));
        }

        self.increment_revision().await?;

        self.get_user(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", email)))
    }

    /// Delete a user. Their open sessions are left alone and degrade to a
    /// guest-like view.
    pub async fn delete_user(&self, email: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", email)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== SESSION OPERATIONS ====================

    /// Open a session for `email` and return its token.
    pub async fn create_session(&self, email: &str, ttl_days: i64) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::days(ttl_days);

        sqlx::query("INSERT INTO sessions (id, email, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(email)
            .bind(now.to_rfc3339_opts(SecondsFormat::Millis, true))
            .bind(expires_at.to_rfc3339_opts(SecondsFormat::Millis, true))
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    /// Email behind an unexpired session token.
    pub async fn find_session_email(&self, id: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT email FROM sessions WHERE id = ? AND expires_at > ?")
            .bind(id)
            .bind(now_rfc3339())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("email")))
    }

    pub async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_active_sessions(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(DISTINCT email) AS n FROM sessions WHERE expires_at > ?")
            .bind(now_rfc3339())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Remove expired sessions, returning how many were dropped.
    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// Helper functions for row conversion

fn homework_from_row(row: &sqlx::sqlite::SqliteRow) -> HomeworkEntry {
    let periods_str: String = row.get("periods");
    HomeworkEntry {
        id: row.get("id"),
        date: row.get("date"),
        day: row.get("day"),
        periods: parse_periods(&periods_str),
        timestamp: row.get("timestamp"),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> UserProfile {
    let position: String = row.get("position");
    UserProfile {
        username: row.get("username"),
        full_name: row.get("full_name"),
        roll: row.get("roll"),
        student_id: row.get("student_id"),
        position: Position::from_str(&position).unwrap_or_default(),
    }
}

fn parse_periods(s: &str) -> Vec<Period> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::warn!("Unreadable periods column: {}", e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::PeriodType;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("t.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    fn input(date: &str, subject: &str) -> HomeworkInput {
        HomeworkInput {
            date: date.to_string(),
            day: "Sunday".to_string(),
            periods: vec![Period {
                subject: subject.to_string(),
                teacher: "Karim".to_string(),
                kind: PeriodType::Homework,
                description: Some("ex 1.2".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn test_homework_listed_newest_date_first() {
        let (repo, _dir) = repo().await;
        repo.create_homework(&input("2024-05-01", "গণিত")).await.unwrap();
        repo.create_homework(&input("2024-05-03", "ইংরেজি")).await.unwrap();
        repo.create_homework(&input("2024-05-02", "বাংলা ১ম")).await.unwrap();

        let dates: Vec<String> = repo
            .list_homework()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, vec!["2024-05-03", "2024-05-02", "2024-05-01"]);
    }

    #[tokio::test]
    async fn test_replace_keeps_timestamp() {
        let (repo, _dir) = repo().await;
        let created = repo.create_homework(&input("2024-05-01", "গণিত")).await.unwrap();

        let replaced = repo
            .replace_homework(&created.id, &input("2024-05-09", "ইংরেজি"))
            .await
            .unwrap();
        assert_eq!(replaced.timestamp, created.timestamp);
        assert_eq!(replaced.date, "2024-05-09");
        assert_eq!(replaced.periods[0].subject, "ইংরেজি");

        let missing = repo.replace_homework("nope", &input("2024-05-09", "x")).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_user_requires_password_only_when_new() {
        let (repo, _dir) = repo().await;
        let mut req = UpsertUserRequest {
            full_name: "Ayesha".to_string(),
            roll: "7".to_string(),
            student_id: "S-07".to_string(),
            position: Position::Admin,
            password: None,
        };

        let err = repo.upsert_user("a@school.test", &req, None).await;
        assert!(matches!(err, Err(AppError::Validation(_))));

        repo.upsert_user("a@school.test", &req, Some("hash-1")).await.unwrap();

        req.full_name = "Ayesha Rahman".to_string();
        req.position = Position::SuperAdmin;
        let updated = repo.upsert_user("a@school.test", &req, None).await.unwrap();
        assert!(updated.is_super_admin());
        assert_eq!(
            repo.get_password_hash("a@school.test").await.unwrap().as_deref(),
            Some("hash-1")
        );
        assert_eq!(repo.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sessions_resolve_until_deleted() {
        let (repo, _dir) = repo().await;
        let token = repo.create_session("a@school.test", 30).await.unwrap();
        assert_eq!(
            repo.find_session_email(&token).await.unwrap().as_deref(),
            Some("a@school.test")
        );
        assert_eq!(repo.count_active_sessions().await.unwrap(), 1);

        repo.delete_session(&token).await.unwrap();
        assert_eq!(repo.find_session_email(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored_and_purged() {
        let (repo, _dir) = repo().await;
        let token = repo.create_session("a@school.test", -1).await.unwrap();
        assert_eq!(repo.find_session_email(&token).await.unwrap(), None);
        assert_eq!(repo.purge_expired_sessions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_writes_bump_revision() {
        let (repo, _dir) = repo().await;
        let start = repo.get_revision_id().await.unwrap();
        let entry = repo.create_homework(&input("2024-05-01", "গণিত")).await.unwrap();
        repo.delete_homework(&entry.id).await.unwrap();
        assert_eq!(repo.get_revision_id().await.unwrap(), start + 2);
    }
}
