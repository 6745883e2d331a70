use std::{fs, path::Path};

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{AppointmentRow, UserRow};

const APPOINTMENT_SELECT: &str = r#"SELECT a.id, a.user_id, a.service, a.starts_at, a.duration_minutes,
       a.notes, a.created_at, u.name AS user_name, u.phone AS user_phone
FROM appointments a
JOIN users u ON a.user_id = u.id"#;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Half-open `[start, end)` bounds covering one calendar day, in the same
/// `YYYY-MM-DDTHH:MM:SS` text form the `starts_at` column uses.
pub fn day_bounds(date: NaiveDate) -> (String, String) {
    let next = date.succ_opt().unwrap_or(date);
    (format!("{date}T00:00:00"), format!("{next}T00:00:00"))
}

pub async fn appointments_on(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<AppointmentRow>, sqlx::Error> {
    let (start, end) = day_bounds(date);
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "{APPOINTMENT_SELECT} WHERE a.starts_at >= ? AND a.starts_at < ? ORDER BY a.starts_at"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

pub async fn fetch_appointment(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!("{APPOINTMENT_SELECT} WHERE a.id = ? LIMIT 1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_appointment(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    service: &str,
    starts_at: &str,
    duration_minutes: i64,
    notes: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO appointments (id, user_id, service, starts_at, duration_minutes, notes, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(id)
    .bind(user_id)
    .bind(service)
    .bind(starts_at)
    .bind(duration_minutes)
    .bind(notes)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_appointment(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    service: &str,
    starts_at: &str,
    duration_minutes: i64,
    notes: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE appointments
           SET user_id = ?, service = ?, starts_at = ?, duration_minutes = ?, notes = ?
           WHERE id = ?"#,
    )
    .bind(user_id)
    .bind(service)
    .bind(starts_at)
    .bind(duration_minutes)
    .bind(notes)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_appointment(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_users(pool: &SqlitePool) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT id, name, phone, created_at FROM users ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn fetch_user(pool: &SqlitePool, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT id, name, phone, created_at FROM users WHERE id = ? LIMIT 1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, phone, created_at FROM users WHERE phone = ? LIMIT 1",
    )
    .bind(phone)
    .fetch_optional(pool)
    .await
}

pub async fn search_users_by_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Vec<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, phone, created_at FROM users WHERE phone LIKE ? ORDER BY name",
    )
    .bind(format!("%{phone}%"))
    .fetch_all(pool)
    .await
}

pub async fn insert_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    phone: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id, name, phone, created_at) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(phone)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    phone: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET name = ?, phone = ? WHERE id = ?")
        .bind(name)
        .bind(phone)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
