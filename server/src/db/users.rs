// bazaar/server/src/db/users.rs
use bazaar::{Role, User};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::errors::{AppError, Result};

/// Stored account, including the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
  pub id: Uuid,
  pub email: String,
  pub name: String,
  pub password_hash: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
  fn from(record: UserRecord) -> Self {
    User {
      id: record.id,
      email: record.email,
      name: record.name,
      role: record.role,
      created_at: record.created_at,
    }
  }
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role, created_at";

pub async fn insert_user(
  email: &str,
  name: &str,
  password_hash: &str,
  role: Role,
  conn: &mut SqliteConnection,
) -> Result<User> {
  let record: UserRecord = sqlx::query_as(&format!(
    "INSERT INTO users (id, email, name, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    USER_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(email)
  .bind(name)
  .bind(password_hash)
  .bind(role)
  .bind(Utc::now())
  .fetch_one(conn)
  .await
  .map_err(|e| match e {
    sqlx::Error::Database(ref db) if db.is_unique_violation() => {
      AppError::Validation(format!("Email {} is already registered", email))
    }
    other => AppError::Sqlx(other),
  })?;
  Ok(record.into())
}

pub async fn fetch_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<UserRecord>> {
  let record = sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
    .bind(email)
    .fetch_optional(conn)
    .await?;
  Ok(record)
}

pub async fn fetch_by_id(id: Uuid, conn: &mut SqliteConnection) -> Result<Option<User>> {
  let record: Option<UserRecord> = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
    .bind(id)
    .fetch_optional(conn)
    .await?;
  Ok(record.map(User::from))
}

/// Looks the user up and checks the role, for owner-gated actions.
pub async fn require_role(id: Uuid, role: Role, conn: &mut SqliteConnection) -> Result<User> {
  let user = fetch_by_id(id, conn)
    .await?
    .ok_or_else(|| AppError::Auth(format!("Unknown user {}", id)))?;
  if user.role != role {
    return Err(AppError::Auth(format!("User {} is not a {}", id, role)));
  }
  Ok(user)
}
