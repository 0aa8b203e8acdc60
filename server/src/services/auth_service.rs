// bazaar/server/src/services/auth_service.rs

//! Account creation and sign-in with argon2 password hashes.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use bazaar::{LoginRequest, SignupRequest, User};
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument, warn};

use crate::db::users;
use crate::errors::{AppError, Result};

#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing failed: {}", argon_err))
    })
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash itself is unusable.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool> {
  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash.");
    AppError::Internal(format!("Invalid stored password hash: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(other) => {
      error!(error = %other, "Argon2 password verification failed.");
      Err(AppError::Internal(format!("Password verification failed: {}", other)))
    }
  }
}

fn validate_signup(req: &SignupRequest) -> Result<()> {
  let email = req.email.trim();
  if email.is_empty() || !email.contains('@') {
    return Err(AppError::Validation("A valid email is required.".to_string()));
  }
  if req.name.trim().is_empty() {
    return Err(AppError::Validation("Name is required.".to_string()));
  }
  if req.password.len() < 6 {
    return Err(AppError::Validation(
      "Password must be at least 6 characters.".to_string(),
    ));
  }
  Ok(())
}

/// Registers a new account. The email is stored trimmed and lowercased.
///
/// # Arguments
/// * `pool`: The database pool.
/// * `req`: Email, display name, plain-text password and role.
///
/// # Returns
/// The created user without its hash. An invalid field or an email already in use is an
/// `AppError::Validation`.
#[instrument(name = "auth_service::signup", skip(pool, req), fields(email = %req.email, role = %req.role))]
pub async fn signup(pool: &SqlitePool, req: &SignupRequest) -> Result<User> {
  validate_signup(req)?;
  let password_hash = hash_password(&req.password)?;
  let mut conn = pool.acquire().await?;
  let email = req.email.trim().to_ascii_lowercase();
  let user = users::insert_user(&email, req.name.trim(), &password_hash, req.role, &mut conn).await?;
  info!("User {} signed up as {}.", user.id, user.role);
  Ok(user)
}

/// Checks an email and password.
///
/// # Returns
/// The user on success, `AppError::NotFound` for an unknown email, `AppError::Auth` for a
/// wrong password.
#[instrument(name = "auth_service::login", skip(pool, req), fields(email = %req.email))]
pub async fn login(pool: &SqlitePool, req: &LoginRequest) -> Result<User> {
  let email = req.email.trim().to_ascii_lowercase();
  let mut conn = pool.acquire().await?;
  let record = users::fetch_by_email(&email, &mut conn).await?.ok_or_else(|| {
    warn!("Login attempt for unknown email.");
    AppError::NotFound("User not found".to_string())
  })?;
  if !verify_password(&record.password_hash, &req.password)? {
    warn!("Login attempt with wrong password for user {}.", record.id);
    return Err(AppError::Auth("Invalid password".to_string()));
  }
  debug!("User {} signed in.", record.id);
  Ok(record.into())
}
