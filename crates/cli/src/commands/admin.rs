//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! coursehub-cli admin create -u root -e admin@example.com -p 'a strong password'
//! ```
//!
//! # Environment Variables
//!
//! - `COURSEHUB_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use coursehub_core::{Email, UserRole};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too short.
    #[error("Password must be at least 8 characters")]
    WeakPassword,

    /// Account already exists.
    #[error("An account already exists with that username or email")]
    AlreadyExists,

    /// Password hashing failed.
    #[error("Password hashing failed")]
    Hash,
}

/// Create an admin account directly in the database.
///
/// # Errors
///
/// Returns `AdminError` on validation failure, duplicate account, or
/// database error.
pub async fn create_admin(username: &str, email: &str, password: &str) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    if password.len() < 8 {
        return Err(AdminError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AdminError::Hash)?
        .to_string();

    let database_url = super::migrate::database_url()
        .map_err(|_| AdminError::MissingEnvVar("COURSEHUB_DATABASE_URL"))?;

    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let result = sqlx::query(
        "INSERT INTO coursehub.users (username, email, password_hash, role)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(username)
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .execute(&pool)
    .await;

    match result {
        Ok(_) => {
            tracing::info!(username, email = email.as_str(), "admin account created");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AdminError::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}
