//! Accounts subsystem — registration, login and profile lookup.
//!
//! Passwords are stored as Argon2id PHC strings. Login only verifies
//! credentials; no session or token is issued.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tripwise_core::models::{User, UserProfile};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| AccountError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// `false` for a wrong password and for a stored hash that does not parse.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
            false
        }
    }
}

fn required(value: &Option<String>, field: &str, missing: &mut Vec<String>) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            missing.push(field.to_string());
            String::new()
        }
    }
}

pub async fn register(pool: &PgPool, req: RegisterRequest) -> Result<UserProfile, AccountError> {
    let mut missing = Vec::new();
    let name = required(&req.name, "name", &mut missing);
    let email = required(&req.email, "email", &mut missing).to_lowercase();
    let mobile = required(&req.mobile, "mobile", &mut missing);
    // passwords are not trimmed
    let password = match req.password {
        Some(p) if !p.is_empty() => p,
        _ => {
            missing.push("password".to_string());
            String::new()
        }
    };
    if !missing.is_empty() {
        return Err(AccountError::MissingFields(missing));
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Hash(e.to_string()))??;

    let result = sqlx::query_as::<_, UserProfile>(
        r#"
        INSERT INTO users (name, email, mobile, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, mobile, created_at
        "#,
    )
    .bind(&name)
    .bind(&email)
    .bind(&mobile)
    .bind(&password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(profile) => {
            tracing::info!(user_id = %profile.id, "Registered user");
            Ok(profile)
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AccountError::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

pub async fn login(pool: &PgPool, req: LoginRequest) -> Result<UserProfile, AccountError> {
    let mut missing = Vec::new();
    let email = required(&req.email, "email", &mut missing).to_lowercase();
    let password = match req.password {
        Some(p) if !p.is_empty() => p,
        _ => {
            missing.push("password".to_string());
            String::new()
        }
    };
    if !missing.is_empty() {
        return Err(AccountError::MissingFields(missing));
    }

    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, mobile, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?
    .ok_or(AccountError::InvalidCredentials)?;

    let stored = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AccountError::Hash(e.to_string()))?;

    if !valid {
        tracing::info!(user_id = %user.id, "Rejected login with wrong password");
        return Err(AccountError::InvalidCredentials);
    }

    Ok(user.into())
}

pub async fn profile(pool: &PgPool, user_id: Uuid) -> Result<UserProfile, AccountError> {
    sqlx::query_as::<_, UserProfile>(
        "SELECT id, name, email, mobile, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AccountError::NotFound)
}
