// src/handlers/auth.rs

use std::sync::LazyLock;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use regex::Regex;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{
        ChangePasswordRequest, GoogleAuthRequest, GoogleUserInfo, LoginRequest, RegisterRequest,
        UpdateProfileRequest, User,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

const USER_COLUMNS: &str =
    "id, name, username, email, password_hash, google_id, created_at";

static USERNAME_SANITIZER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9_]").expect("static regex"));

/// Builds a username from the email local part. Short results get a prefix
/// so the value stays recognizable; collisions are suffixed by the caller.
fn derive_username(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let base: String = USERNAME_SANITIZER
        .replace_all(local, "_")
        .chars()
        .take(17)
        .collect();
    if base.len() >= 3 {
        base
    } else {
        format!("user_{base}")
    }
}

fn user_payload(user: &User) -> serde_json::Value {
    json!({
        "id": user.id,
        "username": user.username,
        "name": user.name,
        "email": user.email,
    })
}

async fn find_user_by(
    pool: &SqlitePool,
    column: &str,
    value: &str,
) -> Result<Option<User>, AppError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
    Ok(sqlx::query_as::<_, User>(&query)
        .bind(value)
        .fetch_optional(pool)
        .await?)
}

/// Picks a free username for a new account, suffixing with a fragment of
/// the new user id when the derived name is taken.
async fn allocate_username(
    pool: &SqlitePool,
    seed: &str,
    user_id: &str,
) -> Result<String, AppError> {
    let mut username = derive_username(seed);
    if find_user_by(pool, "username", &username).await?.is_some() {
        let stem: String = username.chars().take(14).collect();
        username = format!("{}_{}", stem, &user_id[..3]);
    }
    Ok(username)
}

/// Registers a new account with email + password.
///
/// The password is hashed with Argon2 before storing; the response carries
/// a bearer token so the client is logged in immediately.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    let email = payload.email.trim().to_lowercase();

    if find_user_by(&pool, "email", &email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with that email already exists".to_string(),
        ));
    }

    let id = Uuid::new_v4().to_string();
    let username = allocate_username(&pool, &email, &id).await?;
    let password_hash = hash_password(&payload.password)?;

    sqlx::query(
        "INSERT INTO users (id, name, username, email, password_hash, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&name)
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .bind(Utc::now())
    .execute(&pool)
    .await?;

    let token = sign_jwt(&id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": { "id": id, "username": username, "name": name, "email": email },
    })))
}

/// Authenticates with email + password and returns a bearer token.
/// Accounts created before email was required can log in by username.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let user = match find_user_by(&pool, "email", &email).await? {
        Some(user) => Some(user),
        None => find_user_by(&pool, "username", payload.email.trim()).await?,
    };

    let invalid = || AppError::AuthError("Invalid email or password".to_string());
    let user = user.ok_or_else(invalid)?;
    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;

    if !verify_password(&payload.password, password_hash)? {
        return Err(invalid());
    }

    let token = sign_jwt(&user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": user_payload(&user),
    })))
}

async fn fetch_google_userinfo(
    http: &reqwest::Client,
    userinfo_url: &str,
    access_token: &str,
) -> Result<GoogleUserInfo, AppError> {
    let failed = |reason: String| {
        tracing::warn!("Google userinfo lookup failed: {reason}");
        AppError::AuthError("Google authentication failed".to_string())
    };

    let response = http
        .get(userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(failed(format!("status {}", response.status())));
    }

    response
        .json::<GoogleUserInfo>()
        .await
        .map_err(|e| failed(e.to_string()))
}

/// Signs in (or up) with a Google access token.
///
/// Lookup order: existing google_id, then an existing account with the same
/// email (which gets linked), then a brand-new account.
pub async fn google_auth(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(http): State<reqwest::Client>,
    Json(payload): Json<GoogleAuthRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let info =
        fetch_google_userinfo(&http, &config.google_userinfo_url, &payload.access_token).await?;
    let email = info.email.as_deref().map(str::to_lowercase);

    let mut user = find_user_by(&pool, "google_id", &info.sub).await?;

    if user.is_none() {
        if let Some(email) = email.as_deref() {
            if let Some(existing) = find_user_by(&pool, "email", email).await? {
                sqlx::query("UPDATE users SET google_id = ? WHERE id = ?")
                    .bind(&info.sub)
                    .bind(&existing.id)
                    .execute(&pool)
                    .await?;
                user = Some(User {
                    google_id: Some(info.sub.clone()),
                    ..existing
                });
            }
        }
    }

    let user = match user {
        Some(user) => user,
        None => {
            let id = Uuid::new_v4().to_string();
            let seed = email
                .clone()
                .or_else(|| info.name.clone())
                .unwrap_or_else(|| "user".to_string());
            let username = allocate_username(&pool, &seed, &id).await?;
            let name = info.name.clone().unwrap_or_else(|| username.clone());
            let created_at = Utc::now();

            sqlx::query(
                "INSERT INTO users (id, name, username, email, google_id, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&name)
            .bind(&username)
            .bind(&email)
            .bind(&info.sub)
            .bind(created_at)
            .execute(&pool)
            .await?;

            User {
                id,
                name,
                username: Some(username),
                email,
                password_hash: None,
                google_id: Some(info.sub),
                created_at,
            }
        }
    };

    let token = sign_jwt(&user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "token": token,
        "user": user_payload(&user),
    })))
}

/// Returns the authenticated user's profile.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user_by(&pool, "id", &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "user": {
            "id": user.id,
            "name": user.name,
            "username": user.username,
            "email": user.email,
            "googleLinked": user.google_id.is_some(),
        },
    })))
}

/// Updates the display name.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(&name)
        .bind(&claims.sub)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "success": true, "name": name })))
}

/// Links a Google identity to the current account.
pub async fn link_google(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(http): State<reqwest::Client>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GoogleAuthRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let info =
        fetch_google_userinfo(&http, &config.google_userinfo_url, &payload.access_token).await?;
    let email = info.email.as_deref().map(str::to_lowercase);

    if let Some(existing) = find_user_by(&pool, "google_id", &info.sub).await? {
        if existing.id != claims.sub {
            return Err(AppError::Conflict(
                "This Google account is already linked to a different user".to_string(),
            ));
        }
    }

    sqlx::query("UPDATE users SET google_id = ?, email = COALESCE(email, ?) WHERE id = ?")
        .bind(&info.sub)
        .bind(&email)
        .bind(&claims.sub)
        .execute(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "googleLinked": true,
        "email": email,
    })))
}

/// Changes the password after re-verifying the current one.
pub async fn change_password(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = find_user_by(&pool, "id", &claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.current_password, password_hash)? {
        return Err(AppError::AuthError(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&new_hash)
        .bind(&claims.sub)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "success": true })))
}
