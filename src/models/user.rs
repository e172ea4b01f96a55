// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    /// Display name shown in the client.
    pub name: String,

    /// Unique username derived from the email local part at registration.
    pub username: Option<String>,

    /// Lowercased email. Nullable: Google-created accounts may lack one.
    pub email: Option<String>,

    /// Argon2 password hash. Null for accounts that only sign in via Google.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: Option<String>,

    /// Subject identifier from the external identity provider, if linked.
    #[serde(skip)]
    pub google_id: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be at least 6 characters"
    ))]
    pub password: String,
}

/// DTO for password login. The `email` field also accepts a username for
/// accounts created before email was required.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

/// DTO carrying a Google OAuth access token.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthRequest {
    #[validate(length(min = 1, message = "accessToken is required"))]
    pub access_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "currentPassword and newPassword are required"))]
    pub current_password: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "New password must be at least 6 characters"
    ))]
    pub new_password: String,
}

/// Userinfo payload returned by the identity provider.
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}
