use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

pub mod utils;

// --- Persisted shapes ---

/// Public view of a user account. The password hash never leaves the backend.
#[derive(FromRow, Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// A session as handed to the client. `token` is the raw bearer token; the
/// backend only ever stores its hash.
#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct SessionDto {
    pub token: String,
    pub user_id: String,
    pub expires_at: NaiveDateTime,
}

#[derive(FromRow, Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct QuickLinkDto {
    pub id: String,
    pub name: String,
    pub url: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
}

// --- Request payloads ---

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct SignUpPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct SignInPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct CheckEmailPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Serialize, Deserialize, Debug, Validate, ToSchema)]
pub struct CreateQuickLinkPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,
}

/// Partial update: absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Default, Validate, ToSchema)]
pub struct UpdateQuickLinkPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(url(message = "Invalid URL format"))]
    pub url: Option<String>,
}

// --- Response envelopes for the auth routes ---

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SignUpResponse {
    pub success: bool,
    pub user: UserDto,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SignInResponse {
    pub success: bool,
    pub session: SessionDto,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct CheckEmailResponse {
    pub success: bool,
    pub exists: bool,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub session: SessionDto,
    pub user: UserDto,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}
