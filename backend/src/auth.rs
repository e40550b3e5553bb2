use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::session::{issue_session, revoke_session, Identity};
use crate::web_server::AppState;
use common::{
    utils::normalize_email, CheckEmailPayload, CheckEmailResponse, MessageResponse,
    SessionResponse, SignInPayload, SignInResponse, SignUpPayload, SignUpResponse, UserDto,
};

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: String,
    email: String,
    name: String,
    created_at: NaiveDateTime,
    password_hash: String,
}

/// ## Register a new user
/// Hashes the password and stores the account. The email must be unused.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignUpPayload,
    responses(
        (status = 200, description = "User created successfully", body = SignUpResponse),
        (status = 400, description = "Invalid payload or email already registered"),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignUpPayload>, AppError>,
) -> Result<Json<SignUpResponse>, AppError> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    tracing::info!("Signing up user with email: {}", email);

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db_pool)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)?;

    let user: UserDto = sqlx::query_as(
        "INSERT INTO users (id, email, name, password_hash, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id, email, name, created_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&email)
    .bind(&payload.name)
    .bind(&password_hash)
    .bind(Utc::now().naive_utc())
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(SignUpResponse {
        success: true,
        user,
    }))
}

/// ## Sign in an existing user
/// Verifies the credentials and issues a session under the configured
/// strategy. Unknown email and wrong password are indistinguishable.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = SignInPayload,
    responses(
        (status = 200, description = "Sign-in successful", body = SignInResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignInPayload>, AppError>,
) -> Result<Json<SignInResponse>, AppError> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    tracing::info!("Signing in user with email: {}", email);

    let row: CredentialRow = sqlx::query_as(
        "SELECT id, email, name, created_at, password_hash FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or(AppError::InvalidCredentials)?;

    if !verify(&payload.password, &row.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let user = UserDto {
        id: row.id,
        email: row.email,
        name: row.name,
        created_at: row.created_at,
    };
    let session = issue_session(&state.db_pool, &state.app_config.auth, &user).await?;

    Ok(Json(SignInResponse {
        success: true,
        session,
    }))
}

/// ## Check whether an email is already registered
#[utoipa::path(
    post,
    path = "/api/auth/check-email",
    request_body = CheckEmailPayload,
    responses(
        (status = 200, description = "Lookup result", body = CheckEmailResponse),
        (status = 400, description = "Invalid email"),
    )
)]
pub async fn check_email(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CheckEmailPayload>, AppError>,
) -> Result<Json<CheckEmailResponse>, AppError> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db_pool)
        .await?;

    Ok(Json(CheckEmailResponse {
        success: true,
        exists: existing.is_some(),
    }))
}

/// ## Current session lookup
/// Returns the identity resolved from the bearer token or session cookie.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated identity", body = SessionResponse),
        (status = 401, description = "No valid session"),
    )
)]
pub async fn get_session(identity: Identity) -> Json<SessionResponse> {
    Json(SessionResponse {
        success: true,
        session: identity.session,
        user: identity.user,
    })
}

/// ## Sign out
/// Invalidates the presented session.
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Session invalidated", body = MessageResponse),
        (status = 401, description = "No valid session"),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<MessageResponse>, AppError> {
    revoke_session(
        &state.db_pool,
        &state.app_config.auth,
        &identity.session.token,
    )
    .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Signed out successfully".to_string(),
    }))
}
