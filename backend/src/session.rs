//! Session resolution and issuance.
//!
//! A single middleware resolves the inbound bearer token (header or cookie)
//! to an [`Identity`] and attaches it to the request extensions. Resolution
//! never rejects a request on its own: routes that require authentication
//! use the [`Identity`] extractor, which turns absence into a 401. The token
//! scheme is selected once via [`SessionStrategy`] so sign-in, sign-out and
//! resolution always agree.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use base64::engine::{general_purpose, Engine as _};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::{AuthConfig, SessionStrategy};
use crate::db::DbPool;
use crate::error::AppError;
use crate::web_server::AppState;
use common::{SessionDto, UserDto};

pub const SESSION_COOKIE: &str = "session_token";

/// Resolved (user, session) pair for an authenticated request.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user: UserDto,
    pub session: SessionDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user id)
    pub exp: usize,    // Expiration time
    pub nonce: String, // Nonce for token uniqueness
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: String,
    expires_at: NaiveDateTime,
}

// --- Middleware ---

/// Attaches an [`Identity`] to the request when a valid token is presented.
/// Missing, malformed or expired credentials leave the request anonymous;
/// only a genuine store failure propagates as an error.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()));

    if let Some(token) = token {
        if let Some(identity) = resolve_token(&state, &token).await? {
            request.extensions_mut().insert(identity);
        }
    }

    Ok(next.run(request).await)
}

/// A non-bearer or unparsable Authorization header counts as no credentials.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

async fn resolve_token(state: &AppState, token: &str) -> Result<Option<Identity>, AppError> {
    match state.app_config.auth.strategy {
        SessionStrategy::Database => resolve_stored_token(state, token).await,
        SessionStrategy::Jwt => resolve_signed_token(state, token).await,
    }
}

/// Look the token up in the `sessions` table by its hash and reject it by
/// expiry comparison. Expired rows are deleted as cleanup.
async fn resolve_stored_token(
    state: &AppState,
    token: &str,
) -> Result<Option<Identity>, AppError> {
    let token_hash = hash_token(token);

    let row: Option<SessionRow> =
        sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token_hash = $1")
            .bind(&token_hash)
            .fetch_optional(&state.db_pool)
            .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if row.expires_at < Utc::now().naive_utc() {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&state.db_pool)
            .await
            .ok(); // Cleanup only; the session is rejected either way
        return Ok(None);
    }

    let user: Option<UserDto> =
        sqlx::query_as("SELECT id, email, name, created_at FROM users WHERE id = $1")
            .bind(&row.user_id)
            .fetch_optional(&state.db_pool)
            .await?;

    Ok(user.map(|user| Identity {
        session: SessionDto {
            token: token.to_owned(),
            user_id: user.id.clone(),
            expires_at: row.expires_at,
        },
        user,
    }))
}

/// Trust the token's signature instead of a store lookup. The user row is
/// still fetched so a token for a deleted account resolves to nothing.
async fn resolve_signed_token(
    state: &AppState,
    token: &str,
) -> Result<Option<Identity>, AppError> {
    let Some(secret) = state.app_config.auth.jwt_secret.as_deref() else {
        return Err(AppError::InternalServerError(
            "auth.jwt_secret is not configured".to_string(),
        ));
    };

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            return Ok(None);
        }
    };

    let Some(expires_at) = DateTime::from_timestamp(token_data.claims.exp as i64, 0) else {
        return Ok(None);
    };

    let user: Option<UserDto> =
        sqlx::query_as("SELECT id, email, name, created_at FROM users WHERE id = $1")
            .bind(&token_data.claims.sub)
            .fetch_optional(&state.db_pool)
            .await?;

    Ok(user.map(|user| Identity {
        session: SessionDto {
            token: token.to_owned(),
            user_id: user.id.clone(),
            expires_at: expires_at.naive_utc(),
        },
        user,
    }))
}

// --- Issuance / revocation ---

/// Creates a new session for `user` under the configured strategy and
/// returns the raw token to hand to the client.
pub async fn issue_session(
    db_pool: &DbPool,
    auth: &AuthConfig,
    user: &UserDto,
) -> Result<SessionDto, AppError> {
    let expires_at = (Utc::now() + Duration::hours(auth.session_ttl_hours)).naive_utc();

    match auth.strategy {
        SessionStrategy::Database => {
            let mut token_bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut token_bytes);
            let token = general_purpose::URL_SAFE_NO_PAD.encode(token_bytes);

            sqlx::query(
                "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&user.id)
            .bind(hash_token(&token))
            .bind(expires_at)
            .execute(db_pool)
            .await?;

            Ok(SessionDto {
                token,
                user_id: user.id.clone(),
                expires_at,
            })
        }
        SessionStrategy::Jwt => {
            let secret = auth.jwt_secret.as_deref().ok_or_else(|| {
                AppError::InternalServerError("auth.jwt_secret is not configured".to_string())
            })?;

            // Random nonce so two sign-ins in the same second still mint
            // distinct tokens.
            let nonce: String = rand::rng()
                .sample_iter(&rand::distr::Alphanumeric)
                .take(16)
                .map(char::from)
                .collect();

            let claims = Claims {
                sub: user.id.clone(),
                exp: expires_at.and_utc().timestamp() as usize,
                nonce,
            };
            let token = encode(
                &Header::default(),
                &claims,
                &EncodingKey::from_secret(secret.as_bytes()),
            )?;

            Ok(SessionDto {
                token,
                user_id: user.id.clone(),
                expires_at,
            })
        }
    }
}

/// Invalidates the presented session. Signed tokens carry their own expiry
/// and have nothing to revoke server-side.
pub async fn revoke_session(
    db_pool: &DbPool,
    auth: &AuthConfig,
    token: &str,
) -> Result<(), AppError> {
    if auth.strategy == SessionStrategy::Database {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(db_pool)
            .await?;
    }
    Ok(())
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
