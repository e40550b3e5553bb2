//! CRUD handlers for the per-user quick-link resource.
//!
//! Every query that touches a single link carries the combined
//! `id = $x AND user_id = $y` condition, and for update/delete that
//! condition lives in the mutation itself. Existence and ownership are one
//! atomic check: a link owned by someone else reads as absent (404), and
//! there is no window between checking and mutating.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::response::ApiResponse;
use crate::session::Identity;
use crate::web_server::AppState;
use common::{CreateQuickLinkPayload, MessageResponse, QuickLinkDto, UpdateQuickLinkPayload};

const NOT_FOUND: &str = "Quick link not found";

/// ## Create a quick link
/// The owner is always the authenticated user, never client input.
#[utoipa::path(
    post,
    path = "/api/quick-links",
    request_body = CreateQuickLinkPayload,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Quick link created", body = QuickLinkDto),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn create_quick_link(
    State(state): State<AppState>,
    identity: Identity,
    WithRejection(Json(payload), _): WithRejection<Json<CreateQuickLinkPayload>, AppError>,
) -> Result<ApiResponse<QuickLinkDto>, AppError> {
    payload.validate()?;

    tracing::info!("Creating quick link {:?} for user {}", payload.name, identity.user.id);

    let link: QuickLinkDto = sqlx::query_as(
        "INSERT INTO quick_links (id, name, url, user_id, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id, name, url, user_id, created_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&payload.name)
    .bind(&payload.url)
    .bind(&identity.user.id)
    .bind(Utc::now().naive_utc())
    .fetch_one(&state.db_pool)
    .await?;

    Ok(ApiResponse::success(link))
}

/// ## List the caller's quick links, newest first
#[utoipa::path(
    get,
    path = "/api/quick-links",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Quick links owned by the caller", body = [QuickLinkDto]),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn list_quick_links(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<ApiResponse<Vec<QuickLinkDto>>, AppError> {
    let links: Vec<QuickLinkDto> = sqlx::query_as(
        "SELECT id, name, url, user_id, created_at FROM quick_links \
         WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(&identity.user.id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(ApiResponse::success(links))
}

/// ## Fetch a single quick link
#[utoipa::path(
    get,
    path = "/api/quick-links/{id}",
    params(("id" = String, Path, description = "Quick link id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The quick link", body = QuickLinkDto),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Absent or owned by someone else"),
    )
)]
pub async fn get_quick_link(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<ApiResponse<QuickLinkDto>, AppError> {
    let link: Option<QuickLinkDto> = sqlx::query_as(
        "SELECT id, name, url, user_id, created_at FROM quick_links \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(&id)
    .bind(&identity.user.id)
    .fetch_optional(&state.db_pool)
    .await?;

    link.map(ApiResponse::success)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// ## Update a quick link (partial)
/// Unspecified fields keep their current value.
#[utoipa::path(
    put,
    path = "/api/quick-links/{id}",
    params(("id" = String, Path, description = "Quick link id")),
    request_body = UpdateQuickLinkPayload,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The updated quick link", body = QuickLinkDto),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Absent or owned by someone else"),
    )
)]
pub async fn update_quick_link(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateQuickLinkPayload>, AppError>,
) -> Result<ApiResponse<QuickLinkDto>, AppError> {
    payload.validate()?;

    tracing::info!("Updating quick link {} for user {}", id, identity.user.id);

    let link: Option<QuickLinkDto> = sqlx::query_as(
        "UPDATE quick_links SET name = COALESCE($1, name), url = COALESCE($2, url) \
         WHERE id = $3 AND user_id = $4 RETURNING id, name, url, user_id, created_at",
    )
    .bind(payload.name.as_deref())
    .bind(payload.url.as_deref())
    .bind(&id)
    .bind(&identity.user.id)
    .fetch_optional(&state.db_pool)
    .await?;

    link.map(ApiResponse::success)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
}

/// ## Delete a quick link
#[utoipa::path(
    delete,
    path = "/api/quick-links/{id}",
    params(("id" = String, Path, description = "Quick link id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Quick link deleted", body = MessageResponse),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Absent or owned by someone else"),
    )
)]
pub async fn delete_quick_link(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    tracing::info!("Deleting quick link {} for user {}", id, identity.user.id);

    let result = sqlx::query("DELETE FROM quick_links WHERE id = $1 AND user_id = $2")
        .bind(&id)
        .bind(&identity.user.id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(NOT_FOUND.to_string()));
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "Quick link deleted successfully".to_string(),
    }))
}
