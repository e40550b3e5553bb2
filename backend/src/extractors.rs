use crate::{error::AppError, session::Identity, web_server::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};

// The session middleware attaches an `Identity` only when a valid token was
// presented, so absence here simply means the request is unauthenticated.
// Taking `Identity` as a handler argument is what makes a route protected.
impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
