use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::{auth, quick_links, session};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub app_config: AppConfig,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_up,
        auth::sign_in,
        auth::check_email,
        auth::get_session,
        auth::sign_out,
        quick_links::create_quick_link,
        quick_links::list_quick_links,
        quick_links::get_quick_link,
        quick_links::update_quick_link,
        quick_links::delete_quick_link,
    ),
    components(schemas(
        common::UserDto,
        common::SessionDto,
        common::QuickLinkDto,
        common::SignUpPayload,
        common::SignInPayload,
        common::CheckEmailPayload,
        common::CreateQuickLinkPayload,
        common::UpdateQuickLinkPayload,
        common::SignUpResponse,
        common::SignInResponse,
        common::CheckEmailResponse,
        common::SessionResponse,
        common::MessageResponse,
    ))
)]
struct ApiDoc;

pub async fn run_server(app_state: AppState) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        app_state.app_config.web.addr, app_state.app_config.web.port
    );
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Serving API at http://{}", addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

pub fn create_router(app_state: AppState) -> Router {
    let cors_origin = app_state
        .app_config
        .web
        .cors_origin
        .parse::<HeaderValue>()
        .expect("web.cors_origin is not a valid header value");

    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(600));

    let auth_routes = Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/check-email", post(auth::check_email))
        .route("/auth/session", get(auth::get_session))
        .route("/auth/signout", post(auth::sign_out));

    // Protection comes from the `Identity` extractor on each handler; the
    // session middleware below only resolves, it never rejects.
    let quick_link_routes = Router::new()
        .route(
            "/quick-links",
            post(quick_links::create_quick_link).get(quick_links::list_quick_links),
        )
        .route(
            "/quick-links/{id}",
            get(quick_links::get_quick_link)
                .put(quick_links::update_quick_link)
                .delete(quick_links::delete_quick_link),
        );

    Router::new()
        .nest("/api", auth_routes.merge(quick_link_routes))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            session::resolve_session,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
