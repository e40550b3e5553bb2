use backend::config::{AppConfig, AuthConfig, DatabaseConfig, SessionStrategy, WebConfig};
use backend::web_server::{create_router, AppState};
use common::{SignInPayload, SignInResponse, SignUpPayload, SignUpResponse, UserDto};
use reqwest::StatusCode;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::net::TcpListener;

pub const TEST_PASSWORD: &str = "password123";

/// Spawn a test server with the default (database) session strategy.
pub async fn spawn_app() -> (SocketAddr, reqwest::Client, SqlitePool) {
    spawn_app_with(SessionStrategy::Database, None).await
}

/// Spawn a test server against a fresh in-memory database and return the
/// address, a reqwest client and the pool for direct assertions.
pub async fn spawn_app_with(
    strategy: SessionStrategy,
    jwt_secret: Option<&str>,
) -> (SocketAddr, reqwest::Client, SqlitePool) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    // A single connection so every query sees the same in-memory database.
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create in-memory database pool.");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations on test database.");

    let app_config = AppConfig {
        web: WebConfig {
            addr: "127.0.0.1".to_string(),
            port: addr.port(),
            cors_origin: "http://localhost:5173".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            strategy,
            session_ttl_hours: 168,
            jwt_secret: jwt_secret.map(str::to_owned),
        },
    };

    let app = create_router(AppState {
        db_pool: db_pool.clone(),
        app_config,
    });

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    (addr, client, db_pool)
}

/// Register a user with the shared test password.
pub async fn sign_up_user(
    addr: &SocketAddr,
    client: &reqwest::Client,
    email: &str,
    name: &str,
) -> UserDto {
    let res = client
        .post(format!("http://{}/api/auth/signup", addr))
        .json(&SignUpPayload {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            name: name.to_string(),
        })
        .send()
        .await
        .expect("Failed to send sign-up request");
    assert_eq!(res.status(), StatusCode::OK, "Sign-up failed");

    let body: SignUpResponse = res.json().await.expect("Failed to parse sign-up response");
    assert!(body.success);
    body.user
}

/// Sign an already-registered user in and return their bearer token.
pub async fn sign_in_user(addr: &SocketAddr, client: &reqwest::Client, email: &str) -> String {
    let res = client
        .post(format!("http://{}/api/auth/signin", addr))
        .json(&SignInPayload {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .send()
        .await
        .expect("Failed to send sign-in request");
    assert_eq!(res.status(), StatusCode::OK, "Sign-in failed");

    let body: SignInResponse = res.json().await.expect("Failed to parse sign-in response");
    assert!(body.success);
    body.session.token
}

/// Register and sign in a test user, returning their bearer token.
pub async fn get_auth_token(
    addr: &SocketAddr,
    client: &reqwest::Client,
    email: &str,
    name: &str,
) -> String {
    sign_up_user(addr, client, email, name).await;
    sign_in_user(addr, client, email).await
}
