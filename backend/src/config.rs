use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use dotenvy::dotenv;

/// How bearer tokens are minted and resolved. `Database` stores an opaque
/// token (hashed) in the `sessions` table and is the authoritative default;
/// `Jwt` trusts a signature instead of a store lookup.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStrategy {
    Database,
    Jwt,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub addr: String,
    pub port: u16,
    pub cors_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub strategy: SessionStrategy,
    pub session_ttl_hours: i64,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, figment::Error> {
        dotenv().ok();

        let config: AppConfig = Figment::new()
            .merge(Toml::file("Config.toml")) // For non-sensitive defaults
            .merge(Env::prefixed("APP_").split("__")) // e.g., APP_DATABASE__URL
            .extract()?;

        if config.auth.strategy == SessionStrategy::Jwt && config.auth.jwt_secret.is_none() {
            panic!("FATAL: APP_AUTH__JWT_SECRET must be set when auth.strategy is \"jwt\".");
        }

        tracing::info!(
            "Configuration loaded: listening on {}:{}, session strategy {:?}",
            config.web.addr,
            config.web.port,
            config.auth.strategy
        );

        Ok(config)
    }
}
