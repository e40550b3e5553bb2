// Entry point for the `backend` library. The integration tests build the
// router through `web_server::create_router` against their own pool.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod quick_links;
pub mod response;
pub mod session;
pub mod web_server;
