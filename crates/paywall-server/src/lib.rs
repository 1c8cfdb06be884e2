//! HTTP front end of the lightning paywall.
//!
//! Routes:
//!
//! - `GET /` lists every asset
//! - `POST /upload` stores a new asset in both tiers
//! - `GET /assets/{file}` is the L402 gate: 402 with invoice and preview, or
//!   the original for a valid proof of payment
//! - `GET /health`, `GET /metrics`

pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod l402;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use db::Database;
pub use error::ServerError;
pub use state::{AppState, Minter};

use actix_web::web;
use paywall::{HttpFetcher, JsonFetcher};

/// Mount every route of the service. Expects `web::Data<AppState>` and a
/// `web::Data<Minter>` from [`AppState::http_minter`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    configure_with::<HttpFetcher>(cfg);
}

/// [`configure`] for a minter over another LNURL transport.
pub fn configure_with<F: JsonFetcher + Clone + 'static>(cfg: &mut web::ServiceConfig) {
    routes::health::configure(cfg);
    routes::index::configure(cfg);
    routes::upload::configure(cfg);
    routes::assets::configure::<F>(cfg);
}
