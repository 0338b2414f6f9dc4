//! # Stockroom Server
//!
//! JSON-over-HTTP API for the Stockroom inventory and point-of-sale service.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Path                                   │
//! │                                                                         │
//! │  Client ──► axum Router (TraceLayer) ──► AuthUser extractor (JWT)       │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                     handler: authorise tenant,          │
//! │                                     parse + validate input              │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                         stockroom-db: catalog / ledger / SaleProcessor  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                  JSON body or ApiError {code, message}  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `STOCKROOM_HTTP_PORT` - Listen port (default: 8080)
//! - `STOCKROOM_DATABASE_PATH` - SQLite file (default: ./data/stockroom.db)
//! - `STOCKROOM_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `STOCKROOM_UPLOAD_DIR` - Product images (default: ./data/uploads)
//! - `STOCKROOM_MAX_UPLOAD_BYTES` - Image size limit (default: 5242880)
//! - `STOCKROOM_JWT_SECRET` - Secret for JWT signing
//! - `STOCKROOM_JWT_LIFETIME_SECS` - Token lifetime (default: 28800)
//! - `STOCKROOM_ADMIN_PASSWORD` - Initial admin password (default: admin)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Builds the complete application: routes plus request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::router(state).layer(TraceLayer::new_for_http())
}
