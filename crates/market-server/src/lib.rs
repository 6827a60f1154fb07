//! HTTP server for the market catalog.
//!
//! Accepts multipart item creations, answers item queries, exposes the
//! repair and verify operations of the ingestion pipeline, and serves stored
//! pictures.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorResponse, ServerError, ServerResult};
pub use handler::AppState;
pub use server::MarketServer;
