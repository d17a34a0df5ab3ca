//! HTTP API for reply suggestions

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::app_router;
pub use server::serve_api;
