//! REST front end over the search engine.
//!
//! Serves `GET /taggedContent?token=...&tag=...`, answering with the first
//! node named `tag` and its whole subtree as JSON.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{build_router, serve, serve_with_shutdown, AppState};
