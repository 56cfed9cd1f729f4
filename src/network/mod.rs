//! Network Module
//!
//! HTTP boundary around [`EntityStore`](crate::store::EntityStore).
//!
//! ## Architecture
//! - One axum router per collection, state = `Arc<EntityStore>`
//! - Collections nested under `/{entity_name}`
//! - Store errors rendered as status code + `{"error": ...}` JSON
//!
//! ## Status Codes
//! - 200: read, update, delete succeeded
//! - 201: create succeeded
//! - 400: missing/invalid id or body
//! - 404: no entity with the given id
//! - 500: store uninitialized or persistence failed

mod error;
mod handlers;
mod router;
mod server;

pub use error::ApiError;
pub use router::{build_app, build_router};
pub use server::Server;
