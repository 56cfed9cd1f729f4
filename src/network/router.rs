//! Router construction
//!
//! [`build_router`] maps the CRUD verbs of one collection onto its
//! store. [`build_app`] mounts several collections side by side under
//! `/{entity_name}`.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::{Result, StoreError};
use crate::store::EntityStore;

use super::handlers;

/// Routes for a single collection, relative to its mount point
///
/// - `GET /` -- all entities
/// - `POST /` -- create
/// - `GET /{id}` -- one entity
/// - `PUT /{id}` -- replace
/// - `DELETE /{id}` -- remove
pub fn build_router(store: Arc<EntityStore>) -> Router {
    Router::new()
        .route("/", get(handlers::list).post(handlers::create))
        .route(
            "/{id}",
            get(handlers::get_one)
                .put(handlers::update)
                .delete(handlers::delete),
        )
        .with_state(store)
}

/// Mount each initialized store at `/{entity_name}`, with request tracing
///
/// Fails with `Uninitialized` if a store has not completed `init`, and
/// with `Config` if two stores share an entity name.
pub fn build_app(stores: impl IntoIterator<Item = Arc<EntityStore>>) -> Result<Router> {
    let mut app = Router::new();
    let mut mounted: Vec<String> = Vec::new();

    for store in stores {
        let name = store
            .entity_name()
            .ok_or(StoreError::Uninitialized)?
            .to_string();

        if mounted.contains(&name) {
            return Err(StoreError::Config(format!(
                "Entity '{}' mounted twice",
                name
            )));
        }

        tracing::debug!("Mounting collection '{}' at /{}", name, name);
        app = app.nest(&format!("/{}", name), build_router(store));
        mounted.push(name);
    }

    Ok(app.layer(TraceLayer::new_for_http()))
}
