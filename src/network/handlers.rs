//! Request handlers
//!
//! One handler per verb/path. Each extracts parameters, calls the
//! [`EntityStore`] and renders the outcome as JSON.

use std::sync::Arc;

use axum::extract::{FromRequest, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::entity::Entity;
use crate::error::StoreError;
use crate::store::EntityStore;

use super::error::ApiError;

/// `Json` extractor whose rejections render as [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId(raw.to_string()))
}

// ---------------------------------------------------------------------------
// GET / -- whole collection
// ---------------------------------------------------------------------------

pub async fn list(State(store): State<Arc<EntityStore>>) -> Result<Json<Vec<Entity>>, ApiError> {
    Ok(Json(store.get_all()?))
}

// ---------------------------------------------------------------------------
// GET /:id -- single entity, 404 on miss
// ---------------------------------------------------------------------------

pub async fn get_one(
    State(store): State<Arc<EntityStore>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Entity>, ApiError> {
    let id = parse_id(&raw_id)?;
    let entity = store.get(id)?.ok_or(StoreError::NotFound { id })?;
    Ok(Json(entity))
}

// ---------------------------------------------------------------------------
// POST / -- create, 201 with the stored entity
// ---------------------------------------------------------------------------

pub async fn create(
    State(store): State<Arc<EntityStore>>,
    JsonBody(entity): JsonBody<Entity>,
) -> Result<(StatusCode, Json<Entity>), ApiError> {
    let created = store.create(entity).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ---------------------------------------------------------------------------
// PUT /:id -- full replacement; the path id wins over any body id
// ---------------------------------------------------------------------------

pub async fn update(
    State(store): State<Arc<EntityStore>>,
    Path(raw_id): Path<String>,
    JsonBody(mut entity): JsonBody<Entity>,
) -> Result<Json<Entity>, ApiError> {
    let id = parse_id(&raw_id)?;
    entity.set_id(id);
    let updated = store.update(entity).await?;
    Ok(Json(updated))
}

// ---------------------------------------------------------------------------
// DELETE /:id
// ---------------------------------------------------------------------------

pub async fn delete(
    State(store): State<Arc<EntityStore>>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    store.delete(&Entity::new().with_id(id)).await?;
    Ok(StatusCode::OK)
}
