use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{
    db,
    error::{AppError, AppResult},
    models::{CreateProduct, Product, UpdateProduct},
    AppState,
};

/// Decodes a JSON body whatever `Content-Type` the client sent.
fn decode_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|err| AppError::BadRequest(err.to_string()))
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let start = Instant::now();
    let products = db::fetch_all_products(&state.db).await?;

    info!(
        count = products.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Listed products"
    );

    Ok(Json(products))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Product>> {
    let payload: CreateProduct = decode_json(&body)?;

    let start = Instant::now();
    let product = db::insert_product(&state.db, payload).await?;

    info!(
        id = product.id,
        name = %product.name,
        elapsed_ms = start.elapsed().as_millis(),
        "Created product"
    );

    Ok(Json(product))
}

// ── Update ────────────────────────────────────────────────────────────────────

/// Last writer wins. The body's `id` selects the row; the path segment is
/// only consulted when the body has none. An id with no matching row still
/// answers 200 with the submitted product.
pub async fn update_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Product>> {
    let payload: UpdateProduct = decode_json(&body)?;

    let id = match payload.id {
        Some(id) => id,
        None => raw_id
            .parse()
            .map_err(|_| AppError::BadRequest(format!("invalid product id {raw_id:?}")))?,
    };
    let product = payload.into_product(id);

    let start = Instant::now();
    let affected = db::update_product(&state.db, &product).await?;
    let elapsed_ms = start.elapsed().as_millis();

    if affected == 0 {
        warn!(id, elapsed_ms, "Update matched no product");
    } else {
        info!(id, elapsed_ms, "Updated product");
    }

    Ok(Json(product))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = id?;

    let start = Instant::now();
    let affected = db::delete_product(&state.db, id).await?;
    let elapsed_ms = start.elapsed().as_millis();

    if affected == 0 {
        warn!(id, elapsed_ms, "Delete matched no product");
    } else {
        info!(id, elapsed_ms, "Deleted product");
    }

    Ok(StatusCode::NO_CONTENT)
}
