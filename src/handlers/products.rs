use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::success_response;
use crate::catalog::{swatch, ProductKey, UnifiedProduct};
use crate::errors::ApiError;
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// List products unified across both vendors
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let listing = state.catalog.list_unified(limit).await;
    Ok(success_response(listing))
}

/// Get a single product by its composite id
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let key: ProductKey = id
        .parse()
        .map_err(|err| ApiError::BadRequest(format!("invalid product id '{}': {}", id, err)))?;

    match state.catalog.get_unified(&key).await {
        Some(product) => Ok(success_response(ProductDetailResponse::new(product))),
        None => Err(ApiError::NotFound(format!("Product {} not found", id))),
    }
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: UnifiedProduct,
    /// Best-effort display color per variant, for swatch rendering
    pub swatches: Vec<VariantSwatch>,
}

#[derive(Debug, Serialize)]
pub struct VariantSwatch {
    pub variant_id: String,
    pub color: String,
}

impl ProductDetailResponse {
    fn new(product: UnifiedProduct) -> Self {
        let swatches = product
            .variants
            .iter()
            .map(|variant| VariantSwatch {
                variant_id: variant.id.clone(),
                color: swatch::swatch_color(variant),
            })
            .collect();
        Self { product, swatches }
    }
}
