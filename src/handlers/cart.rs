use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use super::{success_response, validate_input};
use crate::cart::SelectedVariant;
use crate::catalog::{Platform, ProductKey, UnifiedProduct};
use crate::errors::ApiError;
use crate::AppState;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route(
            "/items",
            post(add_item).put(update_quantity).delete(remove_item),
        )
        .route("/clear", post(clear_cart))
        .route("/:platform/clear", post(clear_platform_cart))
        .route("/checkout-urls", get(checkout_urls))
}

/// Get the full partitioned cart
async fn get_cart(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    Ok(success_response(state.cart.cart().await))
}

/// Add a product (optionally with a selected variant) to the cart
async fn add_item(
    State(state): State<AppState>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let selected_variant = payload.variant.map(|variant| SelectedVariant {
        id: variant.id,
        title: variant.title,
        price: variant.price,
    });

    let cart = state
        .cart
        .add_item(payload.product, payload.quantity, selected_variant)
        .await?;

    Ok(success_response(cart))
}

/// Set the quantity of a cart entry; zero removes it
async fn update_quantity(
    State(state): State<AppState>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product_id = parse_product_id(&payload.product_id)?;
    let cart = state
        .cart
        .update_quantity(&product_id, payload.quantity, payload.variant_id.as_deref())
        .await;
    Ok(success_response(cart))
}

/// Remove a cart entry; absent entries are a no-op
async fn remove_item(
    State(state): State<AppState>,
    Json(payload): Json<RemoveItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product_id = parse_product_id(&payload.product_id)?;
    let cart = state
        .cart
        .remove_item(&product_id, payload.variant_id.as_deref())
        .await;
    Ok(success_response(cart))
}

/// Clear the whole cart
async fn clear_cart(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    Ok(success_response(state.cart.clear().await))
}

/// Clear a single platform partition
async fn clear_platform_cart(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let platform: Platform = platform
        .parse()
        .map_err(|err| ApiError::BadRequest(format!("{}", err)))?;
    Ok(success_response(state.cart.clear_platform(platform).await))
}

/// Checkout hand-off URLs for each non-empty partition
async fn checkout_urls(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    Ok(success_response(state.cart.checkout_urls().await))
}

fn parse_product_id(raw: &str) -> Result<ProductKey, ApiError> {
    raw.parse()
        .map_err(|err| ApiError::BadRequest(format!("invalid product id '{}': {}", raw, err)))
}

// Request DTOs

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SelectedVariantRequest {
    pub id: String,
    pub title: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    /// Product snapshot as returned by the catalog endpoints
    pub product: UnifiedProduct,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<SelectedVariantRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub variant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
}
