//! Unified print-on-demand storefront API.
//!
//! Aggregates the Printify and Printful product catalogs behind one
//! composite-keyed product listing and keeps a platform-partitioned cart
//! whose checkout is handed off to the vendor platforms.

pub mod cart;
pub mod catalog;
pub mod clients;
pub mod config;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::config::AppConfig;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_allowed_origins.as_deref());

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api/v1/products", handlers::products::products_routes())
        .nest("/api/v1/cart", handlers::cart::cart_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS layer from an optional comma-separated origin list. Unset or
/// entirely invalid lists fall back to a permissive policy.
fn cors_layer(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if origins.is_empty() {
        info!("No CORS origins configured; using permissive policy");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
