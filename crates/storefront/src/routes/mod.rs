//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//!
//! # Products
//! GET  /api/products                  - Paginated product listing
//! GET  /api/products/{slug}           - Product detail
//! GET  /api/categories                - Category list
//!
//! # Catalog grid
//! GET  /api/catalog/layout            - Grid for every breakpoint
//! GET  /api/catalog/layout/{breakpoint} - Grid for one breakpoint
//!
//! # Events
//! GET  /api/events                    - Upcoming "meet the artist" events
//!
//! # Checkout
//! POST /api/checkout/quote            - Reprice a client cart for checkout
//! ```

pub mod catalog;
pub mod checkout;
pub mod events;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the catalog grid routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/layout", get(catalog::all))
        .route("/layout/{breakpoint}", get(catalog::one))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .route("/api/categories", get(products::categories))
        .nest("/api/catalog", catalog_routes())
        .route("/api/events", get(events::upcoming))
        .route("/api/checkout/quote", post(checkout::quote))
}
