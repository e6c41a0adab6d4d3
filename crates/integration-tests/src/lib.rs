//! Integration tests for Atelier.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - JSON API driven through the axum router in-process
//! - `cart_persistence` - cart store hydration, persistence, and checkout
//!
//! No server or network is needed: requests go through
//! `tower::ServiceExt::oneshot` against [`test_app`].

use atelier_core::layout::ResponsiveLayout;
use atelier_storefront::catalog::CatalogStore;
use atelier_storefront::config::StorefrontConfig;
use atelier_storefront::{AppState, app};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

/// Catalog used across the integration tests.
///
/// Five published products (two sized rings), one unpublished product,
/// three snippets, one past and one future event.
pub const FIXTURE_CATALOG: &str = r#"{
    "currency": "USD",
    "categories": [
        { "slug": "rings", "name": "Rings" },
        { "slug": "earrings", "name": "Earrings" }
    ],
    "products": [
        { "id": "r1", "slug": "moon-ring", "name": "Moon Ring", "price": "48.00",
          "category": "rings", "image": "moon-ring.jpg", "position": 1,
          "sizes": [ { "size": "6", "stock": 3 }, { "size": "7", "stock": 0 } ] },
        { "id": "e1", "slug": "pearl-drops", "name": "Pearl Drops", "price": "32.50",
          "category": "earrings", "stock": 12, "position": 2 },
        { "id": "e2", "slug": "mini-hoops", "name": "Mini Hoops", "price": "28.00",
          "category": "earrings", "position": 3 },
        { "id": "r2", "slug": "twig-stackers", "name": "Twig Stackers", "price": "56.00",
          "category": "rings", "position": 4,
          "sizes": [ { "size": "5", "stock": 2 } ] },
        { "id": "n1", "slug": "tide-pendant", "name": "Tide Pendant", "price": "64.00",
          "position": 5 },
        { "id": "x1", "slug": "archive-cuff", "name": "Archive Cuff", "price": "90.00",
          "published": false, "position": 6 }
    ],
    "snippets": [
        { "key": "handmade", "translations": { "en": "Shaped by hand.", "fr": "Façonné à la main." } },
        { "key": "recycled", "translations": { "en": "Recycled silver." } },
        { "key": "care", "translations": { "en": "Polish gently." } }
    ],
    "events": [
        { "id": "past", "title": "Spring Fair", "venue": "Hall", "city": "Halifax",
          "starts_on": "2001-04-01" },
        { "id": "future", "title": "Winter Market", "venue": "Pier 4", "city": "Halifax",
          "starts_on": "2099-12-01", "ends_on": "2099-12-02" }
    ]
}"#;

/// Load [`FIXTURE_CATALOG`].
///
/// # Panics
///
/// Panics if the fixture does not parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn fixture_catalog() -> CatalogStore {
    CatalogStore::from_json(FIXTURE_CATALOG, None).unwrap()
}

/// Router over the fixture catalog and the stock layout.
#[must_use]
pub fn test_app() -> Router {
    let state = AppState::from_parts(
        StorefrontConfig::default(),
        fixture_catalog(),
        ResponsiveLayout::default(),
    );
    app(state)
}

/// Send one request and decode the JSON body (`Value::Null` if empty or not JSON).
///
/// # Panics
///
/// Panics if the request cannot be built or the body cannot be read.
#[allow(clippy::unwrap_used)]
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// `GET uri` against a fresh [`test_app`].
///
/// # Panics
///
/// Panics if the request fails.
#[allow(clippy::unwrap_used)]
pub async fn get_json(uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(test_app(), request).await
}

/// `POST uri` with a JSON body against a fresh [`test_app`].
///
/// # Panics
///
/// Panics if the request fails.
#[allow(clippy::unwrap_used)]
pub async fn post_json(uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(test_app(), request).await
}
