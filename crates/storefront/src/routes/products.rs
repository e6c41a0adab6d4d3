//! Product route handlers.

use atelier_core::cart::MAX_QUANTITY_PER_LINE;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::catalog::{CatalogStore, Category, Product, ProductQuery};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Size option display data.
#[derive(Debug, Clone, Serialize)]
pub struct SizeView {
    pub size: String,
    pub in_stock: bool,
    /// Most units of this size a cart line may hold.
    pub max_quantity: u32,
}

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub display_price: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub sizes: Vec<SizeView>,
    /// Most units a cart line may hold for one-size pieces.
    pub max_quantity: Option<u32>,
}

impl ProductView {
    /// Build the view, formatting prices in the store currency.
    #[must_use]
    pub fn new(product: &Product, catalog: &CatalogStore) -> Self {
        let max_for = |stock: Option<u32>| stock.map_or(MAX_QUANTITY_PER_LINE, |s| s.min(MAX_QUANTITY_PER_LINE));

        Self {
            id: product.id.to_string(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            display_price: catalog.price(product.price).display(),
            category: product.category.as_ref().map(ToString::to_string),
            image: product.image.clone(),
            sizes: product
                .sizes
                .iter()
                .map(|s| SizeView {
                    size: s.size.clone(),
                    in_stock: s.stock > 0,
                    max_quantity: max_for(Some(s.stock)),
                })
                .collect(),
            max_quantity: product.sizes.is_empty().then(|| max_for(product.stock)),
        }
    }
}

/// One page of products.
#[derive(Debug, Serialize)]
pub struct ProductPageView {
    pub items: Vec<ProductView>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: usize,
    pub has_more_pages: bool,
}

/// List products with filtering, ordering, and pagination.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<ProductPageView> {
    let catalog = state.catalog();
    let page = catalog.query(&query, state.config().products_per_page);

    Json(ProductPageView {
        items: page
            .items
            .iter()
            .map(|product| ProductView::new(product, catalog))
            .collect(),
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        total_pages: page.total_pages,
        has_more_pages: (page.page as usize) < page.total_pages,
    })
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let catalog = state.catalog();
    let product = catalog
        .product_by_slug(&slug)
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    Ok(Json(ProductView::new(product, catalog)))
}

/// Category list for the catalog filter.
pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.catalog().categories().to_vec())
}
