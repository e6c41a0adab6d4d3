//! Checkout quote handler.
//!
//! The cart lives on the client. At checkout the client posts its lines and
//! the storefront copies them into an order draft for the hosted payment
//! processor: prices come from the catalog (never from the client), sizes are
//! checked against the product, and quantity caps are re-applied through the
//! same [`Cart`] rules the client uses.

use std::collections::HashMap;

use atelier_core::cart::{Cart, CartItem, LineKey};
use atelier_core::types::ProductId;
use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::catalog::CatalogStore;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Most lines accepted in one quote request.
pub const MAX_QUOTE_LINES: usize = 50;

/// One line of the client's cart.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteLineRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

/// Quote request body.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<QuoteLineRequest>,
}

/// One repriced line.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub name: String,
    pub size: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    /// True when the quantity was lowered by the per-line cap or stock.
    pub adjusted: bool,
    pub unit_price: Decimal,
    pub unit_amount_minor: i64,
    pub line_total: Decimal,
}

/// Order draft handed to the hosted checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub currency: &'static str,
    pub lines: Vec<QuoteLine>,
    pub total_items: u32,
    pub total_price: Decimal,
    pub display_total: String,
    pub total_amount_minor: i64,
}

/// Reprice client lines against the catalog.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for empty or oversized requests, unknown or
/// unpublished products, and sizes that do not fit the product. Lines that
/// end up empty (e.g. out of stock) are dropped; if nothing is left the
/// request is rejected.
pub fn build_quote(catalog: &CatalogStore, request: QuoteRequest) -> Result<Quote> {
    if request.items.is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_string()));
    }
    if request.items.len() > MAX_QUOTE_LINES {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_QUOTE_LINES} lines per checkout"
        )));
    }

    let mut cart = Cart::new();
    let mut requested: HashMap<LineKey, u64> = HashMap::new();

    for line in request.items {
        let product = catalog
            .product(&line.product_id)
            .filter(|product| product.published)
            .ok_or_else(|| AppError::BadRequest(format!("unknown product {}", line.product_id)))?;
        let stock = product
            .stock_for(line.size.as_deref())
            .map_err(|e| AppError::BadRequest(format!("{}: {e}", product.slug)))?;

        let mut item = CartItem::new(product.id.clone(), product.name.clone(), product.price);
        item.size = line.size;
        item.image = product.image.clone();
        item.stock_ceiling = stock;

        *requested.entry(item.key()).or_default() += u64::from(line.quantity);
        cart.add_item(item, line.quantity);
    }

    if cart.is_empty() {
        return Err(AppError::BadRequest(
            "no items available for checkout".to_string(),
        ));
    }

    let to_minor = |amount: Decimal| {
        catalog
            .price(amount)
            .to_minor_units()
            .ok_or_else(|| AppError::Internal(format!("amount {amount} out of range")))
    };

    let lines = cart
        .lines()
        .iter()
        .map(|line| {
            let wanted = requested.get(&line.key()).copied().unwrap_or(0);
            Ok(QuoteLine {
                product_id: line.item.product_id.clone(),
                name: line.item.name.clone(),
                size: line.item.size.clone(),
                image: line.item.image.clone(),
                quantity: line.quantity,
                adjusted: u64::from(line.quantity) < wanted,
                unit_price: line.item.unit_price,
                unit_amount_minor: to_minor(line.item.unit_price)?,
                line_total: line.line_total(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let totals = cart.totals();
    Ok(Quote {
        currency: catalog.currency().code(),
        lines,
        total_items: totals.total_items,
        total_price: totals.total_price,
        display_total: catalog.price(totals.total_price).display(),
        total_amount_minor: to_minor(totals.total_price)?,
    })
}

/// Reprice a client cart for checkout.
#[instrument(skip(state, request), fields(lines = request.items.len()))]
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<Quote>> {
    let quote = build_quote(state.catalog(), request)?;

    let lines = quote.lines.len().to_string();
    add_breadcrumb("checkout", "Quoted cart", Some(&[("lines", lines.as_str())]));
    tracing::info!(
        total_items = quote.total_items,
        total = %quote.display_total,
        "Checkout quote built"
    );

    Ok(Json(quote))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "products": [
            { "id": "r1", "slug": "moon-ring", "name": "Moon Ring", "price": "48.00",
              "sizes": [ { "size": "6", "stock": 2 }, { "size": "7", "stock": 0 } ] },
            { "id": "e1", "slug": "pearl-drops", "name": "Pearl Drops", "price": "32.50" },
            { "id": "h1", "slug": "hidden", "name": "Hidden", "price": "1", "published": false }
        ]
    }"#;

    fn catalog() -> CatalogStore {
        CatalogStore::from_json(CATALOG, None).unwrap()
    }

    fn line(product_id: &str, size: Option<&str>, quantity: u32) -> QuoteLineRequest {
        QuoteLineRequest {
            product_id: ProductId::new(product_id),
            size: size.map(str::to_string),
            quantity,
        }
    }

    #[test]
    fn test_quote_reprices_and_totals() {
        let quote = build_quote(
            &catalog(),
            QuoteRequest {
                items: vec![line("r1", Some("6"), 1), line("e1", None, 2)],
            },
        )
        .unwrap();

        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.total_items, 3);
        assert_eq!(quote.total_price, Decimal::new(11_300, 2));
        assert_eq!(quote.total_amount_minor, 11_300);
        assert_eq!(quote.display_total, "$113.00");
        assert_eq!(quote.lines[1].unit_amount_minor, 3250);
        assert!(quote.lines.iter().all(|l| !l.adjusted));
    }

    #[test]
    fn test_quote_caps_to_stock_and_merges() {
        let quote = build_quote(
            &catalog(),
            QuoteRequest {
                items: vec![line("r1", Some("6"), 2), line("r1", Some("6"), 2), line("e1", None, 30)],
            },
        )
        .unwrap();

        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].quantity, 2);
        assert!(quote.lines[0].adjusted);
        assert_eq!(quote.lines[1].quantity, 10);
        assert!(quote.lines[1].adjusted);
    }

    #[test]
    fn test_quote_rejects_bad_lines() {
        let catalog = catalog();
        for items in [
            vec![],
            vec![line("nope", None, 1)],
            vec![line("h1", None, 1)],
            vec![line("r1", None, 1)],
            vec![line("r1", Some("9"), 1)],
            vec![line("e1", Some("M"), 1)],
            vec![line("r1", Some("7"), 1)],
        ] {
            let result = build_quote(&catalog, QuoteRequest { items });
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_quote_rejects_too_many_lines() {
        let items = (0..=MAX_QUOTE_LINES).map(|_| line("e1", None, 1)).collect();
        let result = build_quote(&catalog(), QuoteRequest { items });
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
