//! Local cart commands.
//!
//! Products are named by slug and looked up in the catalog export, so the
//! cart always carries catalog names, prices, and stock ceilings.

use atelier_core::cart::{
    CartItem, CartStorage, CartStore, CheckoutOutcome, MAX_QUANTITY_PER_LINE, SizeScope,
};
use atelier_core::types::{CheckoutSessionId, CurrencyCode, Price, ProductId};
use atelier_storefront::catalog::{CatalogStore, Product, SizeError};
use serde_json::json;

use crate::error::CliError;

/// How a checkout session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutcomeKind {
    Completed,
    Failed,
    Expired,
}

fn find_product<'a>(catalog: &'a CatalogStore, slug: &str) -> Result<&'a Product, CliError> {
    catalog
        .product_by_slug(slug)
        .ok_or_else(|| CliError::UnknownProduct(slug.to_owned()))
}

fn size_error(product: &Product, source: SizeError) -> CliError {
    CliError::Size {
        slug: product.slug.clone(),
        source,
    }
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the product is unknown or the size does not fit it.
pub fn add<S: CartStorage>(
    store: &mut CartStore<S>,
    catalog: &CatalogStore,
    slug: &str,
    size: Option<&str>,
    quantity: u32,
) -> Result<(), CliError> {
    let product = find_product(catalog, slug)?;
    let stock = product.stock_for(size).map_err(|e| size_error(product, e))?;

    let mut item = CartItem::new(product.id.clone(), product.name.clone(), product.price);
    item.size = size.map(str::to_owned);
    item.image = product.image.clone();
    item.stock_ceiling = stock;

    store.add_item(item, quantity);
    Ok(())
}

/// Set a line's quantity. Zero or less removes it.
///
/// Without a size, a sized product has every one of its lines updated.
///
/// # Errors
///
/// Returns an error if the product is unknown or the size does not fit it.
pub fn update<S: CartStorage>(
    store: &mut CartStore<S>,
    catalog: &CatalogStore,
    slug: &str,
    quantity: i64,
    size: Option<&str>,
) -> Result<(), CliError> {
    let product = find_product(catalog, slug)?;

    if size.is_none() && !product.sizes.is_empty() {
        store.update_quantity(&product.id, quantity);
        return Ok(());
    }

    let stock = product.stock_for(size).map_err(|e| size_error(product, e))?;
    store.update_quantity_with_size(
        &product.id,
        quantity,
        size,
        stock.unwrap_or(MAX_QUANTITY_PER_LINE),
    );
    Ok(())
}

/// Remove lines of a product.
///
/// `product` is a slug, or a product id for items no longer in the catalog.
pub fn remove<S: CartStorage>(
    store: &mut CartStore<S>,
    catalog: &CatalogStore,
    product: &str,
    size: Option<&str>,
    all_sizes: bool,
) {
    let product_id = catalog
        .product_by_slug(product)
        .map_or_else(|| ProductId::new(product), |p| p.id.clone());
    let scope = if all_sizes {
        SizeScope::AllSizes
    } else {
        SizeScope::Exact(size)
    };
    store.remove_item(&product_id, scope);
}

/// Apply a payment provider outcome. Returns true if the cart was cleared.
pub fn complete<S: CartStorage>(store: &mut CartStore<S>, session_id: &str, kind: OutcomeKind) -> bool {
    let session_id = CheckoutSessionId::new(session_id);
    let outcome = match kind {
        OutcomeKind::Completed => CheckoutOutcome::Completed { session_id },
        OutcomeKind::Failed => CheckoutOutcome::Failed { session_id },
        OutcomeKind::Expired => CheckoutOutcome::Expired { session_id },
    };
    store.apply_checkout_outcome(&outcome)
}

/// Render the cart as a plain-text table.
#[must_use]
pub fn render<S: CartStorage>(store: &CartStore<S>, currency: CurrencyCode) -> String {
    if store.cart().is_empty() {
        return "Cart is empty\n".to_owned();
    }

    let mut out = String::new();
    for line in store.lines() {
        let name = match &line.item.size {
            Some(size) => format!("{} (size {size})", line.item.name),
            None => line.item.name.clone(),
        };
        out.push_str(&format!(
            "{name:<32} {:>3} x {:>9}  {:>10}\n",
            line.quantity,
            Price::new(line.item.unit_price, currency).display(),
            Price::new(line.line_total(), currency).display(),
        ));
    }

    let totals = store.totals();
    out.push_str(&format!(
        "{} item(s), total {}\n",
        totals.total_items,
        Price::new(totals.total_price, currency).display()
    ));
    out
}

/// Render the cart as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json<S: CartStorage>(store: &CartStore<S>) -> Result<String, CliError> {
    let value = json!({
        "items": store.lines(),
        "totals": store.totals(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_core::cart::MemoryStorage;
    use rust_decimal::Decimal;

    const CATALOG: &str = r#"{
        "products": [
            { "id": "r1", "slug": "moon-ring", "name": "Moon Ring", "price": "48.00",
              "sizes": [ { "size": "6", "stock": 3 }, { "size": "7", "stock": 5 } ] },
            { "id": "e1", "slug": "pearl-drops", "name": "Pearl Drops", "price": "32.50", "stock": 4 }
        ]
    }"#;

    fn catalog() -> CatalogStore {
        CatalogStore::from_json(CATALOG, None).unwrap()
    }

    fn store() -> CartStore<MemoryStorage> {
        CartStore::open(MemoryStorage::new())
    }

    #[test]
    fn test_add_uses_catalog_price_and_stock() {
        let catalog = catalog();
        let mut store = store();

        add(&mut store, &catalog, "moon-ring", Some("6"), 5).unwrap();

        let line = &store.lines()[0];
        assert_eq!(line.item.unit_price, Decimal::new(4800, 2));
        assert_eq!(line.item.stock_ceiling, Some(3));
        assert_eq!(line.quantity, 3);
    }

    #[test]
    fn test_add_rejects_unknown_product_and_bad_size() {
        let catalog = catalog();
        let mut store = store();

        assert!(matches!(
            add(&mut store, &catalog, "nope", None, 1),
            Err(CliError::UnknownProduct(_))
        ));
        assert!(matches!(
            add(&mut store, &catalog, "moon-ring", None, 1),
            Err(CliError::Size { .. })
        ));
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_update_with_and_without_size() {
        let catalog = catalog();
        let mut store = store();
        add(&mut store, &catalog, "moon-ring", Some("6"), 1).unwrap();
        add(&mut store, &catalog, "moon-ring", Some("7"), 1).unwrap();
        add(&mut store, &catalog, "pearl-drops", None, 1).unwrap();

        update(&mut store, &catalog, "moon-ring", 9, Some("7")).unwrap();
        assert_eq!(store.cart().line(&ProductId::new("r1"), Some("7")).unwrap().quantity, 5);
        assert_eq!(store.cart().line(&ProductId::new("r1"), Some("6")).unwrap().quantity, 1);

        update(&mut store, &catalog, "pearl-drops", 9, None).unwrap();
        assert_eq!(store.cart().line(&ProductId::new("e1"), None).unwrap().quantity, 4);

        update(&mut store, &catalog, "moon-ring", 0, None).unwrap();
        assert_eq!(store.lines().len(), 1);
    }

    #[test]
    fn test_remove_by_slug_or_id() {
        let catalog = catalog();
        let mut store = store();
        add(&mut store, &catalog, "moon-ring", Some("6"), 1).unwrap();
        add(&mut store, &catalog, "moon-ring", Some("7"), 1).unwrap();
        store.add_item(CartItem::new("gone", "Retired", Decimal::ONE), 1);

        remove(&mut store, &catalog, "moon-ring", Some("6"), false);
        assert_eq!(store.lines().len(), 2);

        remove(&mut store, &catalog, "gone", None, false);
        assert_eq!(store.lines().len(), 1);

        remove(&mut store, &catalog, "moon-ring", None, true);
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_complete_clears_once() {
        let catalog = catalog();
        let mut store = store();
        add(&mut store, &catalog, "pearl-drops", None, 1).unwrap();

        assert!(!complete(&mut store, "cs_1", OutcomeKind::Failed));
        assert!(complete(&mut store, "cs_1", OutcomeKind::Completed));

        add(&mut store, &catalog, "pearl-drops", None, 1).unwrap();
        assert!(!complete(&mut store, "cs_1", OutcomeKind::Completed));
        assert_eq!(store.total_items(), 1);
    }

    #[test]
    fn test_render() {
        let catalog = catalog();
        let mut store = store();
        assert_eq!(render(&store, CurrencyCode::USD), "Cart is empty\n");

        add(&mut store, &catalog, "moon-ring", Some("6"), 2).unwrap();
        let text = render(&store, CurrencyCode::USD);
        assert!(text.contains("Moon Ring (size 6)"));
        assert!(text.contains("$96.00"));
        assert!(text.ends_with("2 item(s), total $96.00\n"));

        let json: serde_json::Value = serde_json::from_str(&render_json(&store).unwrap()).unwrap();
        assert_eq!(json["totals"]["total_items"], 2);
        assert_eq!(json["items"][0]["size"], "6");
    }
}
