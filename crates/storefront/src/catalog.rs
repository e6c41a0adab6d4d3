//! File-backed catalog.
//!
//! The catalog (products, categories, translatable text snippets, and "meet
//! the artist" events) is exported from the managed backend as one JSON
//! document and loaded into memory at startup. Queries mirror what the
//! backend offers: equality filters, case-insensitive name search, ordering,
//! and range pagination.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use atelier_core::types::{CategoryId, CurrencyCode, Price, ProductId, SnippetKey};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::MAX_PRODUCTS_PER_PAGE;

/// Locale used when a snippet has no translation for the requested one.
pub const DEFAULT_LOCALE: &str = "en";

/// Errors raised while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error reading catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate {kind} in catalog: {value}")]
    Duplicate { kind: &'static str, value: String },
    #[error("Product {0} has a negative price")]
    NegativePrice(ProductId),
    #[error("Invalid image reference {reference:?}: {source}")]
    InvalidImage {
        reference: String,
        source: url::ParseError,
    },
}

/// Stock for one size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub size: String,
    pub stock: u32,
}

/// A product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub image: Option<String>,
    /// Sizes on offer; empty for one-size pieces.
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
    /// Stock for one-size pieces; `None` when not tracked.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub position: u32,
}

const fn default_published() -> bool {
    true
}

/// Why a size does not fit a product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("a size is required for this product")]
    Required,
    #[error("unknown size {0:?}")]
    Unknown(String),
    #[error("this product has no sizes")]
    NotSized,
}

impl Product {
    /// Known stock for a size (or for the product when it is one-size).
    ///
    /// # Errors
    ///
    /// Returns `SizeError` if the size does not match the product's sizes.
    pub fn stock_for(&self, size: Option<&str>) -> Result<Option<u32>, SizeError> {
        match (self.sizes.is_empty(), size) {
            (true, None) => Ok(self.stock),
            (true, Some(_)) => Err(SizeError::NotSized),
            (false, None) => Err(SizeError::Required),
            (false, Some(size)) => self
                .sizes
                .iter()
                .find(|s| s.size == size)
                .map(|s| Some(s.stock))
                .ok_or_else(|| SizeError::Unknown(size.to_owned())),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: CategoryId,
    pub name: String,
}

/// A translatable text snippet used as decorative filler in the catalog grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnippet {
    pub key: SnippetKey,
    /// Text by locale code.
    pub translations: BTreeMap<String, String>,
}

/// A snippet resolved to one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedSnippet {
    pub key: SnippetKey,
    pub text: String,
}

/// A "meet the artist" event at a market or gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub venue: String,
    pub city: String,
    pub starts_on: NaiveDate,
    #[serde(default)]
    pub ends_on: Option<NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Event {
    /// Last day of the event.
    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.ends_on.unwrap_or(self.starts_on)
    }
}

/// The catalog document as exported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub snippets: Vec<TextSnippet>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Product ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Position,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Product listing query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Category slug to filter on.
    pub category: Option<String>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
}

/// One page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage<'a> {
    pub items: Vec<&'a Product>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug)]
struct CatalogData {
    currency: CurrencyCode,
    categories: Vec<Category>,
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
    by_slug: HashMap<String, usize>,
    snippets: Vec<TextSnippet>,
    events: Vec<Event>,
}

/// In-memory catalog, cheaply cloneable.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    inner: Arc<CatalogData>,
}

impl CatalogStore {
    /// Load the catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails validation.
    pub fn load(path: &Path, media_base_url: Option<&Url>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json, media_base_url)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.inner.products.len(),
            snippets = catalog.inner.snippets.len(),
            events = catalog.inner.events.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, duplicate ids or slugs, negative
    /// prices, or image references that cannot be resolved.
    pub fn from_json(json: &str, media_base_url: Option<&Url>) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_file(file, media_base_url)
    }

    /// Validate a parsed catalog document.
    ///
    /// # Errors
    ///
    /// See [`CatalogStore::from_json`].
    pub fn from_file(mut file: CatalogFile, media_base_url: Option<&Url>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(file.products.len());
        let mut by_slug = HashMap::with_capacity(file.products.len());
        let category_slugs: HashSet<&CategoryId> = file.categories.iter().map(|c| &c.slug).collect();

        for (index, product) in file.products.iter().enumerate() {
            if product.price.is_sign_negative() {
                return Err(CatalogError::NegativePrice(product.id.clone()));
            }
            if by_id.insert(product.id.clone(), index).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "product id",
                    value: product.id.to_string(),
                });
            }
            if by_slug.insert(product.slug.clone(), index).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "product slug",
                    value: product.slug.clone(),
                });
            }
            if let Some(category) = &product.category {
                if !category_slugs.contains(category) {
                    tracing::warn!(product_id = %product.id, %category, "Product references unknown category");
                }
            }
        }

        let mut snippet_keys = HashSet::new();
        for snippet in &file.snippets {
            if !snippet_keys.insert(&snippet.key) {
                return Err(CatalogError::Duplicate {
                    kind: "snippet key",
                    value: snippet.key.to_string(),
                });
            }
        }

        if let Some(base) = media_base_url {
            for product in &mut file.products {
                resolve_image(&mut product.image, base)?;
            }
            for event in &mut file.events {
                resolve_image(&mut event.image, base)?;
            }
        }

        file.events.sort_by_key(|event| event.starts_on);

        Ok(Self {
            inner: Arc::new(CatalogData {
                currency: file.currency,
                categories: file.categories,
                products: file.products,
                by_id,
                by_slug,
                snippets: file.snippets,
                events: file.events,
            }),
        })
    }

    /// Store currency.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.currency
    }

    /// Format an amount in the store currency.
    #[must_use]
    pub fn price(&self, amount: Decimal) -> Price {
        Price::new(amount, self.inner.currency)
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.inner.categories
    }

    /// Look up a product by id, published or not.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.inner
            .by_id
            .get(id)
            .and_then(|&index| self.inner.products.get(index))
    }

    /// Look up a published product by slug.
    #[must_use]
    pub fn product_by_slug(&self, slug: &str) -> Option<&Product> {
        self.inner
            .by_slug
            .get(slug)
            .and_then(|&index| self.inner.products.get(index))
            .filter(|product| product.published)
    }

    /// Published products in display order, optionally limited to a category.
    #[must_use]
    pub fn listed_products(&self, category: Option<&str>) -> Vec<&Product> {
        let mut products: Vec<&Product> = self
            .inner
            .products
            .iter()
            .filter(|p| p.published)
            .filter(|p| category.is_none_or(|c| p.category.as_ref().is_some_and(|pc| pc.as_str() == c)))
            .collect();
        products.sort_by_key(|p| p.position);
        products
    }

    /// Filter, order, and paginate published products.
    ///
    /// `default_per_page` applies when the query has no page size; requested
    /// sizes are clamped to `1..=MAX_PRODUCTS_PER_PAGE`. Pages are 1-based and
    /// a page past the end is empty.
    #[must_use]
    pub fn query(&self, query: &ProductQuery, default_per_page: u32) -> ProductPage<'_> {
        let mut products = self.listed_products(query.category.as_deref());

        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            products.retain(|p| p.name.to_lowercase().contains(&term));
        }

        match query.sort {
            ProductSort::Position => {}
            ProductSort::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::Name => products.sort_by_key(|p| p.name.to_lowercase()),
        }

        let per_page = query
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, MAX_PRODUCTS_PER_PAGE);
        let page = query.page.unwrap_or(1).max(1);
        let total = products.len();
        let per_page_len = per_page as usize;
        let offset = (page as usize - 1).saturating_mul(per_page_len);

        let items = products.into_iter().skip(offset).take(per_page_len).collect();

        ProductPage {
            items,
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page_len),
        }
    }

    /// Snippets resolved to `locale`, falling back to [`DEFAULT_LOCALE`].
    ///
    /// Snippets with no usable translation are skipped.
    #[must_use]
    pub fn snippets(&self, locale: &str) -> Vec<LocalizedSnippet> {
        self.inner
            .snippets
            .iter()
            .filter_map(|snippet| {
                let text = snippet
                    .translations
                    .get(locale)
                    .filter(|t| !t.trim().is_empty())
                    .or_else(|| snippet.translations.get(DEFAULT_LOCALE))
                    .filter(|t| !t.trim().is_empty())?;
                Some(LocalizedSnippet {
                    key: snippet.key.clone(),
                    text: text.clone(),
                })
            })
            .collect()
    }

    /// Events that have not finished by `today`, soonest first.
    #[must_use]
    pub fn upcoming_events(&self, today: NaiveDate) -> Vec<&Event> {
        self.inner
            .events
            .iter()
            .filter(|event| event.last_day() >= today)
            .collect()
    }
}

/// Turn a relative image reference into an absolute media URL.
fn resolve_image(image: &mut Option<String>, base: &Url) -> Result<(), CatalogError> {
    let Some(reference) = image.as_deref() else {
        return Ok(());
    };
    if Url::parse(reference).is_ok() {
        return Ok(());
    }
    let resolved = base
        .join(reference.trim_start_matches('/'))
        .map_err(|source| CatalogError::InvalidImage {
            reference: reference.to_owned(),
            source,
        })?;
    *image = Some(resolved.into());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "currency": "USD",
        "categories": [
            { "slug": "rings", "name": "Rings" },
            { "slug": "earrings", "name": "Earrings" }
        ],
        "products": [
            { "id": "r1", "slug": "moon-ring", "name": "Moon Ring", "price": "48.00",
              "category": "rings", "image": "rings/moon.jpg", "position": 2,
              "sizes": [ { "size": "6", "stock": 2 }, { "size": "7", "stock": 0 } ] },
            { "id": "r2", "slug": "sun-ring", "name": "Sun Ring", "price": "52.50",
              "category": "rings", "position": 1,
              "sizes": [ { "size": "7", "stock": 4 } ] },
            { "id": "e1", "slug": "pearl-drops", "name": "Pearl Drops", "price": "32.00",
              "category": "earrings", "position": 3, "stock": 5 },
            { "id": "e2", "slug": "draft-hoops", "name": "Draft Hoops", "price": "20",
              "category": "earrings", "position": 4, "published": false }
        ],
        "snippets": [
            { "key": "handmade", "translations": { "en": "Handmade in small batches", "fr": "Fait main" } },
            { "key": "studio", "translations": { "en": "From our studio", "fr": "" } },
            { "key": "fr-only", "translations": { "fr": "Bijoux uniques" } }
        ],
        "events": [
            { "id": "ev2", "title": "Winter Fair", "venue": "Hall B", "city": "Lyon",
              "starts_on": "2026-12-05", "ends_on": "2026-12-07" },
            { "id": "ev1", "title": "Open Studio", "venue": "Studio", "city": "Paris",
              "starts_on": "2026-10-10" }
        ]
    }"#;

    fn catalog() -> CatalogStore {
        CatalogStore::from_json(CATALOG, None).unwrap()
    }

    fn ids<'a>(page: &'a ProductPage<'a>) -> Vec<&'a str> {
        page.items.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_listed_products_in_position_order() {
        let catalog = catalog();
        let ids: Vec<&str> = catalog
            .listed_products(None)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["r2", "r1", "e1"]);
    }

    #[test]
    fn test_category_filter() {
        let catalog = catalog();
        let query = ProductQuery {
            category: Some("earrings".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&catalog.query(&query, 12)), vec!["e1"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = catalog();
        let query = ProductQuery {
            search: Some("  RING ".to_string()),
            sort: ProductSort::PriceDesc,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&catalog.query(&query, 12)), vec!["r2", "r1"]);
    }

    #[test]
    fn test_pagination_ranges() {
        let catalog = catalog();
        let query = ProductQuery {
            page: Some(2),
            per_page: Some(2),
            sort: ProductSort::Name,
            ..ProductQuery::default()
        };
        let page = catalog.query(&query, 12);
        assert_eq!(ids(&page), vec!["r2"]);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);

        let past_end = ProductQuery {
            page: Some(9),
            ..query
        };
        assert!(catalog.query(&past_end, 12).items.is_empty());
    }

    #[test]
    fn test_page_size_is_clamped() {
        let catalog = catalog();
        let query = ProductQuery {
            page: Some(0),
            per_page: Some(0),
            ..ProductQuery::default()
        };
        let page = catalog.query(&query, 12);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_unpublished_hidden_from_slug_lookup() {
        let catalog = catalog();
        assert!(catalog.product_by_slug("draft-hoops").is_none());
        assert!(catalog.product(&ProductId::new("e2")).is_some());
        assert_eq!(catalog.product_by_slug("moon-ring").unwrap().id.as_str(), "r1");
    }

    #[test]
    fn test_stock_for_sizes() {
        let catalog = catalog();
        let ring = catalog.product(&ProductId::new("r1")).unwrap();
        assert_eq!(ring.stock_for(Some("6")), Ok(Some(2)));
        assert_eq!(ring.stock_for(None), Err(SizeError::Required));
        assert_eq!(ring.stock_for(Some("9")), Err(SizeError::Unknown("9".to_string())));

        let drops = catalog.product(&ProductId::new("e1")).unwrap();
        assert_eq!(drops.stock_for(None), Ok(Some(5)));
        assert_eq!(drops.stock_for(Some("M")), Err(SizeError::NotSized));
    }

    #[test]
    fn test_snippets_fall_back_to_default_locale() {
        let catalog = catalog();

        let fr: Vec<String> = catalog.snippets("fr").into_iter().map(|s| s.text).collect();
        assert_eq!(fr, vec!["Fait main", "From our studio", "Bijoux uniques"]);

        let en: Vec<String> = catalog.snippets("en").into_iter().map(|s| s.text).collect();
        assert_eq!(en, vec!["Handmade in small batches", "From our studio"]);
    }

    #[test]
    fn test_upcoming_events_sorted_and_filtered() {
        let catalog = catalog();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let events: Vec<&str> = catalog
            .upcoming_events(today)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(events, vec!["ev2"]);

        let earlier = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(catalog.upcoming_events(earlier).len(), 2);
        assert_eq!(catalog.upcoming_events(earlier)[0].id, "ev1");
    }

    #[test]
    fn test_images_resolved_against_media_base() {
        let base = Url::parse("https://media.example.net/atelier/").unwrap();
        let catalog = CatalogStore::from_json(CATALOG, Some(&base)).unwrap();
        let ring = catalog.product(&ProductId::new("r1")).unwrap();
        assert_eq!(
            ring.image.as_deref(),
            Some("https://media.example.net/atelier/rings/moon.jpg")
        );
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let json = r#"{ "products": [
            { "id": "a", "slug": "same", "name": "A", "price": "1" },
            { "id": "b", "slug": "same", "name": "B", "price": "2" }
        ] }"#;
        let err = CatalogStore::from_json(json, None).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate { kind: "product slug", .. }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let json = r#"{ "products": [ { "id": "a", "slug": "a", "name": "A", "price": "-1" } ] }"#;
        let err = CatalogStore::from_json(json, None).unwrap_err();
        assert!(matches!(err, CatalogError::NegativePrice(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = CatalogStore::load(&path, None).unwrap();
        assert_eq!(catalog.categories().len(), 2);
        assert!(CatalogStore::load(&dir.path().join("missing.json"), None).is_err());
    }
}
