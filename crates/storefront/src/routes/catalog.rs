//! Catalog grid layout handlers.
//!
//! The grid interleaves product cards with decorative text snippets. Snippets
//! are shuffled here, per request, before the layout engine runs; pass `seed`
//! to get the same shuffle back (useful for caching and for tests).

use atelier_core::layout::{
    Breakpoint, LayoutCell, LayoutConfig, Placeholders, ResponsiveLayout, UnknownBreakpoint,
    arrange,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::catalog::{CatalogStore, DEFAULT_LOCALE, LocalizedSnippet, Product};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Layout query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LayoutQuery {
    /// Category slug to limit the grid to.
    pub category: Option<String>,
    /// Locale for text snippets (default: `en`).
    pub locale: Option<String>,
    /// Seed for the snippet shuffle.
    pub seed: Option<u64>,
    /// Emit blank cells for unfilled slots.
    #[serde(default)]
    pub placeholders: bool,
}

/// Product card payload of a grid cell.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCard {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub display_price: String,
    pub image: Option<String>,
}

impl ProductCard {
    fn new(product: &Product, catalog: &CatalogStore) -> Self {
        Self {
            id: product.id.to_string(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            display_price: catalog.price(product.price).display(),
            image: product.image.clone(),
        }
    }
}

/// Grid for one breakpoint.
#[derive(Debug, Serialize)]
struct GridView<'a> {
    breakpoint: Breakpoint,
    columns: usize,
    rows: usize,
    cells: Vec<LayoutCell<'a, ProductCard, LocalizedSnippet>>,
}

impl<'a> GridView<'a> {
    fn new(config: &LayoutConfig, cells: Vec<LayoutCell<'a, ProductCard, LocalizedSnippet>>) -> Self {
        Self {
            breakpoint: config.breakpoint(),
            columns: config.columns(),
            rows: cells.iter().map(|cell| cell.row).max().unwrap_or(0),
            cells,
        }
    }
}

/// Grids for every breakpoint.
#[derive(Debug, Serialize)]
struct AllGrids<'a> {
    desktop: GridView<'a>,
    tablet: GridView<'a>,
    mobile: GridView<'a>,
}

/// Inputs for the layout engine, shared by every breakpoint of one request.
struct GridInputs {
    cards: Vec<ProductCard>,
    snippets: Vec<LocalizedSnippet>,
    placeholders: Placeholders,
}

impl GridInputs {
    fn gather(state: &AppState, query: &LayoutQuery) -> Self {
        let catalog = state.catalog();
        let cards = catalog
            .listed_products(query.category.as_deref())
            .into_iter()
            .map(|product| ProductCard::new(product, catalog))
            .collect();
        let locale = query.locale.as_deref().unwrap_or(DEFAULT_LOCALE);
        let snippets = shuffle_snippets(catalog.snippets(locale), query.seed);
        let placeholders = if query.placeholders {
            Placeholders::Emit
        } else {
            Placeholders::Omit
        };

        Self {
            cards,
            snippets,
            placeholders,
        }
    }

    fn grid(&self, config: &LayoutConfig) -> GridView<'_> {
        let cells = arrange(&self.cards, &self.snippets, config, self.placeholders);
        GridView::new(config, cells)
    }

    fn all_grids(&self, layout: &ResponsiveLayout) -> AllGrids<'_> {
        let cells = layout.arrange_all(&self.cards, &self.snippets, self.placeholders);
        AllGrids {
            desktop: GridView::new(&layout.desktop, cells.desktop),
            tablet: GridView::new(&layout.tablet, cells.tablet),
            mobile: GridView::new(&layout.mobile, cells.mobile),
        }
    }
}

/// Shuffle snippets for visual variety, reproducibly when seeded.
#[must_use]
pub fn shuffle_snippets(mut snippets: Vec<LocalizedSnippet>, seed: Option<u64>) -> Vec<LocalizedSnippet> {
    match seed {
        Some(seed) => snippets.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => snippets.shuffle(&mut rand::rng()),
    }
    snippets
}

fn to_json<T: Serialize>(value: &T) -> Result<Json<Value>> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| AppError::Internal(format!("failed to serialize layout: {e}")))
}

/// Grids for every breakpoint.
#[instrument(skip(state))]
pub async fn all(State(state): State<AppState>, Query(query): Query<LayoutQuery>) -> Result<Json<Value>> {
    let inputs = GridInputs::gather(&state, &query);
    to_json(&inputs.all_grids(state.layout()))
}

/// Grid for one breakpoint.
#[instrument(skip(state))]
pub async fn one(
    State(state): State<AppState>,
    Path(breakpoint): Path<String>,
    Query(query): Query<LayoutQuery>,
) -> Result<Json<Value>> {
    let breakpoint: Breakpoint = breakpoint
        .parse()
        .map_err(|e: UnknownBreakpoint| AppError::NotFound(e.to_string()))?;

    let inputs = GridInputs::gather(&state, &query);
    to_json(&inputs.grid(state.layout().get(breakpoint)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_core::types::SnippetKey;

    use super::*;

    fn snippets(n: usize) -> Vec<LocalizedSnippet> {
        (0..n)
            .map(|i| LocalizedSnippet {
                key: SnippetKey::new(format!("s{i}")),
                text: format!("text {i}"),
            })
            .collect()
    }

    #[test]
    fn test_seeded_shuffle_is_reproducible() {
        let first = shuffle_snippets(snippets(12), Some(7));
        let second = shuffle_snippets(snippets(12), Some(7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_keeps_every_snippet() {
        let mut shuffled = shuffle_snippets(snippets(12), None);
        shuffled.sort_by(|a, b| a.key.cmp(&b.key));
        let mut expected = snippets(12);
        expected.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(shuffled, expected);
    }
}
