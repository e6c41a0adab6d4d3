//! Catalog grid preview and layout file validation.

use std::path::Path;

use atelier_core::layout::{
    Arrangement, Breakpoint, CellContent, LayoutConfig, Placeholders, ResponsiveLayout, RowPattern,
    arrange,
};
use atelier_storefront::catalog::{CatalogStore, DEFAULT_LOCALE, LocalizedSnippet, Product};
use atelier_storefront::routes::catalog::shuffle_snippets;
use atelier_storefront::state::load_layout;

use crate::error::CliError;

const CELL_WIDTH: usize = 18;

/// Options for [`render`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions<'a> {
    pub breakpoint: Option<Breakpoint>,
    pub category: Option<&'a str>,
    pub locale: Option<&'a str>,
    pub seed: Option<u64>,
    pub placeholders: bool,
}

/// Load a layout file, or the stock layout when no file is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn load(path: Option<&Path>) -> Result<ResponsiveLayout, CliError> {
    Ok(path.map(load_layout).transpose()?.unwrap_or_default())
}

/// Draw the catalog grid as text, one block per breakpoint.
///
/// Products show as their slug, snippets as `"key"`, placeholders as `.`.
#[must_use]
pub fn render(catalog: &CatalogStore, layout: &ResponsiveLayout, options: &RenderOptions<'_>) -> String {
    let products = catalog.listed_products(options.category);
    let snippets = shuffle_snippets(
        catalog.snippets(options.locale.unwrap_or(DEFAULT_LOCALE)),
        options.seed,
    );
    let placeholders = if options.placeholders {
        Placeholders::Emit
    } else {
        Placeholders::Omit
    };

    let breakpoints = options
        .breakpoint
        .map_or_else(|| Breakpoint::ALL.to_vec(), |breakpoint| vec![breakpoint]);

    let mut out = String::new();
    for breakpoint in breakpoints {
        let config = layout.get(breakpoint);
        draw_grid(&mut out, config, &products, &snippets, placeholders);
    }
    out
}

fn draw_grid(
    out: &mut String,
    config: &LayoutConfig,
    products: &[&Product],
    snippets: &[LocalizedSnippet],
    placeholders: Placeholders,
) {
    let columns = config.columns();
    let cells = arrange(products, snippets, config, placeholders);
    let rows = cells.iter().map(|cell| cell.row).max().unwrap_or(0);

    out.push_str(&format!("{} ({columns} columns, {rows} rows)\n", config.breakpoint()));

    let mut grid = vec![vec![String::new(); columns]; rows];
    for cell in &cells {
        let label = match cell.content {
            CellContent::Product(product) => product.slug.clone(),
            CellContent::Text(snippet) => format!("\"{}\"", snippet.key),
            CellContent::Blank => ".".to_owned(),
        };
        if let Some(slot) = grid
            .get_mut(cell.row - 1)
            .and_then(|row| row.get_mut(cell.column - 1))
        {
            *slot = label;
        }
    }

    for row in grid {
        let line = row
            .iter()
            .map(|label| format!("{label:<CELL_WIDTH$}"))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push('\n');
}

/// Validate a layout file and summarize each breakpoint.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn check(path: &Path) -> Result<String, CliError> {
    let layout = load_layout(path)?;

    let mut out = String::new();
    for breakpoint in Breakpoint::ALL {
        let config = layout.get(breakpoint);
        match config.arrangement() {
            Arrangement::SingleColumn => {
                out.push_str(&format!("{breakpoint}: single column\n"));
            }
            Arrangement::Patterned { rows, columns } => {
                let slots: usize = rows.iter().map(RowPattern::product_slots).sum();
                let patterns = rows.iter().map(ToString::to_string).collect::<Vec<_>>().join(" / ");
                out.push_str(&format!(
                    "{breakpoint}: {columns} columns, {} patterns, {slots} product slots per cycle: {patterns}\n",
                    rows.len()
                ));
            }
        }
    }
    Ok(out)
}
