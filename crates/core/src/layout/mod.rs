//! Catalog grid layout engine.
//!
//! Interleaves an ordered product list and an ordered list of text snippets
//! into grid cells, following a breakpoint's row patterns. Patterns repeat
//! cyclically until every product is placed. Both inputs are consumed left to
//! right without skipping or reordering; shuffling snippets for variety is the
//! caller's job and must happen before calling [`arrange`].
//!
//! The engine is a pure function over borrowed slices: the same inputs always
//! produce the same cells, and calls share no state.
//!
//! ```
//! use atelier_core::layout::{arrange, Breakpoint, LayoutConfig, Placeholders};
//!
//! let config = LayoutConfig::from_patterns(Breakpoint::Desktop, ["S P P S", "P S P P"])?;
//! let cells = arrange(&["p1", "p2", "p3"], &["t1", "t2"], &config, Placeholders::Omit);
//!
//! let placed: Vec<_> = cells.iter().map(|c| (c.column, c.row)).collect();
//! assert_eq!(placed, [(1, 1), (2, 1), (3, 1), (4, 1), (1, 2)]);
//! # Ok::<(), atelier_core::layout::LayoutConfigError>(())
//! ```

mod config;
mod pattern;

pub use config::{
    Arrangement, ArrangementFile, Breakpoint, LayoutConfig, LayoutFile, ResponsiveLayout,
    UnknownBreakpoint,
};
pub use pattern::{LayoutConfigError, RowPattern, SlotKind};

use serde::Serialize;

/// Whether unfilled slots are materialized as blank cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholders {
    /// Unfilled slots produce no cell.
    #[default]
    Omit,
    /// Unfilled slots in emitted rows produce a [`CellContent::Blank`] cell,
    /// for grids that need every coordinate occupied to stay aligned.
    Emit,
}

/// Kind of a placed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Product,
    Text,
    Blank,
}

/// What a cell holds.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
#[serde(bound = "P: Serialize, T: Serialize")]
pub enum CellContent<'a, P, T> {
    Product(&'a P),
    Text(&'a T),
    Blank,
}

impl<P, T> Clone for CellContent<'_, P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, T> Copy for CellContent<'_, P, T> {}

/// A cell placed at 1-based grid coordinates.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(bound = "P: Serialize, T: Serialize")]
pub struct LayoutCell<'a, P, T> {
    pub column: usize,
    pub row: usize,
    pub content: CellContent<'a, P, T>,
}

impl<P, T> Clone for LayoutCell<'_, P, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, T> Copy for LayoutCell<'_, P, T> {}

impl<'a, P, T> LayoutCell<'a, P, T> {
    #[must_use]
    pub const fn kind(&self) -> CellKind {
        match self.content {
            CellContent::Product(_) => CellKind::Product,
            CellContent::Text(_) => CellKind::Text,
            CellContent::Blank => CellKind::Blank,
        }
    }

    /// The product in this cell, if any.
    #[must_use]
    pub const fn product(&self) -> Option<&'a P> {
        match self.content {
            CellContent::Product(product) => Some(product),
            _ => None,
        }
    }

    /// The text snippet in this cell, if any.
    #[must_use]
    pub const fn text(&self) -> Option<&'a T> {
        match self.content {
            CellContent::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Cells for every breakpoint.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(bound = "P: Serialize, T: Serialize")]
pub struct BreakpointLayouts<'a, P, T> {
    pub desktop: Vec<LayoutCell<'a, P, T>>,
    pub tablet: Vec<LayoutCell<'a, P, T>>,
    pub mobile: Vec<LayoutCell<'a, P, T>>,
}

impl ResponsiveLayout {
    /// Arrange the same inputs for every breakpoint.
    #[must_use]
    pub fn arrange_all<'a, P, T>(
        &self,
        products: &'a [P],
        snippets: &'a [T],
        placeholders: Placeholders,
    ) -> BreakpointLayouts<'a, P, T> {
        BreakpointLayouts {
            desktop: arrange(products, snippets, &self.desktop, placeholders),
            tablet: arrange(products, snippets, &self.tablet, placeholders),
            mobile: arrange(products, snippets, &self.mobile, placeholders),
        }
    }
}

/// Place products and text snippets on the grid described by `config`.
///
/// Empty product lists produce no cells; running out of snippets leaves
/// spacer slots unfilled. No further rows are started once every product is
/// placed.
#[must_use]
pub fn arrange<'a, P, T>(
    products: &'a [P],
    snippets: &'a [T],
    config: &LayoutConfig,
    placeholders: Placeholders,
) -> Vec<LayoutCell<'a, P, T>> {
    match config.arrangement() {
        Arrangement::SingleColumn => products
            .iter()
            .enumerate()
            .map(|(index, product)| LayoutCell {
                column: 1,
                row: index + 1,
                content: CellContent::Product(product),
            })
            .collect(),
        Arrangement::Patterned { rows, .. } => {
            arrange_patterned(products, snippets, rows, placeholders)
        }
    }
}

/// Upper bound on rows for `product_count` products.
///
/// Each full cycle through the patterns places at least
/// `product_slots_per_cycle` products, so the required rows never exceed
/// `ceil(N / per_cycle)` cycles; one extra cycle keeps the bound loose.
fn row_limit(product_count: usize, patterns: &[RowPattern]) -> usize {
    let per_cycle: usize = patterns.iter().map(RowPattern::product_slots).sum();
    if per_cycle == 0 {
        return 0;
    }
    (product_count.div_ceil(per_cycle) + 1) * patterns.len()
}

fn arrange_patterned<'a, P, T>(
    products: &'a [P],
    snippets: &'a [T],
    patterns: &[RowPattern],
    placeholders: Placeholders,
) -> Vec<LayoutCell<'a, P, T>> {
    let mut products = products.iter().peekable();
    let mut snippets = snippets.iter();
    let mut cells = Vec::new();
    let limit = row_limit(products.len(), patterns);

    for (row_index, pattern) in patterns.iter().cycle().take(limit).enumerate() {
        if products.peek().is_none() {
            break;
        }

        for (column_index, slot) in pattern.slots().iter().enumerate() {
            let content = match slot {
                SlotKind::Product => products.next().map(CellContent::Product),
                SlotKind::Spacer => snippets.next().map(CellContent::Text),
            };
            let content = match (content, placeholders) {
                (Some(content), _) => content,
                (None, Placeholders::Emit) => CellContent::Blank,
                (None, Placeholders::Omit) => continue,
            };
            cells.push(LayoutCell {
                column: column_index + 1,
                row: row_index + 1,
                content,
            });
        }
    }

    debug_assert!(products.peek().is_none(), "row limit cut the layout short");
    cells
}
