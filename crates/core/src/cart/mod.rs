//! Shopping cart aggregate.
//!
//! A cart is a list of line items keyed by `(product id, size)`. Two lines for
//! the same product with different sizes (including "no size") are distinct.
//! Quantities are kept between 1 and [`MAX_QUANTITY_PER_LINE`], and never
//! above the known stock for the line's size. Totals are derived from the
//! lines on every read and are never stored.
//!
//! [`Cart`] holds the rules and has no side effects. [`CartStore`] wraps it
//! with one-time hydration from a [`CartStorage`] and saves after every
//! mutation.

mod storage;
mod store;

pub use storage::{CartSnapshot, CartStorage, CartStorageError, MemoryStorage, SNAPSHOT_VERSION};
pub use store::{CartStore, CheckoutGate, CheckoutOutcome, Hydration};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Hard cap on the quantity of a single line item.
pub const MAX_QUANTITY_PER_LINE: u32 = 10;

/// A product as offered to the cart, without a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Price of one unit in the store currency.
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Known stock for this size, if the product page reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_ceiling: Option<u32>,
}

impl CartItem {
    /// Create an item with no size, image, or stock information.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            image: None,
            size: None,
            stock_ceiling: None,
        }
    }

    /// Set the size discriminator.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Set the display image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the known stock for the item's size.
    #[must_use]
    pub fn with_stock_ceiling(mut self, ceiling: u32) -> Self {
        self.stock_ceiling = Some(ceiling);
        self
    }

    /// Identity of the line this item belongs to.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.size.clone())
    }

    fn matches(&self, product_id: &ProductId, size: Option<&str>) -> bool {
        &self.product_id == product_id && self.size.as_deref() == size
    }
}

/// Identity of a line item: product plus optional size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub size: Option<String>,
}

impl LineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, size: Option<String>) -> Self {
        Self { product_id, size }
    }
}

/// One `(product, size)` entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(flatten)]
    pub item: CartItem,
    pub quantity: u32,
}

impl CartLineItem {
    /// `quantity × unit_price` for this line, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item
            .unit_price
            .saturating_mul(Decimal::from(self.quantity))
    }

    /// Identity of this line.
    #[must_use]
    pub fn key(&self) -> LineKey {
        self.item.key()
    }
}

/// Which lines of a product a removal applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeScope<'a> {
    /// Only the line with exactly this size (`None` is the unsized line).
    Exact(Option<&'a str>),
    /// Every line of the product, whatever its size.
    AllSizes,
}

impl SizeScope<'_> {
    fn includes(&self, line: &CartLineItem, product_id: &ProductId) -> bool {
        match self {
            Self::Exact(size) => line.item.matches(product_id, *size),
            Self::AllSizes => &line.item.product_id == product_id,
        }
    }
}

/// Totals derived from the line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of all line quantities.
    pub total_items: u32,
    /// Sum of `quantity × unit_price` over all lines.
    pub total_price: Decimal,
}

/// Clamp a requested quantity to the per-line cap and the stock ceiling.
fn capped_quantity(requested: u64, stock_ceiling: Option<u32>) -> u32 {
    let cap = stock_ceiling.map_or(MAX_QUANTITY_PER_LINE, |stock| {
        stock.min(MAX_QUANTITY_PER_LINE)
    });
    u32::try_from(requested.min(u64::from(cap))).unwrap_or(cap)
}

/// The cart aggregate: ordered line items plus the quantity rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Rebuild a cart from stored lines.
    ///
    /// Lines are replayed through [`Cart::add_item`], so zero quantities are
    /// dropped, duplicate keys are merged, and caps are re-applied.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.add_item(line.item, line.quantity);
        }
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// Find the line for a product and size.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, size: Option<&str>) -> Option<&CartLineItem> {
        self.lines
            .iter()
            .find(|line| line.item.matches(product_id, size))
    }

    /// Returns true if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` units of an item.
    ///
    /// Merges into the existing `(product, size)` line if there is one. The
    /// resulting quantity is capped at [`MAX_QUANTITY_PER_LINE`] and at the
    /// item's stock ceiling. A zero quantity changes nothing.
    pub fn add_item(&mut self, item: CartItem, quantity: u32) {
        if quantity == 0 {
            tracing::debug!(product_id = %item.product_id, "ignoring add of zero quantity");
            return;
        }

        let position = self
            .lines
            .iter()
            .position(|line| line.item.matches(&item.product_id, item.size.as_deref()));

        match position {
            Some(index) => {
                let Some(line) = self.lines.get_mut(index) else {
                    return;
                };
                if item.stock_ceiling.is_some() {
                    line.item.stock_ceiling = item.stock_ceiling;
                }
                let requested = u64::from(line.quantity) + u64::from(quantity);
                line.quantity = capped_quantity(requested, line.item.stock_ceiling);
                if line.quantity == 0 {
                    self.lines.remove(index);
                }
            }
            None => {
                let quantity = capped_quantity(u64::from(quantity), item.stock_ceiling);
                if quantity > 0 {
                    self.lines.push(CartLineItem { item, quantity });
                }
            }
        }
    }

    /// Remove the lines of a product selected by `scope`.
    pub fn remove_item(&mut self, product_id: &ProductId, scope: SizeScope<'_>) {
        self.lines.retain(|line| !scope.includes(line, product_id));
    }

    /// Set the quantity of every line of a product, whatever its size.
    ///
    /// A quantity of zero or less removes those lines. Positive quantities
    /// are capped exactly as in [`Cart::add_item`].
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        let Ok(requested) = u64::try_from(quantity) else {
            self.remove_item(product_id, SizeScope::AllSizes);
            return;
        };
        if requested == 0 {
            self.remove_item(product_id, SizeScope::AllSizes);
            return;
        }

        for line in &mut self.lines {
            if &line.item.product_id == product_id {
                line.quantity = capped_quantity(requested, line.item.stock_ceiling);
            }
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    /// Set the quantity of the line matching both product and size.
    ///
    /// A quantity of zero or less removes only that line. Otherwise the line
    /// is set to `min(quantity, stock_ceiling, MAX_QUANTITY_PER_LINE)` and the
    /// ceiling is remembered for later updates. Other sizes are untouched.
    pub fn update_quantity_with_size(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        size: Option<&str>,
        stock_ceiling: u32,
    ) {
        let requested = u64::try_from(quantity).unwrap_or(0);
        if requested == 0 {
            self.remove_item(product_id, SizeScope::Exact(size));
            return;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.item.matches(product_id, size))
        {
            line.item.stock_ceiling = Some(stock_ceiling);
            line.quantity = capped_quantity(requested, Some(stock_ceiling));
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Totals recomputed from the current lines.
    ///
    /// The price sum saturates at [`Decimal::MAX`] instead of overflowing.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.lines
            .iter()
            .fold(CartTotals::default(), |totals, line| CartTotals {
                total_items: totals.total_items.saturating_add(line.quantity),
                total_price: totals.total_price.saturating_add(line.line_total()),
            })
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.totals().total_items
    }

    /// Sum of `quantity × unit_price` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.totals().total_price
    }
}
