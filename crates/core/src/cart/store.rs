//! Hydrating, persisting cart store.
//!
//! The store is constructed by the application and handed to whichever view
//! needs it. It loads the saved cart once, and writes a snapshot after every
//! mutation. Storage failures are logged and otherwise ignored: the in-memory
//! cart stays authoritative for the session.

use chrono::Utc;
use rust_decimal::Decimal;

use super::{
    Cart, CartItem, CartLineItem, CartSnapshot, CartStorage, CartTotals, SNAPSHOT_VERSION,
    SizeScope,
};
use crate::types::{CheckoutSessionId, ProductId};

/// How many completed checkout sessions are remembered for de-duplication.
const REMEMBERED_CHECKOUTS: usize = 16;

/// Whether the saved cart has been loaded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Saved state not loaded; the cart may look empty but is not known to be.
    Pending,
    /// Saved state loaded (or confirmed absent).
    Hydrated,
}

/// Answer to "may the checkout view proceed?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutGate {
    /// Hydration has not happened; do not redirect yet.
    Pending,
    /// Hydrated and empty; redirecting away from checkout is safe.
    Empty,
    /// Hydrated with at least one line.
    Ready,
}

/// Result of a hosted checkout session, as reported by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed { session_id: CheckoutSessionId },
    Failed { session_id: CheckoutSessionId },
    Expired { session_id: CheckoutSessionId },
}

impl CheckoutOutcome {
    /// Session the outcome refers to.
    #[must_use]
    pub const fn session_id(&self) -> &CheckoutSessionId {
        match self {
            Self::Completed { session_id }
            | Self::Failed { session_id }
            | Self::Expired { session_id } => session_id,
        }
    }
}

/// Cart state container with explicit load/save through a [`CartStorage`].
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
    hydration: Hydration,
    completed_checkouts: Vec<CheckoutSessionId>,
}

impl<S: CartStorage> CartStore<S> {
    /// Create an unhydrated store over `storage`.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            cart: Cart::new(),
            hydration: Hydration::Pending,
            completed_checkouts: Vec::new(),
        }
    }

    /// Create a store and hydrate it immediately.
    #[must_use]
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Load the saved cart. Runs once; later calls do nothing.
    ///
    /// Missing, unreadable, or unsupported snapshots hydrate to an empty cart.
    pub fn hydrate(&mut self) {
        if self.hydration == Hydration::Hydrated {
            return;
        }

        match self.storage.load() {
            Ok(Some(snapshot)) => {
                self.cart = Cart::from_lines(snapshot.items);
                self.completed_checkouts = snapshot.completed_checkouts;
                tracing::debug!(
                    lines = self.cart.lines().len(),
                    saved_at = %snapshot.saved_at,
                    "cart hydrated"
                );
            }
            Ok(None) => tracing::debug!("no saved cart, starting empty"),
            Err(e) => tracing::warn!(error = %e, "failed to load saved cart, starting empty"),
        }

        self.hydration = Hydration::Hydrated;
    }

    /// Current hydration state.
    #[must_use]
    pub const fn hydration(&self) -> Hydration {
        self.hydration
    }

    /// Returns true once the saved cart has been loaded.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.hydration == Hydration::Hydrated
    }

    /// Hydration-aware emptiness check for checkout routing.
    #[must_use]
    pub fn checkout_gate(&self) -> CheckoutGate {
        match (self.hydration, self.cart.is_empty()) {
            (Hydration::Pending, _) => CheckoutGate::Pending,
            (Hydration::Hydrated, true) => CheckoutGate::Empty,
            (Hydration::Hydrated, false) => CheckoutGate::Ready,
        }
    }

    /// The underlying cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        self.cart.lines()
    }

    /// Totals derived from the current lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.cart.total_items()
    }

    /// Sum of `quantity × unit_price` over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Consume the store and return its storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// See [`Cart::add_item`].
    pub fn add_item(&mut self, item: CartItem, quantity: u32) {
        self.mutate(|cart| cart.add_item(item, quantity));
    }

    /// See [`Cart::remove_item`].
    pub fn remove_item(&mut self, product_id: &ProductId, scope: SizeScope<'_>) {
        self.mutate(|cart| cart.remove_item(product_id, scope));
    }

    /// See [`Cart::update_quantity`].
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        self.mutate(|cart| cart.update_quantity(product_id, quantity));
    }

    /// See [`Cart::update_quantity_with_size`].
    pub fn update_quantity_with_size(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        size: Option<&str>,
        stock_ceiling: u32,
    ) {
        self.mutate(|cart| {
            cart.update_quantity_with_size(product_id, quantity, size, stock_ceiling);
        });
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.mutate(Cart::clear);
    }

    /// React to a payment provider notification.
    ///
    /// A completed session clears the cart once; a repeated notification for
    /// the same session is ignored so it cannot wipe a cart filled since.
    /// Failed and expired sessions keep the cart. Returns true if the cart
    /// was cleared.
    pub fn apply_checkout_outcome(&mut self, outcome: &CheckoutOutcome) -> bool {
        let CheckoutOutcome::Completed { session_id } = outcome else {
            tracing::info!(session_id = %outcome.session_id(), "checkout not completed, keeping cart");
            return false;
        };

        self.hydrate();
        if self.completed_checkouts.contains(session_id) {
            tracing::debug!(%session_id, "checkout completion already applied");
            return false;
        }

        self.completed_checkouts.push(session_id.clone());
        if self.completed_checkouts.len() > REMEMBERED_CHECKOUTS {
            let excess = self.completed_checkouts.len() - REMEMBERED_CHECKOUTS;
            self.completed_checkouts.drain(..excess);
        }

        tracing::info!(%session_id, items = self.cart.total_items(), "checkout completed, clearing cart");
        self.mutate(Cart::clear);
        true
    }

    fn mutate(&mut self, op: impl FnOnce(&mut Cart)) {
        self.hydrate();
        op(&mut self.cart);
        self.persist();
    }

    fn persist(&mut self) {
        let snapshot = CartSnapshot {
            version: SNAPSHOT_VERSION,
            items: self.cart.lines().to_vec(),
            completed_checkouts: self.completed_checkouts.clone(),
            saved_at: Utc::now(),
        };
        if let Err(e) = self.storage.save(&snapshot) {
            tracing::warn!(error = %e, "failed to save cart");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartStorageError, MemoryStorage};

    /// Storage that fails every operation.
    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn load(&self) -> Result<Option<CartSnapshot>, CartStorageError> {
            Err(CartStorageError::Io(std::io::Error::other("disk gone")))
        }

        fn save(&mut self, _snapshot: &CartSnapshot) -> Result<(), CartStorageError> {
            Err(CartStorageError::Io(std::io::Error::other("disk gone")))
        }
    }

    fn necklace() -> CartItem {
        CartItem::new("necklace-5", "Garnet Necklace", Decimal::new(8800, 2))
    }

    fn completed(id: &str) -> CheckoutOutcome {
        CheckoutOutcome::Completed {
            session_id: CheckoutSessionId::new(id),
        }
    }

    #[test]
    fn test_new_store_is_pending() {
        let store = CartStore::new(MemoryStorage::new());
        assert_eq!(store.hydration(), Hydration::Pending);
        assert_eq!(store.checkout_gate(), CheckoutGate::Pending);
    }

    #[test]
    fn test_hydrated_empty_store_gate() {
        let store = CartStore::open(MemoryStorage::new());
        assert!(store.is_hydrated());
        assert_eq!(store.checkout_gate(), CheckoutGate::Empty);
    }

    #[test]
    fn test_mutation_persists_snapshot() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(necklace(), 2);

        let snapshot = store.storage().snapshot().unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 2);
        assert_eq!(store.checkout_gate(), CheckoutGate::Ready);
    }

    #[test]
    fn test_state_survives_reopen() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(necklace().with_size("16in"), 3);
        store.add_item(necklace().with_size("18in"), 1);

        let reopened = CartStore::open(store.into_storage());
        assert_eq!(reopened.lines().len(), 2);
        assert_eq!(reopened.total_items(), 4);
        assert_eq!(reopened.total_price(), Decimal::new(35_200, 2));
    }

    #[test]
    fn test_hydrate_normalizes_saved_lines() {
        let line = |item: CartItem, quantity| CartLineItem { item, quantity };
        let snapshot = CartSnapshot {
            version: SNAPSHOT_VERSION,
            items: vec![
                line(necklace(), 4),
                line(necklace(), 3),
                line(necklace().with_size("16in"), 15),
                line(necklace().with_size("18in"), 0),
            ],
            completed_checkouts: Vec::new(),
            saved_at: Utc::now(),
        };

        let store = CartStore::open(MemoryStorage::with_snapshot(snapshot));
        let quantities: Vec<_> = store
            .lines()
            .iter()
            .map(|line| (line.item.size.as_deref(), line.quantity))
            .collect();
        assert_eq!(quantities, vec![(None, 7), (Some("16in"), 10)]);
        assert_eq!(store.total_items(), 17);
        assert_eq!(store.storage().saves(), 0);
    }

    #[test]
    fn test_mutation_before_hydrate_keeps_saved_lines() {
        let mut first = CartStore::open(MemoryStorage::new());
        first.add_item(necklace(), 1);

        let mut second = CartStore::new(first.into_storage());
        second.add_item(necklace(), 1);

        assert!(second.is_hydrated());
        assert_eq!(second.total_items(), 2);
    }

    #[test]
    fn test_hydrate_runs_once() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(necklace(), 1);
        store.hydrate();
        assert_eq!(store.total_items(), 1);
    }

    #[test]
    fn test_broken_storage_is_swallowed() {
        let mut store = CartStore::open(BrokenStorage);
        assert_eq!(store.checkout_gate(), CheckoutGate::Empty);

        store.add_item(necklace(), 4);
        assert_eq!(store.total_items(), 4);
    }

    #[test]
    fn test_completed_checkout_clears_once() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(necklace(), 1);

        assert!(store.apply_checkout_outcome(&completed("cs_1")));
        assert!(store.cart().is_empty());

        store.add_item(necklace(), 2);
        assert!(!store.apply_checkout_outcome(&completed("cs_1")));
        assert_eq!(store.total_items(), 2);
    }

    #[test]
    fn test_checkout_dedup_survives_reopen() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(necklace(), 1);
        store.apply_checkout_outcome(&completed("cs_9"));
        store.add_item(necklace(), 1);

        let mut reopened = CartStore::open(store.into_storage());
        assert!(!reopened.apply_checkout_outcome(&completed("cs_9")));
        assert_eq!(reopened.total_items(), 1);
    }

    #[test]
    fn test_failed_and_expired_keep_cart() {
        let mut store = CartStore::open(MemoryStorage::new());
        store.add_item(necklace(), 1);

        let failed = CheckoutOutcome::Failed {
            session_id: CheckoutSessionId::new("cs_2"),
        };
        let expired = CheckoutOutcome::Expired {
            session_id: CheckoutSessionId::new("cs_3"),
        };
        assert!(!store.apply_checkout_outcome(&failed));
        assert!(!store.apply_checkout_outcome(&expired));
        assert_eq!(store.total_items(), 1);
    }

    #[test]
    fn test_remembered_checkouts_are_bounded() {
        let mut store = CartStore::open(MemoryStorage::new());
        for n in 0..(REMEMBERED_CHECKOUTS + 4) {
            store.apply_checkout_outcome(&completed(&format!("cs_{n}")));
        }
        let snapshot = store.storage().snapshot().unwrap();
        assert_eq!(snapshot.completed_checkouts.len(), REMEMBERED_CHECKOUTS);
        assert_eq!(snapshot.completed_checkouts[0].as_str(), "cs_4");
    }
}
