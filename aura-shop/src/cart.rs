//! Shopping bag state: line items, reducer actions, and the persisted store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CartStorage;

/// Storage key holding the serialized line-item array.
pub const CART_STORAGE_KEY: &str = "aa_cart";

/// One (product, size) pairing with a quantity and unit price.
///
/// Identity is the exact `(slug, size)` pair; adding a duplicate merges into
/// the existing line instead of appending a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub slug: String,
    pub name: String,
    /// Unit price in whole GH₵; integer math keeps totals drift-free.
    pub price: i64,
    /// Variant discriminator; empty for sizeless products.
    pub size: String,
    pub qty: u32,
    /// Display hint only, never part of identity or totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Display hint only, never part of identity or totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl CartItem {
    /// Whether this line is the entity identified by `(slug, size)`.
    #[must_use]
    pub fn matches(&self, slug: &str, size: &str) -> bool {
        self.slug == slug && self.size == size
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.qty))
    }
}

/// Candidate handed to [`CartStore::add_item`]; `qty` defaults to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemDraft {
    pub slug: String,
    pub name: String,
    pub price: i64,
    pub size: String,
    #[serde(default)]
    pub qty: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl CartItemDraft {
    /// Draft with defaulted quantity and no display hints.
    #[must_use]
    pub fn new(slug: &str, name: &str, price: i64, size: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            price,
            size: size.to_string(),
            qty: None,
            color: None,
            variant: None,
        }
    }

    /// Override the defaulted quantity.
    #[must_use]
    pub const fn with_qty(mut self, qty: u32) -> Self {
        self.qty = Some(qty);
        self
    }
}

/// Mutation applied to the line-item list by the pure reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Add(CartItemDraft),
    Remove { slug: String, size: String },
    UpdateQty { slug: String, size: String, qty: u32 },
    Clear,
    Hydrate(Vec<CartItem>),
}

/// Apply an action to the item list.
///
/// Pure state transition: no validation, no persistence. [`CartStore`] layers
/// both at the boundary, which keeps every transition unit-testable without a
/// storage backend.
pub fn apply(items: &mut Vec<CartItem>, action: CartAction) {
    match action {
        CartAction::Add(draft) => {
            let qty = draft.qty.unwrap_or(1).max(1);
            if let Some(existing) = items
                .iter_mut()
                .find(|item| item.matches(&draft.slug, &draft.size))
            {
                existing.qty = existing.qty.saturating_add(qty);
            } else {
                items.push(CartItem {
                    slug: draft.slug,
                    name: draft.name,
                    price: draft.price,
                    size: draft.size,
                    qty,
                    color: draft.color,
                    variant: draft.variant,
                });
            }
        }
        CartAction::Remove { slug, size } => {
            items.retain(|item| !item.matches(&slug, &size));
        }
        CartAction::UpdateQty { slug, size, qty } => {
            // Quantities clamp at one; removal is a distinct explicit action.
            if let Some(item) = items.iter_mut().find(|item| item.matches(&slug, &size)) {
                item.qty = qty.max(1);
            }
        }
        CartAction::Clear => items.clear(),
        CartAction::Hydrate(saved) => *items = saved,
    }
}

/// Sum of quantities across all lines.
#[must_use]
pub fn total_qty(items: &[CartItem]) -> u32 {
    items.iter().fold(0_u32, |acc, item| acc.saturating_add(item.qty))
}

/// Sum of line totals across all lines, before discount and shipping.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> i64 {
    items
        .iter()
        .fold(0_i64, |acc, item| acc.saturating_add(item.line_total()))
}

/// Read-only snapshot of the bag with totals recomputed at call time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total_qty: u32,
    pub total_price: i64,
}

impl Cart {
    /// Build a snapshot, deriving both totals from the items alone.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let total_qty = total_qty(&items);
        let total_price = subtotal(&items);
        Self {
            items,
            total_qty,
            total_price,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart boundary errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// Programmer error: the caller handed the store a malformed item.
    /// Nothing is mutated.
    #[error("invalid cart item: {reason}")]
    InvalidItem { reason: &'static str },
    /// The injected store rejected a write. The in-memory mutation stands,
    /// so the bag and its persisted snapshot may diverge until the next
    /// successful write.
    #[error("cart persistence failed: {0}")]
    Persist(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Persisted shopping bag.
///
/// Wraps the pure reducer with boundary validation and a write-through JSON
/// snapshot to the injected [`CartStorage`]. One instance per session is the
/// single writer; mutations run to completion before the next event.
pub struct CartStore<S: CartStorage> {
    items: Vec<CartItem>,
    storage: S,
    key: String,
}

impl<S: CartStorage> CartStore<S> {
    /// Hydrate from [`CART_STORAGE_KEY`]. Missing, corrupt, or wrong-shaped
    /// data falls back to an empty bag with a logged warning, never an error.
    #[must_use]
    pub fn hydrate(storage: S) -> Self {
        Self::hydrate_with_key(storage, CART_STORAGE_KEY)
    }

    /// Hydrate from a caller-chosen key.
    #[must_use]
    pub fn hydrate_with_key(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let saved = match storage.load(&key) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<CartItem>>(&json) {
                Ok(items) if items.iter().all(item_well_formed) => items,
                Ok(_) => {
                    log::warn!("discarding cart snapshot under {key:?} with malformed lines");
                    Vec::new()
                }
                Err(e) => {
                    log::warn!("discarding unreadable cart snapshot under {key:?}: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("cart hydration from {key:?} failed, starting empty: {e}");
                Vec::new()
            }
        };
        let mut store = Self {
            items: Vec::new(),
            storage,
            key,
        };
        apply(&mut store.items, CartAction::Hydrate(saved));
        store
    }

    /// Add a line or merge into the existing `(slug, size)` line.
    ///
    /// # Errors
    ///
    /// `InvalidItem` for an empty slug, non-positive price, or explicit zero
    /// quantity (state untouched); `Persist` when the write-through fails
    /// (state already mutated).
    pub fn add_item(&mut self, draft: CartItemDraft) -> Result<(), CartError> {
        if draft.slug.trim().is_empty() {
            return Err(CartError::InvalidItem {
                reason: "slug must not be empty",
            });
        }
        if draft.price <= 0 {
            return Err(CartError::InvalidItem {
                reason: "price must be positive",
            });
        }
        if draft.qty == Some(0) {
            return Err(CartError::InvalidItem {
                reason: "initial quantity must be at least one",
            });
        }
        apply(&mut self.items, CartAction::Add(draft));
        self.persist()
    }

    /// Remove the matching line; absent lines are a no-op, not an error.
    ///
    /// # Errors
    ///
    /// `Persist` when the write-through fails.
    pub fn remove_item(&mut self, slug: &str, size: &str) -> Result<(), CartError> {
        apply(
            &mut self.items,
            CartAction::Remove {
                slug: slug.to_string(),
                size: size.to_string(),
            },
        );
        self.persist()
    }

    /// Set the matching line's quantity, clamped to at least one; absent
    /// lines are a no-op.
    ///
    /// # Errors
    ///
    /// `Persist` when the write-through fails.
    pub fn update_qty(&mut self, slug: &str, size: &str, qty: u32) -> Result<(), CartError> {
        apply(
            &mut self.items,
            CartAction::UpdateQty {
                slug: slug.to_string(),
                size: size.to_string(),
                qty,
            },
        );
        self.persist()
    }

    /// Empty the bag unconditionally (used after a successful checkout).
    ///
    /// # Errors
    ///
    /// `Persist` when the write-through fails.
    pub fn clear(&mut self) -> Result<(), CartError> {
        apply(&mut self.items, CartAction::Clear);
        self.persist()
    }

    /// Snapshot with freshly derived totals.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        Cart::from_items(self.items.clone())
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn total_qty(&self) -> u32 {
        total_qty(&self.items)
    }

    #[must_use]
    pub fn total_price(&self) -> i64 {
        subtotal(&self.items)
    }

    fn persist(&self) -> Result<(), CartError> {
        let json =
            serde_json::to_string(&self.items).map_err(|e| CartError::Persist(Box::new(e)))?;
        self.storage
            .save(&self.key, &json)
            .map_err(|e| CartError::Persist(Box::new(e)))
    }
}

fn item_well_formed(item: &CartItem) -> bool {
    !item.slug.trim().is_empty() && item.price > 0 && item.qty >= 1
}
