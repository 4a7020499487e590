//! Ankara Aura Storefront Engine
//!
//! Platform-agnostic cart and checkout logic for the Ankara Aura storefront.
//! This crate provides the shopping-bag state machine and the checkout wizard
//! without UI or platform-specific dependencies: the view layer binds to the
//! plain state these types expose and drives them through their mutation
//! operations.

pub mod cart;
pub mod checkout;
pub mod money;
pub mod order;
pub mod payment;
pub mod shipping;

// Re-export commonly used types
pub use cart::{
    CART_STORAGE_KEY, Cart, CartAction, CartError, CartItem, CartItemDraft, CartStore,
};
pub use checkout::{CheckoutFlow, CheckoutStep, CheckoutView, PromoState, SubmitError};
pub use money::format_ghs;
pub use order::{OrderNumber, OrderSummary};
pub use payment::{
    BANK_TRANSFER_DETAILS, BankTransferDetails, ConfirmationId, DemoProcessor, PaymentDeclined,
    PaymentInfo, PaymentMethod, PaymentProcessor, PaymentSummary, format_card_number, format_cvv,
    format_expiry,
};
pub use shipping::{ShippingInfo, ShippingMethod};

/// Trait for abstracting the persisted cart snapshot store.
/// Platform-specific implementations should provide this; the web build keeps
/// the snapshot in browser local storage.
pub trait CartStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw JSON snapshot stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Persist the raw JSON snapshot under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, json: &str) -> Result<(), Self::Error>;
}

/// Storefront engine binding a hydrated cart store to a payment gateway.
///
/// One instance per session; explicit injection keeps tests on isolated
/// in-memory doubles instead of ambient singletons.
pub struct Storefront<S, P>
where
    S: CartStorage,
    P: PaymentProcessor,
{
    cart: CartStore<S>,
    processor: P,
}

impl<S, P> Storefront<S, P>
where
    S: CartStorage,
    P: PaymentProcessor,
{
    /// Hydrate the cart from storage and wire the gateway.
    pub fn new(storage: S, processor: P) -> Self {
        Self {
            cart: CartStore::hydrate(storage),
            processor,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore<S> {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    /// Start a checkout session over the current cart.
    #[must_use]
    pub fn begin_checkout(&self) -> CheckoutFlow {
        CheckoutFlow::new()
    }

    /// Place the order for a session that has reached Review.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmitError`] when the session is not submittable or the
    /// gateway declines; the cart survives every failure path.
    pub fn place_order(&mut self, flow: &mut CheckoutFlow) -> Result<OrderSummary, SubmitError> {
        flow.submit(&mut self.cart, &self.processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        entries: Rc<RefCell<HashMap<String, String>>>,
    }

    impl CartStorage for MemoryStorage {
        type Error = Infallible;

        fn load(&self, key: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.entries.borrow().get(key).cloned())
        }

        fn save(&self, key: &str, json: &str) -> Result<(), Self::Error> {
            self.entries
                .borrow_mut()
                .insert(key.to_string(), json.to_string());
            Ok(())
        }
    }

    #[test]
    fn storefront_places_an_order_end_to_end() {
        let mut shop = Storefront::new(MemoryStorage::default(), DemoProcessor);
        shop.cart_mut()
            .add_item(CartItemDraft::new("adinkra-hoodie", "Adinkra Hoodie", 300, "L"))
            .unwrap();

        let mut flow = shop.begin_checkout();
        flow.set_shipping(ShippingInfo {
            first_name: "Ama".to_string(),
            last_name: "Owusu".to_string(),
            email: "ama@example.com".to_string(),
            address: "12 Oxford St".to_string(),
            city: "Kumasi".to_string(),
            ..ShippingInfo::default()
        });
        flow.set_payment(PaymentInfo {
            method: PaymentMethod::BankTransfer,
            ..PaymentInfo::default()
        });

        let cart = shop.cart().snapshot();
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));

        let summary = shop.place_order(&mut flow).expect("order placed");
        assert_eq!(summary.order_total, 300);
        assert!(shop.cart().is_empty());
        assert_eq!(flow.placed_order(), Some(&summary));
    }

    #[test]
    fn storefront_rehydrates_cart_across_sessions() {
        let storage = MemoryStorage::default();
        {
            let mut shop = Storefront::new(storage.clone(), DemoProcessor);
            shop.cart_mut()
                .add_item(CartItemDraft::new("wax-print-tee", "Wax Print Tee", 100, "M").with_qty(2))
                .unwrap();
        }

        let shop = Storefront::new(storage, DemoProcessor);
        assert_eq!(shop.cart().total_qty(), 2);
        assert_eq!(shop.cart().total_price(), 200);
    }
}
