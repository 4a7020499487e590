//! Checkout wizard: step machine, gating guards, order totals, and the
//! two-phase submission protocol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CartStorage;
use crate::cart::{Cart, CartStore};
use crate::money;
use crate::order::{OrderNumber, OrderSummary};
use crate::payment::{
    ConfirmationId, PaymentDeclined, PaymentInfo, PaymentMethod, PaymentProcessor, PaymentSummary,
};
use crate::shipping::ShippingInfo;

/// Wizard steps in strict order. Ordering derives from declaration order, so
/// `Bag < Shipping < Payment < Review` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Bag,
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    /// Zero-based position used by the step indicator.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Bag => 0,
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Bag => Some(Self::Shipping),
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::Bag => None,
            Self::Shipping => Some(Self::Bag),
            Self::Payment => Some(Self::Shipping),
            Self::Review => Some(Self::Payment),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bag => "Bag",
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }
}

/// What the view layer should render right now.
///
/// `EmptyBag` is derived, never stored: an empty cart before Review parks the
/// wizard on the empty-bag screen without losing the underlying step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutView {
    EmptyBag,
    Step(CheckoutStep),
    Placing,
    Confirmed,
}

/// Promo code entry. A valid-looking code grants a flat 10% discount on the
/// pre-shipping subtotal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoState {
    pub code: String,
    pub applied: bool,
}

/// Submission protocol errors.
///
/// Step-navigation guard failures are booleans, not errors; these cover
/// misuse of the submit protocol plus the gateway-decline passthrough.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submit is only available from the review step")]
    NotAtReview,
    #[error("selected payment method is incomplete")]
    PaymentIncomplete,
    #[error("an order placement is already in flight")]
    AlreadyPlacing,
    #[error("no order placement is in flight")]
    NotPlacing,
    #[error("this checkout session already placed an order")]
    AlreadyPlaced,
    #[error(transparent)]
    Declined(#[from] PaymentDeclined),
}

/// Client-side checkout wizard over a hydrated [`CartStore`].
///
/// Form state is additive: retreating a step never discards data already
/// entered for later steps. One session places at most one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    shipping: ShippingInfo,
    payment: PaymentInfo,
    promo: PromoState,
    order_number: OrderNumber,
    placing: bool,
    decline_reason: Option<String>,
    placed: Option<OrderSummary>,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    /// Fresh session starting at the bag review step.
    #[must_use]
    pub fn new() -> Self {
        Self::with_order_number(OrderNumber::generate())
    }

    /// Session with a caller-supplied order number (tests, replays).
    #[must_use]
    pub fn with_order_number(order_number: OrderNumber) -> Self {
        Self {
            step: CheckoutStep::Bag,
            shipping: ShippingInfo::default(),
            payment: PaymentInfo::default(),
            promo: PromoState::default(),
            order_number,
            placing: false,
            decline_reason: None,
            placed: None,
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn shipping(&self) -> &ShippingInfo {
        &self.shipping
    }

    #[must_use]
    pub const fn payment(&self) -> &PaymentInfo {
        &self.payment
    }

    #[must_use]
    pub const fn promo(&self) -> &PromoState {
        &self.promo
    }

    /// Stable for the life of the session; never regenerated by re-reads.
    #[must_use]
    pub const fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    #[must_use]
    pub const fn is_placing(&self) -> bool {
        self.placing
    }

    /// Reason the last submission was declined, cleared on the next step move.
    #[must_use]
    pub fn decline_reason(&self) -> Option<&str> {
        self.decline_reason.as_deref()
    }

    /// Frozen confirmation summary once an order has been placed.
    #[must_use]
    pub const fn placed_order(&self) -> Option<&OrderSummary> {
        self.placed.as_ref()
    }

    /// Projection the view layer renders.
    #[must_use]
    pub fn view(&self, cart: &Cart) -> CheckoutView {
        if self.placed.is_some() {
            return CheckoutView::Confirmed;
        }
        if self.placing {
            return CheckoutView::Placing;
        }
        if cart.is_empty() && self.step < CheckoutStep::Review {
            return CheckoutView::EmptyBag;
        }
        CheckoutView::Step(self.step)
    }

    /// Replace the shipping form state. Rejected once submission has begun.
    pub fn set_shipping(&mut self, shipping: ShippingInfo) -> bool {
        if self.locked() {
            return false;
        }
        self.shipping = shipping;
        true
    }

    /// Replace the payment form state. Rejected once submission has begun.
    pub fn set_payment(&mut self, payment: PaymentInfo) -> bool {
        if self.locked() {
            return false;
        }
        self.payment = payment;
        true
    }

    /// Apply a promo code: accepted when the trimmed code is longer than two
    /// characters. Idempotent once applied; a rejected code changes nothing.
    pub fn apply_promo(&mut self, code: &str) -> bool {
        if self.promo.applied {
            return true;
        }
        if self.locked() {
            return false;
        }
        let trimmed = code.trim();
        if trimmed.len() <= 2 {
            return false;
        }
        self.promo = PromoState {
            code: trimmed.to_string(),
            applied: true,
        };
        true
    }

    /// Whether the current step's gate holds.
    #[must_use]
    pub fn can_advance(&self, cart: &Cart) -> bool {
        if self.locked() {
            return false;
        }
        match self.step {
            CheckoutStep::Bag => !cart.is_empty(),
            CheckoutStep::Shipping => self.shipping.required_fields_present(),
            // Only the card tender hard-blocks here; momo and bank reach
            // Review freely and are enforced by `begin_submit`.
            CheckoutStep::Payment => {
                self.payment.method != PaymentMethod::Card || self.payment.card_valid()
            }
            CheckoutStep::Review => false,
        }
    }

    /// Advisory predicate for the submit button; mandatory at `begin_submit`.
    #[must_use]
    pub fn payment_ready(&self) -> bool {
        self.payment.ready()
    }

    /// Advance one step when the gate holds. Returns whether the step moved.
    pub fn advance(&mut self, cart: &Cart) -> bool {
        if !self.can_advance(cart) {
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                self.decline_reason = None;
                true
            }
            None => false,
        }
    }

    /// Step back toward the bag. Entered form data is preserved.
    pub fn retreat(&mut self) -> bool {
        if self.locked() {
            return false;
        }
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                self.decline_reason = None;
                true
            }
            None => false,
        }
    }

    /// Jump directly to an earlier step (the review screen's edit links).
    pub fn edit(&mut self, step: CheckoutStep) -> bool {
        if self.locked() || step >= self.step {
            return false;
        }
        self.step = step;
        self.decline_reason = None;
        true
    }

    /// Promo discount against the current subtotal; zero until applied.
    #[must_use]
    pub fn discount(&self, cart: &Cart) -> i64 {
        if self.promo.applied {
            money::ten_percent_floor(cart.total_price)
        } else {
            0
        }
    }

    /// Flat surcharge for the chosen delivery method.
    #[must_use]
    pub fn shipping_cost(&self) -> i64 {
        self.shipping.method.surcharge()
    }

    /// `subtotal - discount + shipping`, recomputed from current state on
    /// every read.
    #[must_use]
    pub fn order_total(&self, cart: &Cart) -> i64 {
        cart.total_price - self.discount(cart) + self.shipping_cost()
    }

    /// Enter the placing sub-state.
    ///
    /// The wizard rejects edits and re-entry until [`Self::finish_submit`]
    /// resolves the gateway outcome; this is the disabled submit control.
    ///
    /// # Errors
    ///
    /// Rejects sessions not at Review, incomplete tenders, an in-flight
    /// placement, and already-placed sessions. State is unchanged on error.
    pub fn begin_submit(&mut self) -> Result<(), SubmitError> {
        if self.placed.is_some() {
            return Err(SubmitError::AlreadyPlaced);
        }
        if self.placing {
            return Err(SubmitError::AlreadyPlacing);
        }
        if self.step != CheckoutStep::Review {
            return Err(SubmitError::NotAtReview);
        }
        if !self.payment.ready() {
            return Err(SubmitError::PaymentIncomplete);
        }
        self.placing = true;
        self.decline_reason = None;
        Ok(())
    }

    /// Resolve the in-flight placement with the gateway outcome.
    ///
    /// Success freezes the confirmation summary from the pre-clear cart,
    /// wipes the cart store, and moves the session to its placed terminal
    /// state. A decline returns the wizard to the Payment step with the
    /// reason recorded and the cart plus every entered field intact.
    ///
    /// # Errors
    ///
    /// `NotPlacing` without a matching [`Self::begin_submit`] (this also
    /// makes a late gateway callback after a session reset harmless) and
    /// `Declined` as the failure passthrough.
    pub fn finish_submit<S: CartStorage>(
        &mut self,
        cart: &mut CartStore<S>,
        outcome: Result<ConfirmationId, PaymentDeclined>,
    ) -> Result<OrderSummary, SubmitError> {
        if !self.placing {
            return Err(if self.placed.is_some() {
                SubmitError::AlreadyPlaced
            } else {
                SubmitError::NotPlacing
            });
        }
        self.placing = false;
        match outcome {
            Ok(confirmation) => {
                let snapshot = cart.snapshot();
                let summary = OrderSummary {
                    order_number: self.order_number.clone(),
                    shipping: self.shipping.clone(),
                    payment: self.payment_summary(),
                    items: snapshot.items.clone(),
                    subtotal: snapshot.total_price,
                    discount: self.discount(&snapshot),
                    shipping_cost: self.shipping_cost(),
                    order_total: self.order_total(&snapshot),
                    confirmation,
                };
                if let Err(e) = cart.clear() {
                    // The order stands either way; an unsaved clear only
                    // risks resurrecting items on the next hydration.
                    log::warn!(
                        "failed to persist cart clear after order {}: {e}",
                        self.order_number
                    );
                }
                self.placed = Some(summary.clone());
                Ok(summary)
            }
            Err(declined) => {
                self.decline_reason = Some(declined.reason.clone());
                self.step = CheckoutStep::Payment;
                Err(SubmitError::Declined(declined))
            }
        }
    }

    /// One-shot submission for synchronous embedders: `begin_submit`, charge
    /// the processor for the current order total, `finish_submit`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::begin_submit`] and [`Self::finish_submit`] return.
    pub fn submit<S: CartStorage, P: PaymentProcessor>(
        &mut self,
        cart: &mut CartStore<S>,
        processor: &P,
    ) -> Result<OrderSummary, SubmitError> {
        self.begin_submit()?;
        let total = self.order_total(&cart.snapshot());
        let outcome = processor.charge(&self.payment, total);
        self.finish_submit(cart, outcome)
    }

    fn payment_summary(&self) -> PaymentSummary {
        match self.payment.method {
            PaymentMethod::Card => PaymentSummary::Card {
                last4: self.payment.card_last4(),
            },
            PaymentMethod::MobileMoney => PaymentSummary::MobileMoney {
                number: self.payment.momo_number.clone(),
            },
            PaymentMethod::BankTransfer => PaymentSummary::BankTransfer {
                reference: self.order_number.to_string(),
            },
        }
    }

    const fn locked(&self) -> bool {
        self.placing || self.placed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;

    fn cart_with(price: i64, qty: u32) -> Cart {
        Cart::from_items(vec![CartItem {
            slug: "kente-blazer".to_string(),
            name: "Kente Blazer".to_string(),
            price,
            size: "M".to_string(),
            qty,
            color: None,
            variant: None,
        }])
    }

    fn filled_shipping() -> ShippingInfo {
        ShippingInfo {
            first_name: "Kofi".to_string(),
            last_name: "Mensah".to_string(),
            email: "kofi@example.com".to_string(),
            address: "25 Ring Road Central".to_string(),
            city: "Accra".to_string(),
            ..ShippingInfo::default()
        }
    }

    #[test]
    fn step_order_is_strict() {
        assert!(CheckoutStep::Bag < CheckoutStep::Shipping);
        assert!(CheckoutStep::Payment < CheckoutStep::Review);
        assert_eq!(CheckoutStep::Bag.next(), Some(CheckoutStep::Shipping));
        assert_eq!(CheckoutStep::Review.next(), None);
        assert_eq!(CheckoutStep::Bag.prev(), None);
        assert_eq!(CheckoutStep::Review.index(), 3);
    }

    #[test]
    fn empty_bag_is_derived_not_stored() {
        let flow = CheckoutFlow::new();
        let empty = Cart::default();
        assert_eq!(flow.view(&empty), CheckoutView::EmptyBag);
        assert_eq!(flow.step(), CheckoutStep::Bag);

        let filled = cart_with(100, 1);
        assert_eq!(flow.view(&filled), CheckoutView::Step(CheckoutStep::Bag));
    }

    #[test]
    fn bag_gate_requires_items() {
        let mut flow = CheckoutFlow::new();
        let empty = Cart::default();
        assert!(!flow.advance(&empty));
        assert_eq!(flow.step(), CheckoutStep::Bag);

        let filled = cart_with(100, 1);
        assert!(flow.advance(&filled));
        assert_eq!(flow.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn shipping_gate_requires_all_required_fields() {
        let mut flow = CheckoutFlow::new();
        let cart = cart_with(100, 1);
        assert!(flow.advance(&cart));

        let partial = ShippingInfo {
            first_name: "Kofi".to_string(),
            ..ShippingInfo::default()
        };
        flow.set_shipping(partial);
        assert!(!flow.advance(&cart));
        assert_eq!(flow.step(), CheckoutStep::Shipping);

        flow.set_shipping(filled_shipping());
        assert!(flow.advance(&cart));
        assert_eq!(flow.step(), CheckoutStep::Payment);
    }

    #[test]
    fn payment_gate_blocks_only_invalid_card() {
        let cart = cart_with(100, 1);
        let mut flow = CheckoutFlow::new();
        flow.set_shipping(filled_shipping());
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));

        // Card tender with empty fields cannot advance.
        assert!(!flow.advance(&cart));

        // Momo advances freely; readiness stays advisory until submit.
        let momo = PaymentInfo {
            method: PaymentMethod::MobileMoney,
            ..PaymentInfo::default()
        };
        flow.set_payment(momo);
        assert!(!flow.payment_ready());
        assert!(flow.advance(&cart));
        assert_eq!(flow.step(), CheckoutStep::Review);
    }

    #[test]
    fn retreat_preserves_entered_data() {
        let cart = cart_with(100, 1);
        let mut flow = CheckoutFlow::new();
        flow.set_shipping(filled_shipping());
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));
        assert!(flow.retreat());
        assert_eq!(flow.step(), CheckoutStep::Shipping);
        assert_eq!(flow.shipping().first_name, "Kofi");
        assert!(flow.retreat());
        assert_eq!(flow.step(), CheckoutStep::Bag);
        assert!(!flow.retreat());
    }

    #[test]
    fn edit_jumps_only_backward() {
        let cart = cart_with(100, 1);
        let mut flow = CheckoutFlow::new();
        flow.set_shipping(filled_shipping());
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));
        assert!(flow.edit(CheckoutStep::Bag));
        assert_eq!(flow.step(), CheckoutStep::Bag);
        assert!(!flow.edit(CheckoutStep::Review));
    }

    #[test]
    fn promo_is_idempotent_and_rejects_short_codes() {
        let cart = cart_with(500, 2);
        let mut flow = CheckoutFlow::new();

        assert!(!flow.apply_promo("ab"));
        assert!(!flow.promo().applied);
        assert_eq!(flow.discount(&cart), 0);

        assert!(flow.apply_promo("AURA10"));
        assert_eq!(flow.discount(&cart), 100);

        // Re-applying (even a different code) changes nothing.
        assert!(flow.apply_promo("OTHER20"));
        assert_eq!(flow.promo().code, "AURA10");
        assert_eq!(flow.discount(&cart), 100);
    }

    #[test]
    fn order_total_formula() {
        let cart = cart_with(500, 2); // subtotal 1000
        let mut flow = CheckoutFlow::new();
        assert_eq!(flow.order_total(&cart), 1000);

        let mut shipping = filled_shipping();
        shipping.method = crate::shipping::ShippingMethod::Express;
        flow.set_shipping(shipping);
        assert!(flow.apply_promo("AURA10"));
        assert_eq!(flow.discount(&cart), 100);
        assert_eq!(flow.shipping_cost(), 50);
        assert_eq!(flow.order_total(&cart), 950);

        let mut overnight = filled_shipping();
        overnight.method = crate::shipping::ShippingMethod::Overnight;
        flow.set_shipping(overnight);
        assert_eq!(flow.order_total(&cart), 1020);
    }

    #[test]
    fn order_number_is_stable_across_reads() {
        let flow = CheckoutFlow::with_order_number(OrderNumber::from_millis(1000));
        let first = flow.order_number().clone();
        assert_eq!(flow.order_number(), &first);
        assert_eq!(first.as_str(), "AA-RS");
    }

    #[test]
    fn begin_submit_enforces_protocol() {
        let mut flow = CheckoutFlow::new();
        assert!(matches!(flow.begin_submit(), Err(SubmitError::NotAtReview)));

        let cart = cart_with(100, 1);
        flow.set_shipping(filled_shipping());
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));
        flow.set_payment(PaymentInfo {
            method: PaymentMethod::MobileMoney,
            ..PaymentInfo::default()
        });
        assert!(flow.advance(&cart));

        // Momo entry too short: mandatory at submit even though advancing
        // past Payment was allowed.
        assert!(matches!(
            flow.begin_submit(),
            Err(SubmitError::PaymentIncomplete)
        ));

        flow.set_payment(PaymentInfo {
            method: PaymentMethod::MobileMoney,
            momo_number: "+233240000000".to_string(),
            ..PaymentInfo::default()
        });
        assert!(flow.begin_submit().is_ok());
        assert!(flow.is_placing());
        assert!(matches!(
            flow.begin_submit(),
            Err(SubmitError::AlreadyPlacing)
        ));
    }

    #[test]
    fn placing_locks_out_edits() {
        let cart = cart_with(100, 1);
        let mut flow = CheckoutFlow::new();
        flow.set_shipping(filled_shipping());
        assert!(flow.advance(&cart));
        assert!(flow.advance(&cart));
        flow.set_payment(PaymentInfo {
            method: PaymentMethod::BankTransfer,
            ..PaymentInfo::default()
        });
        assert!(flow.advance(&cart));
        assert!(flow.begin_submit().is_ok());

        assert!(!flow.set_shipping(ShippingInfo::default()));
        assert!(!flow.set_payment(PaymentInfo::default()));
        assert!(!flow.retreat());
        assert!(!flow.advance(&cart));
        assert_eq!(flow.view(&cart), CheckoutView::Placing);
    }
}
