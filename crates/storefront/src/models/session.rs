//! Session-related types.
//!
//! Types stored in the session for authentication state and the cart.

use optica_core::{CustomerId, Email, PhoneNumber, ProductId};
use serde::{Deserialize, Serialize};

use crate::gateway::CustomerProfile;

/// Largest quantity of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Backend customer ID.
    pub id: CustomerId,
    /// Verified phone number.
    pub phone: PhoneNumber,
    pub full_name: String,
    pub email: Option<Email>,
}

impl CurrentCustomer {
    /// Given name (last word, Vietnamese order) for greetings, falling back to
    /// the masked phone.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.full_name
            .split_whitespace()
            .last()
            .map_or_else(|| self.phone.masked(), str::to_string)
    }
}

impl From<CustomerProfile> for CurrentCustomer {
    fn from(profile: CustomerProfile) -> Self {
        Self {
            id: profile.id,
            phone: profile.phone,
            full_name: profile.full_name,
            email: profile.email,
        }
    }
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Session cart. Lines keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// Quantities are clamped to `1..=MAX_LINE_QUANTITY`.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        let quantity = quantity.clamp(1, MAX_LINE_QUANTITY);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = (line.quantity + quantity).min(MAX_LINE_QUANTITY);
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
    }

    /// Drop the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Total number of items.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the phone-OTP gate of this browser.
    pub const AUTH_GATE: &str = "auth_gate";

    /// Key for the cart.
    pub const CART: &str = "cart";

    /// Id of the last trade-in request submitted from this browser.
    pub const LAST_TRADE_IN: &str = "last_trade_in";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_merges_lines() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 1);
        cart.add(ProductId::new(2), 2);
        cart.add(ProductId::new(1), 3);
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.count(), 6);
    }

    #[test]
    fn test_cart_clamps_quantity() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 0);
        assert_eq!(cart.count(), 1);
        cart.add(ProductId::new(1), 50);
        assert_eq!(cart.count(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_cart_remove() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 1);
        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_display_name() {
        let customer = CurrentCustomer {
            id: CustomerId::new(1),
            phone: PhoneNumber::parse("0901234567").unwrap(),
            full_name: "Nguyễn Minh Anh".to_string(),
            email: None,
        };
        assert_eq!(customer.display_name(), "Anh");
    }
}
