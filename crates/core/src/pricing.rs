//! Discount derivation for products.
//!
//! `discount` and `discounted_price` act as one logical unit: the discount
//! percentage is always derived from the current price and the discounted
//! price, never written independently. [`ProductPricing`] keeps the fields
//! private so the only write path is [`ProductPricing::set_discounted_price`].
//!
//! Two staleness rules are deliberate (they match observed production
//! behavior and are recorded in DESIGN.md):
//!
//! - Updating the price alone does NOT recompute an existing discount pair.
//! - An offer past its expiration date still presents its stale discount.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors constructing or mutating a [`ProductPricing`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Prices are non-negative decimals.
    #[error("price must not be negative")]
    NegativePrice,
    /// A discounted price cannot be negative either.
    #[error("discounted price must not be negative")]
    NegativeDiscountedPrice,
}

/// The coupled price / discount / discounted-price unit of a product.
///
/// States:
/// - *no-discount*: `discount = None`, `discounted_price = None`
/// - *discounted*: `discounted_price = Some(x)`, `discount` derived as
///   `(price - x) / price * 100` (0 when price is 0)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPricing {
    price: Decimal,
    discount: Option<Decimal>,
    discounted_price: Option<Decimal>,
}

impl ProductPricing {
    /// Create a pricing unit in the no-discount state.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativePrice`] if `price` is negative.
    pub fn new(price: Decimal) -> Result<Self, PricingError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(PricingError::NegativePrice);
        }
        Ok(Self {
            price: price.round_dp(2),
            discount: None,
            discounted_price: None,
        })
    }

    /// Reassemble a pricing unit from stored columns.
    ///
    /// Stored rows are trusted: the pair is not re-derived here, so a stale
    /// discount loaded from the database survives a load/store round trip
    /// unchanged.
    #[must_use]
    pub const fn from_stored(
        price: Decimal,
        discount: Option<Decimal>,
        discounted_price: Option<Decimal>,
    ) -> Self {
        Self {
            price,
            discount,
            discounted_price,
        }
    }

    /// The base price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// The derived discount percentage, if any.
    #[must_use]
    pub const fn discount(&self) -> Option<Decimal> {
        self.discount
    }

    /// The discounted price, if any.
    #[must_use]
    pub const fn discounted_price(&self) -> Option<Decimal> {
        self.discounted_price
    }

    /// Update the base price.
    ///
    /// An existing discount pair is NOT recomputed; the caller re-applies
    /// `set_discounted_price` if it wants a consistent pair.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativePrice`] if `price` is negative.
    pub fn set_price(&mut self, price: Decimal) -> Result<(), PricingError> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(PricingError::NegativePrice);
        }
        self.price = price.round_dp(2);
        Ok(())
    }

    /// Transition between the no-discount and discounted states.
    ///
    /// `Some(x)` derives `discount = (price - x) / price * 100`, or 0 when the
    /// price is 0 (no division by zero). `None` clears both fields. Both
    /// fields always change together; there is no intermediate state.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeDiscountedPrice`] if `x` is negative.
    pub fn set_discounted_price(
        &mut self,
        discounted_price: Option<Decimal>,
    ) -> Result<(), PricingError> {
        match discounted_price {
            None => {
                self.discounted_price = None;
                self.discount = None;
            }
            Some(x) => {
                if x.is_sign_negative() && !x.is_zero() {
                    return Err(PricingError::NegativeDiscountedPrice);
                }
                let x = x.round_dp(2);
                let discount = if self.price.is_zero() {
                    Decimal::ZERO
                } else {
                    ((self.price - x) / self.price * Decimal::ONE_HUNDRED).round_dp(2)
                };
                self.discounted_price = Some(x);
                self.discount = Some(discount);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(v: f64) -> Decimal {
        Decimal::from_f64(v).unwrap()
    }

    #[test]
    fn test_new_rejects_negative_price() {
        assert_eq!(
            ProductPricing::new(dec(-1.0)),
            Err(PricingError::NegativePrice)
        );
    }

    #[test]
    fn test_discount_derivation() {
        let mut pricing = ProductPricing::new(dec(100.0)).unwrap();
        pricing.set_discounted_price(Some(dec(80.0))).unwrap();
        assert_eq!(pricing.discount(), Some(dec(20.0)));
        assert_eq!(pricing.discounted_price(), Some(dec(80.0)));
    }

    #[test]
    fn test_zero_price_no_division_fault() {
        let mut pricing = ProductPricing::new(Decimal::ZERO).unwrap();
        pricing.set_discounted_price(Some(Decimal::ZERO)).unwrap();
        assert_eq!(pricing.discount(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_clearing_discounted_price_clears_discount() {
        let mut pricing = ProductPricing::new(dec(100.0)).unwrap();
        pricing.set_discounted_price(Some(dec(75.0))).unwrap();
        pricing.set_discounted_price(None).unwrap();
        assert_eq!(pricing.discount(), None);
        assert_eq!(pricing.discounted_price(), None);
    }

    #[test]
    fn test_negative_discounted_price_rejected() {
        let mut pricing = ProductPricing::new(dec(100.0)).unwrap();
        assert_eq!(
            pricing.set_discounted_price(Some(dec(-5.0))),
            Err(PricingError::NegativeDiscountedPrice)
        );
        // Failed transition leaves the unit untouched
        assert_eq!(pricing.discount(), None);
        assert_eq!(pricing.discounted_price(), None);
    }

    #[test]
    fn test_price_update_does_not_cascade() {
        let mut pricing = ProductPricing::new(dec(100.0)).unwrap();
        pricing.set_discounted_price(Some(dec(80.0))).unwrap();
        pricing.set_price(dec(200.0)).unwrap();
        // Known staleness: pair is untouched by a price-only update
        assert_eq!(pricing.discount(), Some(dec(20.0)));
        assert_eq!(pricing.discounted_price(), Some(dec(80.0)));
    }

    #[test]
    fn test_discount_rounds_to_two_places() {
        let mut pricing = ProductPricing::new(dec(3.0)).unwrap();
        pricing.set_discounted_price(Some(dec(2.0))).unwrap();
        assert_eq!(pricing.discount(), Some(dec(33.33)));
    }

    #[test]
    fn test_stored_pair_survives_round_trip() {
        // A stale stored pair must not be silently "fixed" on load
        let pricing = ProductPricing::from_stored(dec(200.0), Some(dec(20.0)), Some(dec(80.0)));
        assert_eq!(pricing.price(), dec(200.0));
        assert_eq!(pricing.discount(), Some(dec(20.0)));
    }
}
