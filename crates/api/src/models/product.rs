//! Product domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{BusinessId, Owned, ProductId, ProductPricing, UserId};

/// A listed product (domain type).
///
/// The parent business is set at creation and never changes. Pricing fields
/// live in [`ProductPricing`] so the discount pair can only change through
/// its derivation; the flattened serialization keeps the wire shape flat.
///
/// `owner_id` is the terminal user of the ownership chain
/// (Product -> Business -> User), resolved by the repository at load time.
/// It is internal state for access control, not part of the wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Category, defaults to "General".
    pub category: String,
    /// Price, discount percentage, and discounted price as one unit.
    #[serde(flatten)]
    pub pricing: ProductPricing,
    /// When the current offer expires, if any. Offers past this point still
    /// present their stale discount (recorded design decision).
    pub offer_expiration_date: Option<DateTime<Utc>>,
    /// Ordered stored image paths.
    pub images: Vec<String>,
    /// When the product was published.
    pub date_published: DateTime<Utc>,
    /// Parent business.
    pub business_id: BusinessId,
    /// Terminal owner of the ownership chain.
    #[serde(skip)]
    pub owner_id: UserId,
}

impl Owned for Product {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_serialization_flattens_pricing_and_skips_owner() {
        let product = Product {
            id: ProductId::new(1),
            name: "Lamp".to_string(),
            category: "General".to_string(),
            pricing: ProductPricing::from_stored(
                Decimal::new(10000, 2),
                Some(Decimal::new(2000, 2)),
                Some(Decimal::new(8000, 2)),
            ),
            offer_expiration_date: None,
            images: vec![],
            date_published: Utc::now(),
            business_id: BusinessId::new(2),
            owner_id: UserId::new(3),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("price").is_some());
        assert!(json.get("discount").is_some());
        assert!(json.get("discounted_price").is_some());
        assert!(json.get("pricing").is_none());
        assert!(json.get("owner_id").is_none());
    }
}
