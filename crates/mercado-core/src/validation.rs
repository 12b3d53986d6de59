//! # Validation Module
//!
//! Input validation used at the service boundary, before business logic
//! runs. The store layer adds its own constraints (NOT NULL, foreign keys);
//! these checks catch bad input early with a typed, user-presentable error.

use crate::error::ValidationError;
use crate::types::BundleOffer;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier / String Validators
// =============================================================================

/// Validates an entity identifier.
///
/// Identifiers are opaque strings (catalog SKUs like "P007", UUID strings
/// for orders); the only rules are non-empty and bounded length.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a display name (product, category).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-text reason (adjustments, returns).
///
/// Reasons may be empty (they are optional at the ledger level), but a
/// present reason is bounded.
pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    if reason.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart/order quantity.
///
/// ## Rules
/// - Must be positive (> 0) — zero-quantity lines are represented by
///   removal, never stored
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a signed ledger movement quantity.
///
/// The ledger performs no business validation beyond a non-zero quantity;
/// the caller chooses sign and type.
pub fn validate_movement_quantity(qty: i64) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// Zero is allowed (free items); negative prices are not.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates an expense amount in cents (must be positive).
pub fn validate_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Bundle Validators
// =============================================================================

/// Validates a product's bundle tiers: every tier quantity must be a
/// positive integer and every tier price non-negative.
pub fn validate_bundle_offers(offers: &[BundleOffer]) -> ValidationResult<()> {
    for offer in offers {
        if offer.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "bundle quantity".to_string(),
            });
        }
        if offer.price_cents < 0 {
            return Err(ValidationError::OutOfRange {
                field: "bundle price".to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("product_id", "P007").is_ok());
        assert!(validate_id("product_id", "").is_err());
        assert!(validate_id("product_id", "   ").is_err());
        assert!(validate_id("product_id", &"x".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Coca-Cola 2L").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_movement_quantity_allows_negative() {
        assert!(validate_movement_quantity(-5).is_ok());
        assert!(validate_movement_quantity(5).is_ok());
        assert!(validate_movement_quantity(0).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_bundle_offers() {
        let good = vec![
            BundleOffer { quantity: 3, price_cents: 2000 },
            BundleOffer { quantity: 6, price_cents: 3500 },
        ];
        assert!(validate_bundle_offers(&good).is_ok());

        let zero_qty = vec![BundleOffer { quantity: 0, price_cents: 2000 }];
        assert!(validate_bundle_offers(&zero_qty).is_err());

        let negative_price = vec![BundleOffer { quantity: 3, price_cents: -1 }];
        assert!(validate_bundle_offers(&negative_price).is_err());
    }
}
