//! Cart reconciliation.
//!
//! Order totals are never trusted from the client. Each line is priced
//! server-side from the product record: the client may offer a price at or
//! above the product's minimum, otherwise the minimum applies. The order
//! total is the sum of the recomputed line totals.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::ProductId;

/// Upper bound (exclusive) for a unit price: 10 integer digits, matching the
/// storage precision.
const MAX_UNIT_PRICE: i64 = 10_000_000_000;

/// Upper bound (exclusive) for a line total: 12 integer digits.
const MAX_LINE_TOTAL: i64 = 1_000_000_000_000;

#[derive(Error, Debug, PartialEq)]
pub enum CartError {
    #[error("offered price {offered} for product {product_id} is below the minimum {minimum}")]
    PriceBelowMinimum {
        product_id: ProductId,
        offered: Decimal,
        minimum: Decimal,
    },

    #[error("quantity for product {product_id} must be positive")]
    InvalidQuantity { product_id: ProductId },

    #[error("price for product {product_id} exceeds the supported range")]
    AmountTooLarge { product_id: ProductId },
}

/// A cart line after server-side pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Price a single cart line against the product's minimum price.
///
/// `offered` is the client's pay-what-you-want price, if any. No offer means
/// the product's minimum applies. An offer below the minimum is rejected
/// rather than silently raised.
pub fn price_line(
    product_id: ProductId,
    minimum: Decimal,
    offered: Option<Decimal>,
    quantity: i32,
) -> Result<PricedLine, CartError> {
    if quantity <= 0 {
        return Err(CartError::InvalidQuantity { product_id });
    }

    let unit_price = match offered {
        Some(offered) if offered < minimum => {
            return Err(CartError::PriceBelowMinimum {
                product_id,
                offered,
                minimum,
            })
        }
        Some(offered) => offered,
        None => minimum,
    };

    if unit_price >= Decimal::from(MAX_UNIT_PRICE) {
        return Err(CartError::AmountTooLarge { product_id });
    }

    let line_total = unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or(CartError::AmountTooLarge { product_id })?;
    if line_total >= Decimal::from(MAX_LINE_TOTAL) {
        return Err(CartError::AmountTooLarge { product_id });
    }

    Ok(PricedLine {
        product_id,
        unit_price,
        quantity,
        line_total,
    })
}

/// Sum of line totals across the cart.
pub fn order_total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(|line| line.line_total).sum()
}
