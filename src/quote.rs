//! Transfer cost estimation.
//!
//! Given a send amount, a stored conversion rate, and a fee schedule, compute
//! the fee, the converted amount, and the final received amount. This is pure
//! arithmetic over [`Decimal`] values; the caller looks up the rate.
//!
//! The fee is a flat percentage of the send amount subject to a minimum,
//! charged in the source currency on top of the send amount. The full send
//! amount is converted, so `received = send_amount * rate`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monetary amounts are rounded to 2 decimal places, away from zero on ties.
const MONEY_DP: u32 = 2;

/// Upper bound (exclusive) for send amounts: 10 integer digits, matching the
/// storage precision. Larger values cannot be persisted.
const MAX_SEND_AMOUNT: i64 = 10_000_000_000;

/// Upper bound (exclusive) for the received amount: 12 integer digits.
const MAX_RECEIVED_AMOUNT: i64 = 1_000_000_000_000;

#[derive(Error, Debug, PartialEq)]
pub enum QuoteError {
    #[error("send amount must be non-negative")]
    NegativeAmount,

    #[error("exchange rate must be positive")]
    NonPositiveRate,

    #[error("amount exceeds the supported range")]
    AmountTooLarge,
}

/// Fee schedule for transfers: a percentage with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee as a fraction of the send amount (0.025 = 2.5%)
    pub percent: Decimal,
    /// Minimum fee in the source currency
    pub minimum: Decimal,
}

impl From<&crate::config::FeeConfig> for FeeSchedule {
    fn from(config: &crate::config::FeeConfig) -> Self {
        Self {
            percent: config.transfer_fee_percent,
            minimum: config.minimum_transfer_fee,
        }
    }
}

/// A computed transfer estimate. All amounts rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferQuote {
    /// Amount the sender asked to send, in the source currency
    pub send_amount: Decimal,
    /// Fee charged on top, in the source currency
    pub fee_amount: Decimal,
    /// Total the sender pays: send_amount + fee_amount
    pub total_charge: Decimal,
    /// The conversion rate applied
    pub rate: Decimal,
    /// Amount the recipient receives: send_amount * rate
    pub received_amount: Decimal,
}

/// Compute a transfer quote.
///
/// A zero send amount is a valid quote: the fee is the schedule minimum and
/// nothing is received.
pub fn quote_transfer(send_amount: Decimal, rate: Decimal, schedule: &FeeSchedule) -> Result<TransferQuote, QuoteError> {
    if send_amount < Decimal::ZERO {
        return Err(QuoteError::NegativeAmount);
    }
    if rate <= Decimal::ZERO {
        return Err(QuoteError::NonPositiveRate);
    }
    if send_amount >= Decimal::from(MAX_SEND_AMOUNT) {
        return Err(QuoteError::AmountTooLarge);
    }

    let percent_fee = send_amount.checked_mul(schedule.percent).ok_or(QuoteError::AmountTooLarge)?;
    let fee_amount = percent_fee.max(schedule.minimum).round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero);

    let received_amount = send_amount
        .checked_mul(rate)
        .ok_or(QuoteError::AmountTooLarge)?
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero);
    if received_amount >= Decimal::from(MAX_RECEIVED_AMOUNT) {
        return Err(QuoteError::AmountTooLarge);
    }

    let total_charge = send_amount.checked_add(fee_amount).ok_or(QuoteError::AmountTooLarge)?;

    Ok(TransferQuote {
        send_amount,
        fee_amount,
        total_charge,
        rate,
        received_amount,
    })
}
