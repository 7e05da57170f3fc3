use crate::error::{AppError, AppResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Converts a non-negative decimal amount to cents, rounding half away from zero.
pub fn decimal_to_cents(amount: Decimal) -> AppResult<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::ValidationError(
            "Price must not be negative".to_string(),
        ));
    }

    (amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| AppError::ValidationError("Price is out of range".to_string()))
}

pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Parses a form price field ("2.50") into cents.
pub fn parse_price(raw: &str) -> AppResult<i64> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| AppError::ValidationError(format!("Invalid price: {raw:?}")))?;
    decimal_to_cents(amount)
}

/// Parses a form stock field into a non-negative count.
pub fn parse_stock(raw: &str) -> AppResult<i32> {
    let stock: i32 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::ValidationError(format!("Invalid stock: {raw:?}")))?;
    if stock < 0 {
        return Err(AppError::ValidationError(
            "Stock must not be negative".to_string(),
        ));
    }
    Ok(stock)
}
