//! Decimal quantity <-> minor unit conversion at a fixed 18-decimal scale.
//!
//! Parsing is exact: digits beyond the 18th fractional place are truncated,
//! everything else is carried over without floating point.

use crate::errors::CoreError;
use crate::types::{I256, U256};
use ethers::utils::format_units;

/// Number of fractional digits of the display unit.
pub const DECIMALS: usize = 18;

/// Parses a decimal quantity such as `"10"`, `"0.5"` or `"1.000000000000000000123"`
/// into minor units.
pub fn parse_amount(input: &str) -> Result<U256, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidAmount {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty amount"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("amount must not be negative"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("no digits"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("only digits and a single '.' are allowed"));
    }

    let scale = U256::exp10(DECIMALS);
    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|e| invalid(&e.to_string()))?
    };

    // Truncate below the smallest unit, then right-pad to the full scale.
    let kept: String = fraction.chars().take(DECIMALS).collect();
    let padded = format!("{:0<width$}", kept, width = DECIMALS);
    let fraction = U256::from_dec_str(&padded).map_err(|e| invalid(&e.to_string()))?;

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| invalid("amount overflows 256 bits"))
}

/// Renders minor units as a display quantity, e.g. `10.000000000000000000`.
pub fn format_amount(minor_units: U256) -> String {
    format_units(minor_units, DECIMALS as u32).unwrap_or_else(|_| minor_units.to_string())
}

/// Renders a signed delta with an explicit sign.
pub fn format_delta(delta: I256) -> String {
    let magnitude = format_amount(delta.unsigned_abs());
    if delta.is_negative() {
        format!("-{}", magnitude)
    } else {
        format!("+{}", magnitude)
    }
}

/// Converts minor units into the native balance type.
pub fn to_native_balance(minor_units: U256) -> Result<u128, CoreError> {
    if minor_units > U256::from(u128::MAX) {
        return Err(CoreError::InvalidAmount {
            input: minor_units.to_string(),
            reason: "amount exceeds the native balance range".to_string(),
        });
    }
    Ok(minor_units.as_u128())
}

/// Signed difference `after - before`, saturating at the bounds of `I256`.
pub fn signed_delta(before: U256, after: U256) -> I256 {
    if after >= before {
        I256::try_from(after - before).unwrap_or(I256::MAX)
    } else {
        I256::try_from(before - after)
            .map(|magnitude| -magnitude)
            .unwrap_or(I256::MIN)
    }
}
