use crate::quote::PricingError;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `percentage` percent of `base`, unrounded.
pub fn percent_of(base: Decimal, percentage: Decimal) -> Decimal {
    base * percentage / Decimal::ONE_HUNDRED
}

/// Share of `amount` covering `billable_days` out of `days_in_month`, rounded to cents.
pub fn prorate(
    amount: Decimal,
    days_in_month: u32,
    billable_days: u32,
    step: &'static str,
) -> Result<Decimal, PricingError> {
    amount
        .checked_div(Decimal::from(days_in_month))
        .and_then(|per_day| per_day.checked_mul(Decimal::from(billable_days)))
        .map(round2)
        .ok_or(PricingError::NotANumber { step })
}

/// Two-decimal rendering used as a grouping key, e.g. `3000.70`.
pub fn fixed2(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

/// Currency rendering, e.g. `$1,234.50` or `-$80.00`.
pub fn format_money(value: Decimal) -> String {
    let rounded = round2(value);
    let fixed = fixed2(rounded.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}
