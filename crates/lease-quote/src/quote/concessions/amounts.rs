use rust_decimal::Decimal;

use crate::money::{percent_of, prorate, round2};
use crate::quote::domain::{AdjustmentKind, Concession, LeaseTerm, PaymentPeriod};
use crate::quote::error::PricingError;

/// Full per-period value of a concession against `fee_amount`, before proration or capping.
pub fn concession_amount(fee_amount: Decimal, concession: &Concession) -> Decimal {
    match concession.kind() {
        AdjustmentKind::Variable => concession.variable_amount().abs(),
        AdjustmentKind::Absolute => concession.absolute_adjustment.abs(),
        AdjustmentKind::Relative => {
            round2(percent_of(fee_amount, concession.relative_adjustment.abs()))
        }
    }
}

/// Part of the concession a single period can take.
///
/// One-time values are capped by what the period still owes; recurring values are
/// prorated by the period's billable days. Never more than `fee_amount`.
pub fn applicable_amount(
    fee_amount: Decimal,
    concession: &Concession,
    period: &PaymentPeriod,
) -> Result<Decimal, PricingError> {
    let value = match concession.kind() {
        AdjustmentKind::Variable => flat_amount(concession.variable_amount().abs(), concession, period)?,
        AdjustmentKind::Absolute => flat_amount(concession.absolute_adjustment.abs(), concession, period)?,
        AdjustmentKind::Relative => {
            let percentage = concession.relative_adjustment.abs();
            if concession.recurring {
                let prorated = fee_amount
                    .checked_div(Decimal::from(period.days_in_month))
                    .and_then(|per_day| per_day.checked_mul(Decimal::from(period.billable_days)))
                    .ok_or(PricingError::NotANumber {
                        step: "recurring relative concession",
                    })?;
                round2(percent_of(prorated, percentage))
            } else {
                let share = round2(percent_of(fee_amount, percentage));
                if share >= period.amount {
                    round2(period.amount)
                } else {
                    share
                }
            }
        }
    };
    Ok(value.min(fee_amount))
}

fn flat_amount(
    amount: Decimal,
    concession: &Concession,
    period: &PaymentPeriod,
) -> Result<Decimal, PricingError> {
    if concession.recurring {
        prorate(
            amount,
            period.days_in_month,
            period.billable_days,
            "recurring concession",
        )
    } else if amount >= period.amount {
        Ok(period.amount)
    } else {
        Ok(round2(amount))
    }
}

/// Flat deduction a concession takes from each week, day or hour period.
pub fn adjustment_for_concession(
    term: &LeaseTerm,
    concession: &Concession,
) -> Result<Decimal, PricingError> {
    if concession.variable_adjustment {
        return Ok(concession.variable_amount().abs());
    }
    if !concession.absolute_adjustment.is_zero() {
        return Ok(concession.absolute_adjustment.abs());
    }
    if concession.relative_adjustment.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let rent = term
        .adjusted_market_rent
        .ok_or_else(|| PricingError::MissingMarketRent {
            term_id: term.id.clone(),
        })?;
    Ok(round2(percent_of(rent, concession.relative_adjustment.abs())))
}
