use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::money::{percent_of, round2};
use crate::quote::domain::{Concession, PaymentPeriod};
use crate::quote::fees::price_with_floor_ceiling;

/// A concession paired with its computed display value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuedConcession<'a> {
    pub concession: &'a Concession,
    pub value: Decimal,
}

/// Display value of a concession for a term of `length` periods priced at `amount`.
///
/// With `compute_recurring` the value covers every period a recurring concession spans.
pub fn concession_value(
    concession: &Concession,
    length: u32,
    amount: Decimal,
    compute_recurring: bool,
) -> Decimal {
    let count = if compute_recurring && concession.recurring {
        if concession.recurring_count == 0 {
            length
        } else {
            concession.recurring_count
        }
    } else {
        1
    };
    let count = Decimal::from(count);
    let floor_ceiling = concession.floor_ceiling_amount.unwrap_or_default();

    let value = if concession.variable_adjustment {
        concession.variable_amount() * count
    } else if floor_ceiling > Decimal::ZERO {
        floor_ceiling * count
    } else if !concession.relative_adjustment.is_zero() {
        percent_of(amount, concession.relative_adjustment.abs()) * count
    } else {
        concession.absolute_adjustment.abs() * count
    };
    round2(value)
}

pub fn total_concessions(concessions: &[ValuedConcession<'_>]) -> Decimal {
    concessions.iter().map(|valued| valued.value).sum()
}

/// Concessions credited against the move-in charges: the first period, or the first
/// two when the lease starts on or after the 25th.
pub fn concessions_on_move_in(start: NaiveDate, periods: &[PaymentPeriod]) -> Decimal {
    let months = if start.day() < 25 { 1 } else { 2 };
    periods
        .iter()
        .take(months)
        .flat_map(|period| period.applied_concessions.iter())
        .map(|applied| applied.amount)
        .sum()
}

/// Resolves a concession's floor or ceiling policy against the price it discounts.
pub fn floor_ceiling_amount(concession: &Concession, parent_amount: Decimal) -> Option<Decimal> {
    concession.adjustment_floor_ceiling.map(|policy| {
        price_with_floor_ceiling(
            policy,
            parent_amount,
            concession.absolute_adjustment.abs(),
            concession.relative_adjustment.abs(),
        )
    })
}
