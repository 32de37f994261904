//! Concession allocation across payment periods.
//!
//! Monthly schedules walk each concession from its placement anchor, consuming its
//! value period by period and carrying whatever a period cannot absorb into the next
//! one. Weekly, daily and hourly schedules take a flat per-period deduction.

mod amounts;
mod value;


use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::domain::{Concession, ConcessionId, LeaseTerm, PaymentPeriod, Placement};
use super::error::PricingError;
use crate::calendar::is_first_day_of_month;
use crate::money::round2;

pub use amounts::{adjustment_for_concession, applicable_amount, concession_amount};
pub use value::{
    concession_value, concessions_on_move_in, floor_ceiling_amount, total_concessions,
    ValuedConcession,
};

/// Discount a concession still owes while it walks the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarryOver {
    /// Excess the last visited period could not absorb.
    pub pending: Decimal,
    /// Value the concession did not use inside its own budgeted periods.
    pub remaining: Decimal,
}

impl CarryOver {
    pub fn leftover(&self) -> Decimal {
        self.pending + self.remaining
    }

    /// Takes `discount` out of `period` and keeps the part it could not absorb as pending.
    fn absorb(&mut self, period: &mut PaymentPeriod, concession_id: &ConcessionId, discount: Decimal) {
        self.pending = absorb_into(period, concession_id, discount);
    }
}

fn absorb_into(period: &mut PaymentPeriod, concession_id: &ConcessionId, discount: Decimal) -> Decimal {
    if discount > period.amount {
        let taken = period.amount;
        period.amount = Decimal::ZERO;
        period.record_discount(concession_id, taken);
        discount - taken
    } else {
        period.amount = round2(period.amount - discount);
        period.record_discount(concession_id, discount);
        Decimal::ZERO
    }
}

/// Applies `concessions`, in order, to a monthly schedule priced from `fee_amount`.
///
/// Concessions that are unselected, excluded from rent or baked into a fee are skipped.
/// The input periods are left untouched; the returned schedule is a fresh copy.
pub fn apply_monthly_concessions(
    fee_amount: Decimal,
    concessions: &[Concession],
    term_length: u32,
    periods: &[PaymentPeriod],
    start: NaiveDate,
) -> Result<Vec<PaymentPeriod>, PricingError> {
    let mut schedule = periods.to_vec();
    for concession in concessions.iter().filter(|c| c.applies_to_schedule()) {
        allocate(fee_amount, concession, term_length, &mut schedule, start)?;
    }
    Ok(schedule)
}

fn allocate(
    fee_amount: Decimal,
    concession: &Concession,
    term_length: u32,
    schedule: &mut [PaymentPeriod],
    start: NaiveDate,
) -> Result<(), PricingError> {
    let count = schedule.len();
    let walk: Vec<usize> = match concession.placement {
        Placement::First => (0..count).collect(),
        Placement::Last => (0..count).rev().collect(),
        Placement::FirstFull => {
            let anchor = if is_first_day_of_month(start) { 0 } else { 1 };
            if anchor == 1 && schedule.get(1).map_or(true, |period| !period.is_full_month()) {
                debug!(
                    concession = %concession.id,
                    "no full first month to anchor concession; skipped"
                );
                return Ok(());
            }
            (anchor..count).collect()
        }
    };

    let limit = concession.monthly_limit(term_length) as usize;
    let mut carry = CarryOver::default();
    for (visited, &index) in walk.iter().enumerate() {
        let period = &mut schedule[index];
        let discount = if visited < limit {
            let full = concession_amount(fee_amount, concession);
            let applicable = applicable_amount(fee_amount, concession, period)?;
            carry.remaining += round2(full - applicable).max(Decimal::ZERO);
            carry.pending + applicable
        } else {
            std::mem::take(&mut carry.remaining) + carry.pending
        };
        carry.absorb(period, &concession.id, discount);
    }

    let leftover = carry.leftover();
    if leftover <= Decimal::ZERO {
        return Ok(());
    }
    if concession.is_one_time() && concession.placement != Placement::Last {
        warn!(
            concession = %concession.id,
            unabsorbed = %leftover,
            "one-time concession overflows the end of the schedule; remainder dropped"
        );
        return Ok(());
    }

    // The boundary the walk overflowed decides which end absorbs the leftover first.
    let redistribution: Vec<usize> = match concession.placement {
        Placement::Last => (0..count).collect(),
        Placement::First | Placement::FirstFull => (0..count).rev().collect(),
    };
    let mut unabsorbed = leftover;
    for index in redistribution {
        if unabsorbed <= Decimal::ZERO {
            break;
        }
        let period = &mut schedule[index];
        if period.amount > Decimal::ZERO {
            unabsorbed = absorb_into(period, &concession.id, unabsorbed);
        }
    }

    if unabsorbed > Decimal::ZERO {
        warn!(
            concession = %concession.id,
            unabsorbed = %unabsorbed,
            "concession exceeds the whole schedule; remainder dropped"
        );
    }
    Ok(())
}

/// Flat concession deductions for week, day and hour schedules.
///
/// No value carries between periods and a period never drops below zero.
pub fn apply_period_concessions(
    term: &LeaseTerm,
    periods: &[PaymentPeriod],
) -> Result<Vec<PaymentPeriod>, PricingError> {
    let mut schedule = periods.to_vec();
    let count = schedule.len();

    for concession in term
        .concessions
        .iter()
        .filter(|c| c.selected && !c.exclude_from_rent_flag)
    {
        let adjustment = adjustment_for_concession(term, concession)?;
        let covered: Vec<usize> = match (period_limit(concession), concession.placement) {
            (0, _) => (0..count).collect(),
            (limit, Placement::Last) => (0..count).rev().take(limit).collect(),
            (limit, Placement::First | Placement::FirstFull) => (0..count).take(limit).collect(),
        };

        for index in covered {
            let period = &mut schedule[index];
            let taken = adjustment.min(period.amount).max(Decimal::ZERO);
            period.amount = round2(period.amount - taken);
            period.record_discount(&concession.id, taken);
        }
    }

    Ok(schedule)
}

/// Periods a flat concession covers; zero covers the whole schedule.
fn period_limit(concession: &Concession) -> usize {
    if concession.is_one_time() {
        1
    } else if concession.recurring {
        concession.recurring_count as usize
    } else {
        0
    }
}
