use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::domain::{LeaseTerm, PaymentPeriod, PeriodUnit, PricingConfig, ProrationStrategy};
use super::error::PricingError;
use crate::calendar::{
    add_days, add_months, day_label, days_in_month, hour_label, is_first_day_of_month,
    is_last_day_of_non_leap_february, local_midnight, month_label,
};
use crate::money::prorate;

const THIRTY_DAY_MONTH: u32 = 30;

/// Billable share of the month a date falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillableDays {
    pub billable_days: u32,
    pub days_in_month: u32,
}

/// Days billed for the month containing `date`, counted from the move-in day or up to the
/// move-out day.
pub fn billable_days(date: NaiveDate, move_in: bool, strategy: ProrationStrategy) -> BillableDays {
    let days_in_month = month_length(date, strategy);
    let day = date.day();
    let thirty_day = strategy == ProrationStrategy::ThirtyDayMonth;

    let billable_days = if move_in {
        if day == days_in_month || (day > days_in_month && thirty_day) {
            1
        } else {
            days_in_month + 1 - day
        }
    } else if day > days_in_month || (thirty_day && is_last_day_of_non_leap_february(date)) {
        days_in_month
    } else {
        day
    };

    BillableDays {
        billable_days,
        days_in_month,
    }
}

fn month_length(date: NaiveDate, strategy: ProrationStrategy) -> u32 {
    match strategy {
        ProrationStrategy::ThirtyDayMonth => THIRTY_DAY_MONTH,
        ProrationStrategy::CalendarMonth => days_in_month(date),
    }
}

/// Number of monthly periods: an extra trailing partial month unless the lease starts on the 1st.
pub fn monthly_period_count(term_length: u32, start: NaiveDate) -> u32 {
    if is_first_day_of_month(start) {
        term_length
    } else {
        term_length + 1
    }
}

/// Calendar-month move-in proration of a recurring charge.
pub fn prorated_move_in_amount(
    move_in: NaiveDate,
    amount: Decimal,
    billable_override: Option<u32>,
) -> Result<Decimal, PricingError> {
    let days = billable_days(move_in, true, ProrationStrategy::CalendarMonth);
    let billable = billable_override.unwrap_or(days.billable_days);
    prorate(amount, days.days_in_month, billable, "move-in proration")
}

/// Whole-month lease lengths bracketing a duration in days.
pub fn lease_lengths_for_duration(days: i64) -> Vec<u32> {
    let months = Decimal::from(days) * Decimal::from(4800) / Decimal::from(146_097);
    let mut lengths: Vec<u32> = [months.floor(), months.ceil()]
        .iter()
        .filter_map(|value| value.to_u32())
        .filter(|length| *length > 0)
        .collect();
    lengths.dedup();
    lengths
}

/// Builds the pre-concession period skeleton for a lease term.
pub struct BillingPeriodGenerator {
    config: PricingConfig,
}

impl BillingPeriodGenerator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn billable_days(&self, date: NaiveDate, move_in: bool) -> BillableDays {
        billable_days(date, move_in, self.config.proration)
    }

    pub fn lease_end_date(
        &self,
        term: &LeaseTerm,
        start: NaiveDate,
    ) -> Result<NaiveDate, PricingError> {
        let unit = term.period.ok_or_else(|| PricingError::MissingPeriodUnit {
            term_id: term.id.clone(),
        })?;
        let length = i64::from(term.term_length);

        match unit {
            PeriodUnit::Month if is_first_day_of_month(start) => {
                add_days(add_months(start, term.term_length)?, -1)
            }
            PeriodUnit::Month => add_months(add_days(start, -1)?, term.term_length),
            PeriodUnit::Week => add_days(start, length * 7),
            PeriodUnit::Day => add_days(start, length),
            PeriodUnit::Hour => add_days(start, length / 24),
        }
    }

    pub fn monthly_periods(
        &self,
        term: &LeaseTerm,
        start: NaiveDate,
    ) -> Result<Vec<PaymentPeriod>, PricingError> {
        let rent = term
            .base_rent()
            .ok_or_else(|| PricingError::MissingMarketRent {
                term_id: term.id.clone(),
            })?;
        let end = self.lease_end_date(term, start)?;
        let count = monthly_period_count(term.term_length, start);

        (0..count)
            .map(|index| {
                let period_date = add_months(start, index)?;
                let days = if index == 0 {
                    self.billable_days(start, true)
                } else if index == count - 1 {
                    self.billable_days(end, false)
                } else {
                    let days_in_month = month_length(period_date, self.config.proration);
                    BillableDays {
                        billable_days: days_in_month,
                        days_in_month,
                    }
                };

                let amount = prorate(rent, days.days_in_month, days.billable_days, "monthly base")?;
                Ok(PaymentPeriod::new(
                    month_label(period_date),
                    days.billable_days,
                    days.days_in_month,
                    amount,
                ))
            })
            .collect()
    }

    /// One period per week, day or hour, each billed at the full market rent.
    pub fn non_monthly_periods(
        &self,
        term: &LeaseTerm,
        start: NaiveDate,
    ) -> Result<Vec<PaymentPeriod>, PricingError> {
        let rent = term
            .adjusted_market_rent
            .ok_or_else(|| PricingError::MissingMarketRent {
                term_id: term.id.clone(),
            })?;
        let unit = term.period.ok_or_else(|| PricingError::MissingPeriodUnit {
            term_id: term.id.clone(),
        })?;

        (0..term.term_length)
            .map(|index| {
                let timeframe = self.timeframe(unit, start, index)?;
                Ok(PaymentPeriod::new(timeframe, 1, 1, rent))
            })
            .collect()
    }

    fn timeframe(&self, unit: PeriodUnit, start: NaiveDate, index: u32) -> Result<String, PricingError> {
        let offset = i64::from(index);
        match unit {
            PeriodUnit::Month => Ok(month_label(add_months(start, index)?)),
            PeriodUnit::Week => {
                let first = add_days(start, offset * 7)?;
                let last = add_days(first, 6)?;
                Ok(format!("{} - {}", day_label(first), day_label(last)))
            }
            PeriodUnit::Day => Ok(day_label(add_days(start, offset)?)),
            PeriodUnit::Hour => {
                let midnight = local_midnight(start, self.config.timezone)?;
                Ok(hour_label(midnight + Duration::hours(offset)))
            }
        }
    }
}
