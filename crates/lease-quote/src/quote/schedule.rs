use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::concessions::{apply_monthly_concessions, apply_period_concessions};
use super::domain::{
    ConcessionId, Fee, LeaseTerm, LeaseTermId, PaymentPeriod, PeriodUnit, PricingConfig,
};
use super::error::PricingError;
use super::periods::BillingPeriodGenerator;
use crate::money::{fixed2, prorate, round2};

/// One row of the payment schedule shown on a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// `Mar 2016`, `Mar - Jun 2016` or `Mar 2016 - Jun 2017` for monthly schedules.
    pub timeframe: String,
    pub amount: Decimal,
    pub periods: usize,
}

/// Concession carried into a term selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedConcession {
    pub id: ConcessionId,
    pub amount_variable_adjustment: Option<Decimal>,
}

/// Schedule and concessions for one selected lease term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSelection {
    pub id: LeaseTermId,
    pub payment_schedule: Vec<ScheduleEntry>,
    pub concessions: Vec<SelectedConcession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_base_rent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwritten_base_rent: Option<Decimal>,
}

/// Composes periods, concessions and additional charges into a quote's payment schedule.
pub struct QuoteAggregator {
    config: PricingConfig,
    periods: BillingPeriodGenerator,
}

impl QuoteAggregator {
    pub fn new(config: PricingConfig) -> Self {
        Self {
            config,
            periods: BillingPeriodGenerator::new(config),
        }
    }

    pub fn config(&self) -> PricingConfig {
        self.config
    }

    /// Per-period amounts after concessions and recurring charges, before grouping.
    pub fn payment_periods(
        &self,
        term: &LeaseTerm,
        start: NaiveDate,
        additional_charges: &[Fee],
    ) -> Result<Vec<PaymentPeriod>, PricingError> {
        if term.period != Some(PeriodUnit::Month) {
            let periods = self.periods.non_monthly_periods(term, start)?;
            return apply_period_concessions(term, &periods);
        }

        let rent = term
            .base_rent()
            .ok_or_else(|| PricingError::MissingMarketRent {
                term_id: term.id.clone(),
            })?;
        let base = self.periods.monthly_periods(term, start)?;
        let mut periods =
            apply_monthly_concessions(rent, &term.concessions, term.term_length, &base, start)?;

        let contributions = fee_contributions(additional_charges, &periods, term.term_length, start)?;
        for (period, contribution) in periods.iter_mut().zip(contributions) {
            period.amount += contribution;
        }
        Ok(periods)
    }

    /// The displayed schedule: monthly periods collapse into runs of equal amounts.
    pub fn period_amounts_for_term(
        &self,
        term: &LeaseTerm,
        start: NaiveDate,
        additional_charges: &[Fee],
    ) -> Result<Vec<ScheduleEntry>, PricingError> {
        let periods = self.payment_periods(term, start, additional_charges)?;
        if term.period == Some(PeriodUnit::Month) {
            Ok(group_by_amount(&periods))
        } else {
            Ok(periods
                .into_iter()
                .map(|period| ScheduleEntry {
                    timeframe: period.timeframe,
                    amount: period.amount,
                    periods: 1,
                })
                .collect())
        }
    }

    pub fn selections(
        &self,
        selected_term_ids: &[LeaseTermId],
        terms: &[LeaseTerm],
        start: NaiveDate,
        additional_charges: &[Fee],
    ) -> Result<Vec<TermSelection>, PricingError> {
        terms
            .iter()
            .filter(|term| selected_term_ids.contains(&term.id))
            .map(|term| {
                let payment_schedule = self.period_amounts_for_term(term, start, additional_charges)?;
                let concessions = term
                    .concessions
                    .iter()
                    .filter(|concession| concession.selected || !concession.optional)
                    .map(|concession| SelectedConcession {
                        id: concession.id.clone(),
                        amount_variable_adjustment: concession
                            .amount_variable_adjustment
                            .filter(|amount| !amount.is_zero()),
                    })
                    .collect();
                let adjusted = term.original_base_rent.filter(|rent| !rent.is_zero());

                debug!(term = %term.id, entries = payment_schedule.len(), "term schedule built");
                Ok(TermSelection {
                    id: term.id.clone(),
                    payment_schedule,
                    concessions,
                    original_base_rent: adjusted,
                    overwritten_base_rent: adjusted.and(term.overwritten_base_rent),
                })
            })
            .collect()
    }
}

/// Amount each selected recurring charge adds to every period, after the charge's own
/// concessions.
pub fn fee_contributions(
    fees: &[Fee],
    periods: &[PaymentPeriod],
    term_length: u32,
    start: NaiveDate,
) -> Result<Vec<Decimal>, PricingError> {
    let mut totals = vec![Decimal::ZERO; periods.len()];

    for fee in fees.iter().filter(|fee| fee.selected && fee.in_payment_schedule) {
        let monthly = fee.amount.unwrap_or(fee.price).abs();
        let base: Vec<PaymentPeriod> = periods
            .iter()
            .map(|period| {
                let amount = prorate(monthly, period.days_in_month, period.billable_days, "fee proration")?;
                Ok(PaymentPeriod::new(
                    period.timeframe.clone(),
                    period.billable_days,
                    period.days_in_month,
                    amount,
                ))
            })
            .collect::<Result<_, PricingError>>()?;

        let charged = if fee.concessions.is_empty() {
            base
        } else {
            apply_monthly_concessions(fee.price, &fee.concessions, term_length, &base, start)?
        };

        for (total, period) in totals.iter_mut().zip(&charged) {
            *total += period.amount;
        }
    }

    Ok(totals)
}

/// Collapses consecutive periods whose amounts agree to the cent.
pub fn group_by_amount(periods: &[PaymentPeriod]) -> Vec<ScheduleEntry> {
    let mut groups: Vec<(String, Vec<&PaymentPeriod>)> = Vec::new();
    for period in periods {
        let key = fixed2(period.amount);
        match groups.last_mut() {
            Some((current, members)) if *current == key => members.push(period),
            _ => groups.push((key, vec![period])),
        }
    }

    groups
        .into_iter()
        .filter_map(|(_, members)| {
            let first = members.first()?;
            let last = members.last()?;
            let timeframe = if members.len() == 1 {
                first.timeframe.clone()
            } else {
                range_label(&first.timeframe, &last.timeframe)
            };
            Some(ScheduleEntry {
                timeframe,
                amount: round2(first.amount),
                periods: members.len(),
            })
        })
        .collect()
}

fn range_label(first: &str, last: &str) -> String {
    match (first.split_once(' '), last.split_once(' ')) {
        (Some((start_month, start_year)), Some((end_month, end_year))) if start_year == end_year => {
            format!("{start_month} - {end_month} {start_year}")
        }
        _ => format!("{first} - {last}"),
    }
}
