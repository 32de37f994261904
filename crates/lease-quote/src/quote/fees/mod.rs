//! Fee, deposit and charge amounts.

mod baked;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{Fee, FeeId, FloorCeiling, LeaseTerm, LeaseTermId, RelativeAmountByLeaseTerm};
use super::error::PricingError;
use super::periods::prorated_move_in_amount;
use crate::money::{percent_of, round2};

pub use baked::{
    apply_baked_adjustments, base_rent_limits, min_max_baked_adjustments,
    partial_rent_with_non_variable_baked, refresh_fee_amounts, without_baked_concessions,
    BakedAdjustments, BaseRentLimits,
};

/// Resolved amount of a fee for the current term selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeAmounts {
    /// Rent-relative fees carry one amount per selected term.
    PerTerm(Vec<RelativeAmountByLeaseTerm>),
    #[serde(rename_all = "camelCase")]
    Single {
        amount: Option<Decimal>,
        max_amount: Option<Decimal>,
    },
}

/// Computes what a fee costs given the selected terms.
///
/// Fees priced relative to base rent, without a resolved parent amount, produce one
/// entry per selected term. Self-serve variable fees with a default are limited to that
/// default; every other fee passes its stored amount through.
pub fn fee_amounts(
    fee: &Fee,
    selected_term_ids: &[LeaseTermId],
    self_serve: bool,
    terms: &[LeaseTerm],
) -> FeeAmounts {
    let relative_to_rent = ((fee.relative_default_price.is_some()
        && fee.absolute_default_price.is_none())
        || fee.relative_price.is_some())
        && fee.parent_fee_amount.is_none();

    if relative_to_rent {
        let per_term = terms
            .iter()
            .filter(|term| selected_term_ids.contains(&term.id))
            .map(|term| amount_for_term(fee, term))
            .collect();
        return FeeAmounts::PerTerm(per_term);
    }

    let has_default = fee.absolute_default_price.is_some()
        || (fee.relative_default_price.is_some() && fee.parent_fee_amount.is_some());
    if !self_serve || !fee.variable_adjustment || !has_default {
        return FeeAmounts::Single {
            amount: fee.amount,
            max_amount: fee.absolute_price,
        };
    }

    let default_amount = default_variable_amount(fee).unwrap_or_default();
    let current = fee.amount.unwrap_or_default();
    let amount = default_amount.min(current) * Decimal::from(fee.quantity);
    FeeAmounts::Single {
        amount: Some(amount),
        max_amount: Some(amount.max(default_amount)),
    }
}

fn amount_for_term(fee: &Fee, term: &LeaseTerm) -> RelativeAmountByLeaseTerm {
    let rent = term.adjusted_market_rent.unwrap_or_default();
    let mut regular = match fee.relative_price {
        Some(relative) => percent_of(rent, relative),
        None => fee.absolute_price.unwrap_or_default(),
    };
    let mut max_amount = regular;

    if let Some(policy) = fee.price_floor_ceiling {
        regular = price_with_floor_ceiling(
            policy,
            rent,
            fee.absolute_price.unwrap_or_default(),
            fee.relative_price.unwrap_or_default(),
        );
        max_amount = regular;
    }

    if fee.variable_adjustment {
        regular = match (fee.relative_default_price, fee.absolute_default_price) {
            (None, None) => Decimal::ZERO,
            (Some(relative), _) if !relative.is_zero() && term.adjusted_market_rent.is_some() => {
                regular.min(percent_of(rent, relative.abs()))
            }
            (_, absolute) => regular.min(absolute.unwrap_or_default()),
        };
    }

    RelativeAmountByLeaseTerm {
        lease_term_id: term.id.clone(),
        amount: regular,
        max_amount,
        selected: true,
    }
}

/// Floor keeps the greater of the absolute price and the relative share; ceiling the lesser.
pub fn price_with_floor_ceiling(
    policy: FloorCeiling,
    parent_amount: Decimal,
    absolute_price: Decimal,
    relative_price: Decimal,
) -> Decimal {
    let relative_amount = percent_of(parent_amount, relative_price);
    match policy {
        FloorCeiling::Floor => absolute_price.max(relative_amount),
        FloorCeiling::Ceiling => absolute_price.min(relative_amount),
    }
}

/// Default an agent starts from for a variable fee.
pub fn default_variable_amount(fee: &Fee) -> Option<Decimal> {
    match (fee.relative_default_price, fee.parent_fee_amount) {
        (Some(relative), Some(parent)) => Some(percent_of(parent, relative.abs())),
        _ => fee.absolute_default_price,
    }
}

/// Price of a child fee derived from its parent's price.
pub fn fee_relative_price(
    fee: &Fee,
    parent_price: Option<Decimal>,
    inventory_group: bool,
) -> Option<Decimal> {
    if inventory_group {
        return parent_price;
    }
    match (fee.relative_price, parent_price) {
        (Some(relative), Some(parent)) if !relative.is_zero() && !parent.is_zero() => {
            Some(percent_of(parent, relative.abs()))
        }
        _ => fee.absolute_price,
    }
}

/// Upper bound an agent may enter for a variable concession.
pub fn max_amount_limit(
    base_rent: Decimal,
    relative_adjustment: Decimal,
    absolute_adjustment: Decimal,
    floor_ceiling_amount: Option<Decimal>,
) -> Decimal {
    match floor_ceiling_amount {
        Some(amount) if amount > Decimal::ZERO => amount,
        _ if absolute_adjustment > Decimal::ZERO => round2(absolute_adjustment),
        _ => percent_of(base_rent, relative_adjustment),
    }
}

/// Deposit charged for one term: the stored amount, else the term's relative amount.
pub fn deposit_amount(fee: &Fee, term_id: &LeaseTermId) -> Decimal {
    match fee.amount {
        Some(amount) if amount >= Decimal::ZERO => amount,
        _ => relative_amount_for(fee, term_id)
            .map(|relative| relative.amount)
            .unwrap_or_default(),
    }
}

fn relative_amount_for<'a>(fee: &'a Fee, term_id: &LeaseTermId) -> Option<&'a RelativeAmountByLeaseTerm> {
    fee.relative_amounts_by_lease_term
        .iter()
        .find(|relative| &relative.lease_term_id == term_id)
}

/// Deposit owed under one selected term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermDeposit {
    pub lease_term_id: LeaseTermId,
    pub deposit_amount: Decimal,
    pub relative_amount_by_lease_term: RelativeAmountByLeaseTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DepositAmount {
    /// Every selected term owes the same deposit.
    Single(Decimal),
    PerTerm(Vec<TermDeposit>),
}

pub fn deposit_across_selected_terms(fee: &Fee, selected_term_ids: &[LeaseTermId]) -> DepositAmount {
    let deposits: Vec<TermDeposit> = selected_term_ids
        .iter()
        .filter_map(|term_id| {
            relative_amount_for(fee, term_id).map(|relative| TermDeposit {
                lease_term_id: term_id.clone(),
                deposit_amount: relative.amount,
                relative_amount_by_lease_term: relative.clone(),
            })
        })
        .collect();

    let min = deposits.iter().map(|deposit| deposit.deposit_amount).min();
    let max = deposits.iter().map(|deposit| deposit.deposit_amount).max();
    match (min, max) {
        (Some(min), Some(max)) if min == max => DepositAmount::Single(min),
        (None, _) | (_, None) => DepositAmount::Single(Decimal::ZERO),
        _ => DepositAmount::PerTerm(deposits),
    }
}

/// Amount a charge contributes under a term, if it has a usable one.
pub fn charge_amount_for_term(charge: &Fee, term_id: &LeaseTermId) -> Option<Decimal> {
    charge
        .amount
        .filter(|amount| !amount.is_zero())
        .or_else(|| {
            charge
                .relative_amounts_by_lease_term
                .iter()
                .find(|relative| &relative.lease_term_id == term_id && relative.selected)
                .map(|relative| relative.amount)
        })
        .filter(|amount| *amount >= Decimal::ZERO)
}

/// A charge with its amount resolved for one term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermCharge {
    pub fee_id: FeeId,
    pub display_name: String,
    pub amount: Decimal,
}

pub fn charges_for_term(charges: &[Fee], term_id: &LeaseTermId) -> Vec<TermCharge> {
    charges
        .iter()
        .filter_map(|charge| {
            charge_amount_for_term(charge, term_id).map(|amount| TermCharge {
                fee_id: charge.id.clone(),
                display_name: charge.display_name.clone(),
                amount,
            })
        })
        .collect()
}

/// Fees split into recurring additional charges and one-time charges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitCharges {
    pub additional: Vec<Fee>,
    pub one_time: Vec<Fee>,
}

pub fn split_charges(fees: &[Fee]) -> SplitCharges {
    let (one_time, additional) = fees
        .iter()
        .cloned()
        .partition(|fee| fee.quote_section_name.is_one_time());
    SplitCharges {
        additional,
        one_time,
    }
}

/// Rent collected at move-in: the prorated first month, plus the next month for late starts.
pub fn move_in_rent(move_in: NaiveDate, rent: Decimal) -> Result<Decimal, PricingError> {
    let prorated = prorated_move_in_amount(move_in, rent, None)?;
    if move_in.day() >= 25 {
        Ok(prorated + rent)
    } else {
        Ok(prorated)
    }
}
