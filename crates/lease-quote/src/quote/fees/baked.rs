use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::money::percent_of;
use crate::quote::domain::{Concession, ConcessionId, Fee, LeaseTerm, QuoteSection};

/// Folds baked-in concessions into a price; each relative adjustment applies to the running total.
pub fn apply_baked_adjustments(concessions: &[Concession], partial_rent: Decimal) -> Decimal {
    concessions
        .iter()
        .filter(|concession| concession.baked_into_applied_fee_flag)
        .fold(partial_rent, |total, concession| {
            total + percent_of(total, concession.relative_adjustment) + concession.absolute_adjustment
        })
}

/// Market rent with the term's own adjustments and its fixed baked-in fees applied.
pub fn partial_rent_with_non_variable_baked(term: &LeaseTerm, market_rent: Decimal) -> Decimal {
    let relative = if market_rent.is_zero() {
        Decimal::ZERO
    } else {
        percent_of(market_rent, term.relative_adjustment)
    };
    let partial = market_rent + relative + term.absolute_adjustment;
    let fixed: Vec<Concession> = term
        .concessions
        .iter()
        .filter(|concession| !concession.variable_adjustment)
        .cloned()
        .collect();
    apply_baked_adjustments(&fixed, partial)
}

/// Range an agent may move the base rent within, from variable baked-in fees.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BakedAdjustments {
    pub min_baked_fees_adjustment: Option<Decimal>,
    pub max_baked_fees_adjustment: Option<Decimal>,
    pub min_included: Option<ConcessionId>,
    pub max_included: Option<ConcessionId>,
    pub not_included: Vec<ConcessionId>,
    pub allow_base_rent_adjustment: bool,
}

fn by_adjustment(a: &&Concession, b: &&Concession) -> Ordering {
    (a.relative_adjustment, a.absolute_adjustment).cmp(&(b.relative_adjustment, b.absolute_adjustment))
}

/// Only the steepest discount and the steepest surcharge take part; the rest are reported.
pub fn min_max_baked_adjustments(concessions: &[Concession], partial_rent: Decimal) -> BakedAdjustments {
    let variable: Vec<&Concession> = concessions
        .iter()
        .filter(|c| c.baked_into_applied_fee_flag && c.variable_adjustment)
        .collect();
    let (mut surcharges, mut discounts): (Vec<&Concession>, Vec<&Concession>) = variable
        .iter()
        .copied()
        .partition(|c| c.relative_adjustment > Decimal::ZERO || c.absolute_adjustment > Decimal::ZERO);
    discounts.sort_by(by_adjustment);
    surcharges.sort_by(|a, b| by_adjustment(b, a));

    let apply_first = |candidates: &[&Concession]| {
        candidates.first().map(|first| {
            let amount = apply_baked_adjustments(std::slice::from_ref(*first), partial_rent);
            (first.id.clone(), amount)
        })
    };
    let min = apply_first(discounts.as_slice());
    let max = apply_first(surcharges.as_slice());

    let not_included: Vec<ConcessionId> = discounts
        .iter()
        .skip(1)
        .chain(surcharges.iter().skip(1))
        .map(|concession| concession.id.clone())
        .collect();
    if !not_included.is_empty() {
        debug!(
            skipped = not_included.len(),
            "variable baked-in fees left out of the base rent range"
        );
    }

    BakedAdjustments {
        min_baked_fees_adjustment: min.as_ref().map(|(_, amount)| *amount),
        max_baked_fees_adjustment: max.as_ref().map(|(_, amount)| *amount),
        min_included: min.map(|(id, _)| id),
        max_included: max.map(|(id, _)| id),
        not_included,
        allow_base_rent_adjustment: !variable.is_empty(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BaseRentLimits {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Base rent bounds for a term. A property that allows adjustment while the term does
/// not pins the minimum to the original rent.
pub fn base_rent_limits(
    term: &LeaseTerm,
    allow_adjustment: bool,
    original_base_rent: Option<Decimal>,
) -> BaseRentLimits {
    if allow_adjustment && !term.allow_base_rent_adjustment.unwrap_or(false) {
        BaseRentLimits {
            min: original_base_rent,
            max: None,
        }
    } else {
        BaseRentLimits {
            min: term.min_baked_fees_adjustment,
            max: term.max_baked_fees_adjustment,
        }
    }
}

pub fn without_baked_concessions(terms: &[LeaseTerm]) -> Vec<LeaseTerm> {
    terms
        .iter()
        .map(|term| LeaseTerm {
            concessions: term
                .concessions
                .iter()
                .filter(|concession| !concession.baked_into_applied_fee_flag)
                .cloned()
                .collect(),
            ..term.clone()
        })
        .collect()
}

/// Recomputes fee amounts from price plus baked-in concessions; deposit children take
/// their parent fee's amount.
pub fn refresh_fee_amounts(fees: &[Fee]) -> Vec<Fee> {
    let priced: Vec<Fee> = fees
        .iter()
        .map(|fee| {
            let mut fee = fee.clone();
            if !fee.concessions.is_empty() {
                fee.amount = Some(apply_baked_adjustments(&fee.concessions, fee.price));
            }
            fee
        })
        .collect();

    priced
        .iter()
        .map(|fee| {
            let mut fee = fee.clone();
            if fee.quote_section_name == QuoteSection::Deposit && fee.parent_fee_amount.is_some() {
                fee.parent_fee_amount = priced
                    .iter()
                    .find(|parent| parent.children.contains(&fee.id))
                    .and_then(|parent| parent.amount);
            }
            fee
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::domain::FeeId;
    use crate::quote::fixtures::{absolute, fee, monthly_term, relative, variable};
    use rust_decimal_macros::dec;

    fn baked(mut concession: Concession) -> Concession {
        concession.baked_into_applied_fee_flag = true;
        concession
    }

    fn baked_variable(id: &str, rel: Decimal, abs: Decimal) -> Concession {
        let mut concession = baked(variable(id, Decimal::ZERO));
        concession.relative_adjustment = rel;
        concession.absolute_adjustment = abs;
        concession
    }

    #[test]
    fn baked_adjustments_compound_on_running_total() {
        let concessions = vec![
            baked(relative("ten-up", dec!(10))),
            baked(absolute("minus-50", dec!(-50))),
            relative("not-baked", dec!(-50)),
        ];
        assert_eq!(apply_baked_adjustments(&concessions, dec!(1000)), dec!(1050));

        let reordered = vec![
            baked(absolute("minus-50", dec!(-50))),
            baked(relative("ten-up", dec!(10))),
        ];
        assert_eq!(apply_baked_adjustments(&reordered, dec!(1000)), dec!(1045));
    }

    #[test]
    fn partial_rent_skips_variable_baked_fees() {
        let mut term = monthly_term(12, dec!(2000));
        term.relative_adjustment = dec!(5);
        term.absolute_adjustment = dec!(-25);
        term.concessions = vec![
            baked(absolute("fixed", dec!(40))),
            baked_variable("variable", dec!(0), dec!(500)),
        ];
        assert_eq!(partial_rent_with_non_variable_baked(&term, dec!(2000)), dec!(2115));
        assert_eq!(partial_rent_with_non_variable_baked(&term, dec!(0)), dec!(15));
    }

    #[test]
    fn min_max_uses_steepest_adjustment_on_each_side() {
        let concessions = vec![
            baked_variable("small-discount", dec!(-5), dec!(0)),
            baked_variable("big-discount", dec!(-10), dec!(0)),
            baked_variable("small-surcharge", dec!(0), dec!(25)),
            baked_variable("big-surcharge", dec!(0), dec!(100)),
            baked(absolute("fixed", dec!(30))),
        ];
        let adjustments = min_max_baked_adjustments(&concessions, dec!(2000));

        assert!(adjustments.allow_base_rent_adjustment);
        assert_eq!(adjustments.min_baked_fees_adjustment, Some(dec!(1800)));
        assert_eq!(adjustments.max_baked_fees_adjustment, Some(dec!(2100)));
        assert_eq!(
            adjustments.min_included,
            Some(ConcessionId("big-discount".to_string()))
        );
        assert_eq!(
            adjustments.not_included,
            vec![
                ConcessionId("small-discount".to_string()),
                ConcessionId("small-surcharge".to_string()),
            ]
        );
    }

    #[test]
    fn min_max_without_variable_fees_disallows_adjustment() {
        let adjustments =
            min_max_baked_adjustments(&[baked(absolute("fixed", dec!(30)))], dec!(2000));
        assert_eq!(adjustments, BakedAdjustments::default());
    }

    #[test]
    fn base_rent_limits_pin_minimum_when_term_disallows_adjustment() {
        let mut term = monthly_term(12, dec!(2000));
        term.min_baked_fees_adjustment = Some(dec!(1800));
        term.max_baked_fees_adjustment = Some(dec!(2100));

        assert_eq!(
            base_rent_limits(&term, true, Some(dec!(1950))),
            BaseRentLimits {
                min: Some(dec!(1950)),
                max: None,
            }
        );

        term.allow_base_rent_adjustment = Some(true);
        assert_eq!(
            base_rent_limits(&term, true, Some(dec!(1950))),
            BaseRentLimits {
                min: Some(dec!(1800)),
                max: Some(dec!(2100)),
            }
        );
    }

    #[test]
    fn without_baked_concessions_keeps_the_rest() {
        let mut term = monthly_term(12, dec!(2000));
        term.concessions = vec![baked(absolute("fixed", dec!(30))), relative("free", dec!(-100))];
        let cleaned = without_baked_concessions(&[term]);
        let ids: Vec<&str> = cleaned[0].concessions.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, vec!["free"]);
    }

    #[test]
    fn refresh_applies_baked_fees_and_links_deposit_children() {
        let mut pet = fee("pet", dec!(50));
        pet.concessions = vec![baked(absolute("pet-rent-up", dec!(10)))];
        pet.children = vec![FeeId("pet-deposit".to_string())];

        let mut deposit = fee("pet-deposit", dec!(0));
        deposit.quote_section_name = QuoteSection::Deposit;
        deposit.parent_fee_amount = Some(dec!(50));

        let refreshed = refresh_fee_amounts(&[pet, deposit]);
        assert_eq!(refreshed[0].amount, Some(dec!(60)));
        assert_eq!(refreshed[1].parent_fee_amount, Some(dec!(60)));
    }
}
