use chrono::NaiveDate;
use lease_quote::error::AppError;
use lease_quote::money::format_money;
use lease_quote::quote::concessions::{concession_value, concessions_on_move_in, total_concessions};
use lease_quote::quote::fees::{
    charges_for_term, deposit_amount, refresh_fee_amounts, split_charges, TermCharge,
};
use lease_quote::quote::matrix::refresh_terms;
use lease_quote::quote::{
    LeaseTerm, LeaseTermId, PeriodUnit, PricingConfig, QuoteAggregator, QuoteSection,
    TermSelection, ValuedConcession,
};
use rust_decimal::Decimal;
use tracing::warn;

use crate::infra::QuoteRequest;

/// Everything printed for one priced lease term.
#[derive(Debug, Clone)]
pub(crate) struct TermQuote {
    pub(crate) term: LeaseTerm,
    pub(crate) selection: TermSelection,
    pub(crate) one_time_charges: Vec<TermCharge>,
    pub(crate) deposit: Decimal,
    pub(crate) total_concessions: Decimal,
    pub(crate) move_in_concessions: Decimal,
}

pub(crate) fn price_request(
    request: &QuoteRequest,
    start: NaiveDate,
    config: PricingConfig,
) -> Result<Vec<TermQuote>, AppError> {
    let fees = refresh_fee_amounts(&request.fees);
    let charges = split_charges(&fees);
    let terms = refresh_terms(
        &request.terms,
        Some(start),
        request.rent_matrix.as_ref(),
        request.reset_overwritten_base_rent,
    );

    let wanted: Vec<&LeaseTerm> = terms
        .iter()
        .filter(|term| {
            request.selected_term_ids.is_empty() || request.selected_term_ids.contains(&term.id)
        })
        .collect();
    let priced: Vec<LeaseTermId> = wanted
        .iter()
        .filter(|term| {
            let has_rent = term.base_rent().is_some();
            if !has_rent {
                warn!(term = %term.id, %start, "no rent for lease term on start date; skipping");
            }
            has_rent
        })
        .map(|term| term.id.clone())
        .collect();

    let aggregator = QuoteAggregator::new(config);
    let selections = aggregator.selections(&priced, &terms, start, &charges.additional)?;

    selections
        .into_iter()
        .filter_map(|selection| {
            terms
                .iter()
                .find(|term| term.id == selection.id)
                .map(|term| (term.clone(), selection))
        })
        .map(|(term, selection)| -> Result<TermQuote, AppError> {
            let rent = term.base_rent().unwrap_or_default();
            let rent_periods = aggregator.payment_periods(&term, start, &[])?;
            let valued: Vec<ValuedConcession<'_>> = term
                .concessions
                .iter()
                .filter(|concession| concession.applies_to_schedule())
                .map(|concession| ValuedConcession {
                    concession,
                    value: concession_value(concession, term.term_length, rent, true),
                })
                .collect();
            let total = total_concessions(&valued);

            let (deposits, one_time): (Vec<_>, Vec<_>) = charges
                .one_time
                .iter()
                .filter(|fee| fee.selected)
                .cloned()
                .partition(|fee| fee.quote_section_name == QuoteSection::Deposit);
            let deposit: Decimal = deposits
                .iter()
                .map(|fee| deposit_amount(fee, &term.id))
                .sum();

            Ok(TermQuote {
                move_in_concessions: concessions_on_move_in(start, &rent_periods),
                one_time_charges: charges_for_term(&one_time, &term.id),
                total_concessions: total,
                deposit,
                selection,
                term,
            })
        })
        .collect()
}

fn unit_label(term: &LeaseTerm) -> String {
    let unit = term.period.unwrap_or(PeriodUnit::Month).label();
    if term.term_length == 1 {
        format!("{} {unit}", term.term_length)
    } else {
        format!("{} {unit}s", term.term_length)
    }
}

pub(crate) fn render_quote(quotes: &[TermQuote], start: NaiveDate, config: PricingConfig) {
    println!(
        "Quote starting {} ({}, {})",
        start.format("%b %d, %Y"),
        config.proration.label(),
        config.timezone.name()
    );
    if quotes.is_empty() {
        println!("No lease term could be priced for this start date.");
        return;
    }

    for quote in quotes {
        println!("\n{} lease [{}]", unit_label(&quote.term), quote.term.id);
        if let (Some(original), Some(overwritten)) = (
            quote.selection.original_base_rent,
            quote.selection.overwritten_base_rent,
        ) {
            println!(
                "  Base rent adjusted from {} to {}",
                format_money(original),
                format_money(overwritten)
            );
        }
        println!("  Payment schedule:");
        for entry in &quote.selection.payment_schedule {
            println!("    {:<28}{:>14}", entry.timeframe, format_money(entry.amount));
        }
        if !quote.total_concessions.is_zero() {
            println!(
                "  Concessions: {} total, {} at move-in",
                format_money(quote.total_concessions),
                format_money(quote.move_in_concessions)
            );
        }
        if !quote.one_time_charges.is_empty() {
            println!("  One-time charges:");
            for charge in &quote.one_time_charges {
                println!("    - {}: {}", charge.display_name, format_money(charge.amount));
            }
        }
        if !quote.deposit.is_zero() {
            println!("  Deposit: {}", format_money(quote.deposit));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(value: serde_json::Value) -> QuoteRequest {
        serde_json::from_value(value).expect("request parses")
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 3, 1).expect("valid date")
    }

    #[test]
    fn prices_selected_terms_with_charges_and_deposits() {
        let request = request(serde_json::json!({
            "selectedTermIds": ["12m"],
            "terms": [
                {
                    "id": "12m",
                    "termLength": 12,
                    "period": "month",
                    "adjustedMarketRent": 2000,
                    "concessions": [{ "id": "free", "relativeAdjustment": -100, "selected": true }]
                },
                { "id": "6m", "termLength": 6, "period": "month", "adjustedMarketRent": 2200 }
            ],
            "fees": [
                { "id": "pet", "displayName": "Pet rent", "quoteSectionName": "pet",
                  "price": 50, "amount": 50, "selected": true, "quotePaymentScheduleFlag": true },
                { "id": "app", "displayName": "Application fee", "quoteSectionName": "application",
                  "price": 45, "amount": 45, "selected": true },
                { "id": "dep", "displayName": "Security deposit", "quoteSectionName": "deposit",
                  "price": 500, "amount": 500, "selected": true }
            ]
        }));

        let quotes = price_request(&request, start(), PricingConfig::default()).expect("prices");
        assert_eq!(quotes.len(), 1);
        let quote = &quotes[0];
        assert_eq!(quote.term.id, LeaseTermId("12m".to_string()));

        let schedule: Vec<(&str, Decimal)> = quote
            .selection
            .payment_schedule
            .iter()
            .map(|entry| (entry.timeframe.as_str(), entry.amount))
            .collect();
        assert_eq!(
            schedule,
            vec![("Mar 2017", dec!(50)), ("Apr 2017 - Feb 2018", dec!(2050))]
        );
        assert_eq!(quote.total_concessions, dec!(2000));
        assert_eq!(quote.move_in_concessions, dec!(2000));
        assert_eq!(quote.deposit, dec!(500));
        assert_eq!(quote.one_time_charges.len(), 1);
        assert_eq!(quote.one_time_charges[0].amount, dec!(45));
    }

    #[test]
    fn terms_without_rent_are_skipped() {
        let request = request(serde_json::json!({
            "terms": [
                { "id": "12m", "termLength": 12, "period": "month" },
                { "id": "6m", "termLength": 6, "period": "month", "adjustedMarketRent": 2200 }
            ]
        }));

        let quotes = price_request(&request, start(), PricingConfig::default()).expect("prices");
        let ids: Vec<&str> = quotes.iter().map(|quote| quote.term.id.0.as_str()).collect();
        assert_eq!(ids, vec!["6m"]);
    }
}
