use chrono::NaiveDate;
use clap::Args;
use lease_quote::error::AppError;
use lease_quote::quote::PricingConfig;

use crate::infra::{property_today, QuoteRequest};
use crate::report::{price_request, render_quote};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lease start date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
}

/// Two terms: a 12-month lease with a free first month and a 6-month lease with a
/// recurring 5% discount; a pet rent that is free for the first month; application
/// fee and deposit.
pub(crate) fn sample_request() -> Result<QuoteRequest, AppError> {
    let request = serde_json::from_value(serde_json::json!({
        "terms": [
            {
                "id": "12m",
                "termLength": 12,
                "period": "month",
                "adjustedMarketRent": 2150,
                "concessions": [{
                    "id": "one-month-free",
                    "displayName": "One month free",
                    "relativeAdjustment": -100,
                    "nonRecurringAppliedAt": "first",
                    "selected": true
                }]
            },
            {
                "id": "6m",
                "termLength": 6,
                "period": "month",
                "adjustedMarketRent": 2400,
                "concessions": [{
                    "id": "five-percent",
                    "displayName": "5% off every month",
                    "recurring": true,
                    "relativeAdjustment": -5,
                    "selected": true
                }]
            }
        ],
        "fees": [
            {
                "id": "pet-rent",
                "displayName": "Pet rent",
                "quoteSectionName": "pet",
                "price": 50,
                "amount": 50,
                "selected": true,
                "quotePaymentScheduleFlag": true,
                "concessions": [{
                    "id": "pet-free-month",
                    "absoluteAdjustment": -50,
                    "selected": true
                }]
            },
            {
                "id": "application",
                "displayName": "Application fee",
                "quoteSectionName": "application",
                "price": 45,
                "amount": 45,
                "selected": true
            },
            {
                "id": "deposit",
                "displayName": "Security deposit",
                "quoteSectionName": "deposit",
                "price": 600,
                "amount": 600,
                "selected": true
            }
        ]
    }))?;
    Ok(request)
}

pub(crate) fn run_demo(args: DemoArgs, config: PricingConfig) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(|| property_today(config));
    let request = sample_request()?;

    println!("Leasing quote demo");
    let quotes = price_request(&request, start, config)?;
    render_quote(&quotes, start, config);
    Ok(())
}
