use chrono::NaiveDate;
use lease_quote::quote::fees::deposit_across_selected_terms;
use lease_quote::quote::matrix::{
    is_valid_start_date, lowest_price_start_date, refresh_terms, MoveInRange, RentMatrixImporter,
};
use lease_quote::quote::{
    Concession, DepositAmount, Fee, LeaseTerm, LeaseTermId, PeriodUnit, Placement, PricingConfig,
    QuoteAggregator,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const MATRIX: &str = "\
term_length,start_date,end_date,price,original_base_rent
12,2019-05-02,2019-05-09,2405,2405
12,2019-05-10,2019-05-10,2459,
6,2019-05-02,2019-05-31,2600,
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn term(id: &str, length: u32) -> LeaseTerm {
    LeaseTerm::new(LeaseTermId(id.to_string()), length, PeriodUnit::Month)
}

fn last_month_free() -> Concession {
    serde_json::from_value(serde_json::json!({
        "id": "last-month-free",
        "relativeAdjustment": -100,
        "nonRecurringAppliedAt": "last",
        "selected": true
    }))
    .expect("concession parses")
}

#[test]
fn imported_matrix_prices_a_mid_month_lease() {
    let matrix = RentMatrixImporter::from_reader(MATRIX.as_bytes()).expect("matrix imports");
    let mut twelve = term("12m", 12);
    twelve.concessions = vec![last_month_free()];
    assert_eq!(twelve.concessions[0].placement, Placement::Last);

    let start = date(2019, 5, 4);
    let terms = refresh_terms(&[twelve], Some(start), Some(&matrix), false);
    assert_eq!(terms[0].adjusted_market_rent, Some(dec!(2405)));
    assert_eq!(terms[0].original_base_rent, Some(dec!(2405)));

    let aggregator = QuoteAggregator::new(PricingConfig::default());
    let periods = aggregator
        .payment_periods(&terms[0], start, &[])
        .expect("periods");
    assert_eq!(periods.len(), 13);
    assert_eq!(periods[0].amount, dec!(2164.50));
    assert_eq!(periods[12].amount, Decimal::ZERO);

    let billed: Decimal = periods.iter().map(|period| period.amount).sum();
    let saved: Decimal = periods.iter().map(|period| period.saved_amount).sum();
    assert_eq!(billed, dec!(26455));
    assert_eq!(saved, dec!(2405));

    let schedule = aggregator
        .period_amounts_for_term(&terms[0], start, &[])
        .expect("schedule");
    let first = schedule.first().expect("first entry");
    let last = schedule.last().expect("last entry");
    assert_eq!((first.timeframe.as_str(), first.amount), ("May 2019", dec!(2164.50)));
    assert_eq!((last.timeframe.as_str(), last.amount), ("May 2020", Decimal::ZERO));
}

#[test]
fn start_dates_outside_every_interval_leave_terms_unpriced() {
    let matrix = RentMatrixImporter::from_reader(MATRIX.as_bytes()).expect("matrix imports");
    let terms = vec![term("12m", 12), term("6m", 6)];
    let today = date(2019, 5, 1);

    assert!(is_valid_start_date(Some(&matrix), &terms, date(2019, 5, 20), today, None));
    assert!(!is_valid_start_date(Some(&matrix), &terms, date(2019, 6, 5), today, None));
    assert!(!is_valid_start_date(Some(&matrix), &terms, date(2019, 4, 30), today, None));

    let refreshed = refresh_terms(&terms, Some(date(2019, 6, 5)), Some(&matrix), false);
    assert!(refreshed.iter().all(|term| term.adjusted_market_rent.is_none()));
    let selections = QuoteAggregator::new(PricingConfig::default())
        .selections(&[], &refreshed, date(2019, 6, 5), &[])
        .expect("no selection is not an error");
    assert!(selections.is_empty());
}

#[test]
fn cheapest_start_searches_up_to_the_matrix_horizon() {
    let matrix = RentMatrixImporter::from_reader(MATRIX.as_bytes()).expect("matrix imports");
    let terms = vec![term("12m", 12), term("6m", 6)];
    let preference = MoveInRange {
        min: Some(date(2019, 5, 1)),
        max: None,
    };

    let found = lowest_price_start_date(Some(&matrix), &terms, &preference, date(2019, 5, 1), true)
        .expect("matrix present")
        .expect("an interval overlaps");
    assert_eq!(found.term_id, LeaseTermId("12m".to_string()));
    assert_eq!(found.start_date, date(2019, 5, 2));
    assert_eq!(found.price, dec!(2405));

    let past = lowest_price_start_date(Some(&matrix), &terms, &preference, date(2019, 5, 5), false)
        .expect("matrix present")
        .expect("an interval overlaps");
    assert_eq!(past.start_date, date(2019, 5, 5));
}

#[test]
fn deposits_collapse_only_when_every_selected_term_agrees() {
    let deposit = |amounts: [u32; 3]| -> Fee {
        serde_json::from_value(serde_json::json!({
            "id": "deposit",
            "quoteSectionName": "deposit",
            "selected": true,
            "relativeAmountsByLeaseTerm": [
                { "leaseTermId": "6m", "amount": amounts[0], "maxAmount": 5000, "selected": true },
                { "leaseTermId": "9m", "amount": amounts[1], "maxAmount": 5000, "selected": true },
                { "leaseTermId": "12m", "amount": amounts[2], "maxAmount": 5000, "selected": true }
            ]
        }))
        .expect("fee parses")
    };
    let selected: Vec<LeaseTermId> = ["6m", "9m", "12m"]
        .iter()
        .map(|id| LeaseTermId(id.to_string()))
        .collect();

    assert_eq!(
        deposit_across_selected_terms(&deposit([1000, 1000, 1000]), &selected),
        DepositAmount::Single(dec!(1000))
    );
    match deposit_across_selected_terms(&deposit([1000, 1200, 1000]), &selected) {
        DepositAmount::PerTerm(per_term) => {
            let amounts: Vec<Decimal> = per_term.iter().map(|entry| entry.deposit_amount).collect();
            assert_eq!(amounts, vec![dec!(1000), dec!(1200), dec!(1000)]);
        }
        other => panic!("expected per-term deposits, got {other:?}"),
    }
}
