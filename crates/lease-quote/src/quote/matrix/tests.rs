use super::*;
use crate::quote::domain::{LeaseTerm, LeaseTermId, PeriodUnit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn table(rows: &[(&str, &str, Decimal)]) -> RentTable {
    RentTable::from_ranges(rows.iter().map(|(start, end, price)| {
        let end = parse_iso(end).expect("valid end date");
        (start.to_string(), MatrixRange::new(end, *price))
    }))
    .expect("valid table")
}

fn may_2019_table() -> RentTable {
    table(&[
        ("2019-05-02", "2019-05-09", dec!(2405)),
        ("2019-05-10", "2019-05-10", dec!(2459)),
        ("2019-05-11", "2019-05-11", dec!(2459)),
        ("2019-05-12", "2019-05-12", dec!(2466)),
        ("2019-05-13", "2019-05-13", dec!(2512)),
        ("2019-05-14", "2019-05-14", dec!(2512)),
        ("2019-05-15", "2019-05-15", dec!(2526)),
        ("2019-05-16", "2019-05-16", dec!(2546)),
        ("2019-05-17", "2019-05-17", dec!(2566)),
    ])
}

fn term(id: &str, term_length: u32) -> LeaseTerm {
    LeaseTerm {
        id: LeaseTermId(id.to_string()),
        term_length,
        period: Some(PeriodUnit::Month),
        adjusted_market_rent: None,
        overwritten_base_rent: None,
        original_base_rent: None,
        allow_base_rent_adjustment: None,
        min_baked_fees_adjustment: None,
        max_baked_fees_adjustment: None,
        relative_adjustment: Decimal::ZERO,
        absolute_adjustment: Decimal::ZERO,
        reset_overwritten_base_rent: false,
        concessions: Vec::new(),
    }
}

#[test]
fn resolve_before_first_interval_uses_first_when_closest_allowed() {
    let table = may_2019_table();
    let found = table.resolve(date(2019, 5, 1), true).expect("closest range");
    assert_eq!(found.range.price, dec!(2405));
    assert_eq!(found.matched_key, "2019-05-02");
    assert_eq!(found.index, 0);
    assert!(table.resolve(date(2019, 5, 1), false).is_none());
}

#[test]
fn resolve_after_last_interval_uses_last_end_date() {
    let table = may_2019_table();
    let found = table.resolve(date(2019, 5, 18), true).expect("closest range");
    assert_eq!(found.range.price, dec!(2566));
    assert_eq!(found.matched_key, "2019-05-17");
    assert_eq!(found.index, 8);
    assert!(table.resolve(date(2019, 5, 18), false).is_none());
}

#[test]
fn resolve_inside_interval_returns_interval_start() {
    let table = may_2019_table();
    for day in 2..=9 {
        let found = table.resolve(date(2019, 5, day), false).expect("in range");
        assert_eq!(found.range.price, dec!(2405));
        assert_eq!(found.matched_key, "2019-05-02");
    }
    let last = table.resolve(date(2019, 5, 17), false).expect("exact key");
    assert_eq!(last.range.price, dec!(2566));
}

#[test]
fn resolve_agrees_with_linear_scan_on_random_tables() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let mut cursor = date(2020, 1, 1) + chrono::Duration::days(rng.gen_range(0..40));
        let mut rows = Vec::new();
        for _ in 0..rng.gen_range(1..25) {
            let end = cursor + chrono::Duration::days(rng.gen_range(0..6));
            let price = Decimal::from(rng.gen_range(1500i64..3500));
            rows.push((cursor, end, price));
            cursor = end + chrono::Duration::days(rng.gen_range(1..3));
        }
        let table = RentTable::from_ranges(
            rows.iter()
                .map(|(start, end, price)| (iso_key(*start), MatrixRange::new(*end, *price))),
        )
        .expect("valid table");

        for offset in -3..90 {
            let probe = date(2020, 1, 1) + chrono::Duration::days(offset);
            let linear = rows
                .iter()
                .position(|(start, end, _)| *start <= probe && probe <= *end);
            let found = table.resolve(probe, false).map(|found| found.index);
            assert_eq!(found, linear, "probe {probe}");

            if let Some(index) = linear {
                let (start, end, price) = rows[index];
                assert_eq!(table.resolve(start, false).map(|f| f.range.price), Some(price));
                assert_eq!(table.resolve(end, false).map(|f| f.range.price), Some(price));
            }
        }
    }
}

#[test]
fn lowest_adjacent_prefers_cheaper_previous_interval() {
    let table = table(&[
        ("2019-05-01", "2019-05-05", dec!(2300)),
        ("2019-05-06", "2019-05-10", dec!(2400)),
        ("2019-05-11", "2019-05-15", dec!(2500)),
    ]);
    let lowest = table
        .lowest_adjacent(date(2019, 5, 8), None)
        .expect("date is priced");
    assert_eq!(
        lowest,
        AdjacentPrice {
            rent: dec!(2300),
            end_date: "2019-05-05".to_string(),
        }
    );
}

#[test]
fn lowest_adjacent_skips_previous_interval_before_boundary() {
    let table = table(&[
        ("2019-05-01", "2019-05-05", dec!(2300)),
        ("2019-05-06", "2019-05-10", dec!(2400)),
        ("2019-05-11", "2019-05-15", dec!(2350)),
    ]);
    let lowest = table
        .lowest_adjacent(date(2019, 5, 8), Some(date(2019, 5, 6)))
        .expect("date is priced");
    assert_eq!(lowest.rent, dec!(2350));
    assert_eq!(lowest.end_date, "2019-05-11");
}

#[test]
fn lowest_adjacent_keeps_selected_when_cheapest() {
    let table = may_2019_table();
    let lowest = table
        .lowest_adjacent(date(2019, 5, 4), None)
        .expect("date is priced");
    assert_eq!(lowest.rent, dec!(2405));
    assert_eq!(lowest.end_date, "2019-05-04");
    assert!(table.lowest_adjacent(date(2019, 6, 1), None).is_none());
}

#[test]
fn highest_end_date_requires_a_matrix() {
    let terms = vec![term("t12", 12)];
    assert_eq!(
        highest_end_date(&terms, None, date(2019, 5, 1)),
        Err(PricingError::MissingRentMatrix)
    );

    let mut matrix = RentMatrix::default();
    matrix.insert(12, may_2019_table());
    assert_eq!(
        highest_end_date(&terms, Some(&matrix), date(2019, 5, 1)),
        Ok(date(2019, 5, 17))
    );
    assert_eq!(
        highest_end_date(&terms, Some(&matrix), date(2019, 6, 1)),
        Ok(date(2019, 6, 1))
    );
}

#[test]
fn cheapest_across_terms_prefers_preferred_window() {
    let mut matrix = RentMatrix::default();
    matrix.insert(12, may_2019_table());
    matrix.insert(
        6,
        table(&[
            ("2019-05-02", "2019-05-09", dec!(2600)),
            ("2019-05-10", "2019-05-20", dec!(2450)),
        ]),
    );
    let terms = vec![term("t6", 6), term("t12", 12)];

    let cheapest = cheapest_across_terms(
        &terms,
        &matrix,
        date(2019, 5, 3),
        date(2019, 5, 20),
        Some(date(2019, 5, 12)),
    )
    .expect("a price exists");
    assert_eq!(cheapest.term_id, LeaseTermId("t6".to_string()));
    assert_eq!(cheapest.start_date, date(2019, 5, 10));
    assert_eq!(cheapest.price, dec!(2450));

    let unbounded = cheapest_across_terms(&terms, &matrix, date(2019, 5, 3), date(2019, 5, 20), None)
        .expect("a price exists");
    assert_eq!(unbounded.term_id, LeaseTermId("t6".to_string()));
    assert_eq!(unbounded.price, dec!(2450));
}

#[test]
fn lowest_price_start_date_moves_past_results_to_today() {
    let mut matrix = RentMatrix::default();
    matrix.insert(12, may_2019_table());
    let terms = vec![term("t12", 12)];

    let in_window = lowest_price_start_date(
        Some(&matrix),
        &terms,
        &MoveInRange::default(),
        date(2019, 5, 5),
        false,
    )
    .expect("matrix present")
    .expect("price found");
    assert_eq!(in_window.price, dec!(2459));
    assert_eq!(in_window.start_date, date(2019, 5, 10));

    let closed_window = MoveInRange {
        min: None,
        max: Some(date(2019, 5, 4)),
    };
    let found = lowest_price_start_date(Some(&matrix), &terms, &closed_window, date(2019, 5, 5), false)
        .expect("matrix present")
        .expect("price found");
    assert_eq!(found.price, dec!(2405));
    assert_eq!(found.start_date, date(2019, 5, 5));

    assert_eq!(
        lowest_price_start_date(None, &terms, &MoveInRange::default(), date(2019, 5, 5), false),
        Err(PricingError::MissingRentMatrix)
    );
}

#[test]
fn refresh_term_rent_copies_or_clears_matrix_fields() {
    let mut range = MatrixRange::new(date(2019, 5, 9), dec!(2405));
    range.original_base_rent = Some(dec!(2300));
    range.allow_base_rent_adjustment = Some(true);
    let mut matrix = RentMatrix::default();
    matrix.insert(
        12,
        RentTable::from_ranges(vec![("2019-05-02".to_string(), range)]).expect("valid table"),
    );

    let mut existing = term("t12", 12);
    existing.overwritten_base_rent = Some(dec!(2200));

    let refreshed = refresh_term_rent(&existing, date(2019, 5, 4), &matrix, false);
    assert_eq!(refreshed.adjusted_market_rent, Some(dec!(2405)));
    assert_eq!(refreshed.overwritten_base_rent, Some(dec!(2200)));
    assert_eq!(refreshed.original_base_rent, Some(dec!(2300)));
    assert_eq!(refreshed.allow_base_rent_adjustment, Some(true));

    let reset = refresh_term_rent(&existing, date(2019, 5, 4), &matrix, true);
    assert_eq!(reset.adjusted_market_rent, Some(dec!(2300)));
    assert_eq!(reset.overwritten_base_rent, Some(dec!(2300)));

    let cleared = refresh_term_rent(&refreshed, date(2019, 6, 1), &matrix, false);
    assert_eq!(cleared.adjusted_market_rent, None);
    assert_eq!(cleared.overwritten_base_rent, None);
    assert_eq!(cleared.allow_base_rent_adjustment, None);
}

#[test]
fn valid_start_date_requires_a_priced_term() {
    let mut matrix = RentMatrix::default();
    matrix.insert(12, may_2019_table());
    let terms = vec![term("t6", 6), term("t12", 12)];
    let today = date(2019, 5, 1);

    assert!(is_valid_start_date(Some(&matrix), &terms, date(2019, 5, 4), today, None));
    assert!(!is_valid_start_date(Some(&matrix), &terms, date(2019, 5, 30), today, None));
    assert!(!is_valid_start_date(Some(&matrix), &terms, date(2019, 4, 30), today, None));
    assert!(is_valid_start_date(None, &terms, date(2019, 4, 30), today, None));

    let expired = MoveInRange {
        min: Some(date(2019, 4, 1)),
        max: Some(date(2019, 4, 20)),
    };
    assert!(!is_valid_start_date(
        Some(&matrix),
        &terms,
        date(2019, 5, 4),
        today,
        Some(&expired)
    ));
}

#[test]
fn matrix_deserializes_from_quote_json() {
    let matrix: RentMatrix = serde_json::from_value(serde_json::json!({
        "12": {
            "2019-05-10": { "endDate": "2019-05-10", "rent": 2459 },
            "2019-05-02T00:00:00Z": { "endDate": "2019-05-09", "rent": 2405 }
        }
    }))
    .expect("matrix parses");

    let table = matrix.table(12).expect("12 month table");
    let keys: Vec<&str> = table.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["2019-05-02", "2019-05-10"]);
    assert!(matrix.table(6).is_none());
}
