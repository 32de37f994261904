use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::domain::{
    Concession, ConcessionId, Fee, FeeId, LeaseTerm, LeaseTermId, PeriodUnit, Placement,
    PricingConfig, ProrationStrategy, QuoteSection,
};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(crate) fn thirty_day() -> PricingConfig {
    PricingConfig {
        timezone: chrono_tz::UTC,
        proration: ProrationStrategy::ThirtyDayMonth,
    }
}

pub(crate) fn calendar() -> PricingConfig {
    PricingConfig {
        timezone: chrono_tz::UTC,
        proration: ProrationStrategy::CalendarMonth,
    }
}

pub(crate) fn monthly_term(term_length: u32, rent: Decimal) -> LeaseTerm {
    LeaseTerm {
        id: LeaseTermId(format!("term-{term_length}")),
        term_length,
        period: Some(PeriodUnit::Month),
        adjusted_market_rent: Some(rent),
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

pub(crate) fn term_in(unit: PeriodUnit, term_length: u32, rent: Decimal) -> LeaseTerm {
    LeaseTerm {
        period: Some(unit),
        ..monthly_term(term_length, rent)
    }
}

pub(crate) fn concession(id: &str) -> Concession {
    Concession {
        id: ConcessionId(id.to_string()),
        display_name: String::new(),
        recurring: false,
        recurring_count: 0,
        variable_adjustment: false,
        relative_adjustment: Decimal::ZERO,
        absolute_adjustment: Decimal::ZERO,
        amount_variable_adjustment: None,
        floor_ceiling_amount: None,
        adjustment_floor_ceiling: None,
        placement: Placement::First,
        selected: true,
        optional: false,
        exclude_from_rent_flag: false,
        baked_into_applied_fee_flag: false,
    }
}

pub(crate) fn relative(id: &str, percentage: Decimal) -> Concession {
    Concession {
        relative_adjustment: percentage,
        ..concession(id)
    }
}

pub(crate) fn absolute(id: &str, amount: Decimal) -> Concession {
    Concession {
        absolute_adjustment: amount,
        ..concession(id)
    }
}

pub(crate) fn variable(id: &str, amount: Decimal) -> Concession {
    Concession {
        variable_adjustment: true,
        amount_variable_adjustment: Some(amount),
        ..concession(id)
    }
}

pub(crate) fn fee(id: &str, price: Decimal) -> Fee {
    Fee {
        id: FeeId(id.to_string()),
        display_name: id.to_string(),
        quote_section_name: QuoteSection::Service,
        price,
        amount: Some(price),
        quantity: 1,
        relative_price: None,
        absolute_price: Some(price),
        price_floor_ceiling: None,
        variable_adjustment: false,
        relative_default_price: None,
        absolute_default_price: None,
        parent_fee_amount: None,
        selected: true,
        in_payment_schedule: true,
        relative_amounts_by_lease_term: Vec::new(),
        concessions: Vec::new(),
        children: Vec::new(),
    }
}

pub(crate) fn amounts(periods: &[super::domain::PaymentPeriod]) -> Vec<Decimal> {
    periods.iter().map(|period| period.amount).collect()
}
