//! Calendar arithmetic used by the pricing engine.
//!
//! Dates are plain calendar days; the property timezone is only consulted when an
//! instant has to be pinned to a local day or when hourly periods are laid out.

use crate::quote::PricingError;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    match date.month() {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(date.year()) => 29,
        _ => 28,
    }
}

pub fn is_first_day_of_month(date: NaiveDate) -> bool {
    date.day() == 1
}

/// True only for February 28th of a non-leap year.
pub fn is_last_day_of_non_leap_february(date: NaiveDate) -> bool {
    date.month() == 2 && date.day() == 28 && !is_leap_year(date.year())
}

/// Adds calendar months, clamping to the end of shorter months.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, PricingError> {
    date.checked_add_months(Months::new(months))
        .ok_or(PricingError::DateOutOfRange { date })
}

pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, PricingError> {
    date.checked_add_signed(Duration::days(days))
        .ok_or(PricingError::DateOutOfRange { date })
}

pub fn iso_key(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parses `YYYY-MM-DD`, tolerating a trailing time component such as `2019-05-02T00:00:00Z`.
pub fn parse_iso(raw: &str) -> Result<NaiveDate, PricingError> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, ISO_DATE_FORMAT).map_err(|_| PricingError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Calendar day of `instant` at the property.
pub fn local_date(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    instant.with_timezone(&timezone).date_naive()
}

/// Local midnight of `date` at the property, shifted forward when midnight falls in a DST gap.
pub fn local_midnight(date: NaiveDate, timezone: Tz) -> Result<DateTime<Tz>, PricingError> {
    let naive = date.and_hms_opt(0, 0, 0).ok_or(PricingError::DateOutOfRange { date })?;
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let shifted = naive + Duration::hours(1);
            timezone.from_local_datetime(&shifted).earliest()
        })
        .ok_or(PricingError::DateOutOfRange { date })
}

/// `Aug 2016`
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// `Aug 01, 2016`
pub fn day_label(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

/// `Sep 15 2016, 12:00 am`
pub fn hour_label(at: DateTime<Tz>) -> String {
    at.format("%b %d %Y, %-I:%M %P").to_string()
}
