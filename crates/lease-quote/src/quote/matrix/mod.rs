//! Date-indexed rent tables and the lookups the quote flow runs against them.

mod import;
#[cfg(test)]
mod tests;

pub use import::{MatrixImportError, RentMatrixImporter};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{LeaseTerm, LeaseTermId};
use super::error::PricingError;
use crate::calendar::{iso_key, parse_iso};

/// Price of one move-in interval `[start key, end_date]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRange {
    pub end_date: String,
    #[serde(alias = "rent", alias = "adjustedMarketRent")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwritten_base_rent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_base_rent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_base_rent_adjustment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_baked_fees_adjustment: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_baked_fees_adjustment: Option<Decimal>,
}

impl MatrixRange {
    pub fn new(end_date: NaiveDate, price: Decimal) -> Self {
        Self {
            end_date: iso_key(end_date),
            price,
            overwritten_base_rent: None,
            original_base_rent: None,
            allow_base_rent_adjustment: None,
            min_baked_fees_adjustment: None,
            max_baked_fees_adjustment: None,
        }
    }
}

/// Outcome of a table lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMatch<'a> {
    pub range: &'a MatrixRange,
    /// Interval start when the date was found, else the synthetic closest date.
    pub matched_key: &'a str,
    pub index: usize,
}

/// Cheapest neighbouring interval around a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacentPrice {
    pub rent: Decimal,
    pub end_date: String,
}

/// Rent table for a single lease-term length, keyed by normalized ISO start dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, MatrixRange>",
    into = "BTreeMap<String, MatrixRange>"
)]
pub struct RentTable {
    keys: Vec<String>,
    ranges: Vec<MatrixRange>,
}

impl RentTable {
    /// Builds a table from `(start, range)` pairs, normalizing every date and sorting by start.
    pub fn from_ranges<I>(entries: I) -> Result<Self, PricingError>
    where
        I: IntoIterator<Item = (String, MatrixRange)>,
    {
        let mut normalized = entries
            .into_iter()
            .map(|(start, mut range)| {
                let start = iso_key(parse_iso(&start)?);
                range.end_date = iso_key(parse_iso(&range.end_date)?);
                Ok((start, range))
            })
            .collect::<Result<Vec<_>, PricingError>>()?;
        normalized.sort_by(|left, right| left.0.cmp(&right.0));

        let (keys, ranges) = normalized.into_iter().unzip();
        Ok(Self { keys, ranges })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MatrixRange)> {
        self.keys.iter().map(String::as_str).zip(self.ranges.iter())
    }

    /// Finds the interval containing `date`.
    ///
    /// With `allow_closest`, dates before the first interval resolve to the first one and any
    /// other miss resolves to the last one, stamped with its end date.
    pub fn resolve(&self, date: NaiveDate, allow_closest: bool) -> Option<RangeMatch<'_>> {
        self.resolve_key(&iso_key(date), allow_closest)
    }

    fn resolve_key(&self, key: &str, allow_closest: bool) -> Option<RangeMatch<'_>> {
        let first = self.keys.first()?;
        if key < first.as_str() {
            return allow_closest.then(|| RangeMatch {
                range: &self.ranges[0],
                matched_key: first,
                index: 0,
            });
        }

        let index = self.keys.partition_point(|start| start.as_str() <= key) - 1;
        if key <= self.ranges[index].end_date.as_str() {
            return Some(RangeMatch {
                range: &self.ranges[index],
                matched_key: &self.keys[index],
                index,
            });
        }

        if !allow_closest {
            return None;
        }
        let last = self.ranges.len() - 1;
        debug!(date = key, "no rent interval contains date; using last interval");
        Some(RangeMatch {
            range: &self.ranges[last],
            matched_key: &self.ranges[last].end_date,
            index: last,
        })
    }

    /// Compares the interval containing `date` with its immediate neighbours and returns the
    /// cheapest. The previous interval is ignored once it ended before `boundary`.
    pub fn lowest_adjacent(
        &self,
        date: NaiveDate,
        boundary: Option<NaiveDate>,
    ) -> Option<AdjacentPrice> {
        let key = iso_key(date);
        let found = self.resolve_key(&key, false)?;
        let index = found.index;
        let selected = found.range.price;

        let previous = index
            .checked_sub(1)
            .map(|prev| &self.ranges[prev])
            .filter(|prev| match boundary {
                Some(boundary) => iso_key(boundary).as_str() <= prev.end_date.as_str(),
                None => true,
            });
        let next = self.ranges.get(index + 1);

        let previous_price = previous.map(|range| range.price);
        let next_price = next.map(|range| range.price);

        if let Some(prev) = previous {
            if prev.price < selected && next_price.map_or(true, |next| prev.price < next) {
                return Some(AdjacentPrice {
                    rent: prev.price,
                    end_date: prev.end_date.clone(),
                });
            }
        }
        if let Some(next) = next {
            if next.price < selected && previous_price.map_or(true, |prev| next.price < prev) {
                return Some(AdjacentPrice {
                    rent: next.price,
                    end_date: self.keys[index + 1].clone(),
                });
            }
        }

        Some(AdjacentPrice {
            rent: selected,
            end_date: key,
        })
    }

    /// Intervals from the one containing `start` (or the first, when none does) whose start
    /// is not after `end`.
    pub fn overlapping(&self, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, &MatrixRange)> {
        let start_key = iso_key(start);
        let end_key = iso_key(end);
        let from = self
            .resolve_key(&start_key, false)
            .map_or(0, |found| found.index);

        self.iter()
            .skip(from)
            .take_while(|(key, _)| *key <= end_key.as_str())
            .filter_map(|(key, range)| parse_iso(key).ok().map(|date| (date, range)))
            .collect()
    }

    pub fn last_end_date(&self) -> Option<NaiveDate> {
        self.ranges
            .last()
            .and_then(|range| parse_iso(&range.end_date).ok())
    }
}

impl TryFrom<BTreeMap<String, MatrixRange>> for RentTable {
    type Error = PricingError;

    fn try_from(value: BTreeMap<String, MatrixRange>) -> Result<Self, Self::Error> {
        Self::from_ranges(value)
    }
}

impl From<RentTable> for BTreeMap<String, MatrixRange> {
    fn from(value: RentTable) -> Self {
        value.keys.into_iter().zip(value.ranges).collect()
    }
}

/// Rent tables for every lease-term length offered on a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RentMatrix {
    tables: BTreeMap<u32, RentTable>,
}

impl RentMatrix {
    pub fn new(tables: BTreeMap<u32, RentTable>) -> Self {
        Self { tables }
    }

    pub fn table(&self, term_length: u32) -> Option<&RentTable> {
        self.tables.get(&term_length).filter(|table| !table.is_empty())
    }

    pub fn insert(&mut self, term_length: u32, table: RentTable) {
        self.tables.insert(term_length, table);
    }

    pub fn term_lengths(&self) -> impl Iterator<Item = u32> + '_ {
        self.tables.keys().copied()
    }
}

/// Preferred move-in window supplied by the prospect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInRange {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

/// Cheapest move-in found across lease-term lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheapestStart {
    pub term_id: LeaseTermId,
    pub term_length: u32,
    pub start_date: NaiveDate,
    pub price: Decimal,
}

/// Copies the interval matching `start` onto the term, or clears its matrix-derived fields
/// when no interval matches.
pub fn refresh_term_rent(
    term: &LeaseTerm,
    start: NaiveDate,
    matrix: &RentMatrix,
    reset_overwritten: bool,
) -> LeaseTerm {
    let mut refreshed = term.clone();
    let found = matrix
        .table(term.term_length)
        .and_then(|table| table.resolve(start, false));

    let Some(found) = found else {
        refreshed.adjusted_market_rent = None;
        refreshed.overwritten_base_rent = None;
        refreshed.original_base_rent = None;
        refreshed.allow_base_rent_adjustment = None;
        refreshed.min_baked_fees_adjustment = None;
        refreshed.max_baked_fees_adjustment = None;
        return refreshed;
    };

    let range = found.range;
    let reset = term.reset_overwritten_base_rent || reset_overwritten;
    if reset {
        refreshed.adjusted_market_rent = range.original_base_rent;
        refreshed.overwritten_base_rent = range.original_base_rent;
    } else {
        refreshed.adjusted_market_rent = Some(range.price);
        refreshed.overwritten_base_rent = term
            .overwritten_base_rent
            .filter(|rent| !rent.is_zero())
            .or(range.overwritten_base_rent);
    }
    refreshed.original_base_rent = range.original_base_rent;
    refreshed.allow_base_rent_adjustment = range.allow_base_rent_adjustment;
    refreshed.min_baked_fees_adjustment = range.min_baked_fees_adjustment;
    refreshed.max_baked_fees_adjustment = range.max_baked_fees_adjustment;
    refreshed
}

/// Refreshes every term; terms pass through untouched without a start date or matrix.
pub fn refresh_terms(
    terms: &[LeaseTerm],
    start: Option<NaiveDate>,
    matrix: Option<&RentMatrix>,
    reset_overwritten: bool,
) -> Vec<LeaseTerm> {
    match (start, matrix) {
        (Some(start), Some(matrix)) => terms
            .iter()
            .map(|term| refresh_term_rent(term, start, matrix, reset_overwritten))
            .collect(),
        _ => terms.to_vec(),
    }
}

/// Whether a quote may start on `start`: not in the past, inside an unexpired preferred
/// window, and priced by at least one term.
pub fn is_valid_start_date(
    matrix: Option<&RentMatrix>,
    terms: &[LeaseTerm],
    start: NaiveDate,
    today: NaiveDate,
    preference: Option<&MoveInRange>,
) -> bool {
    let Some(matrix) = matrix else {
        return true;
    };
    if start < today {
        return false;
    }

    if let Some(preference) = preference {
        let min = preference.min.unwrap_or(today);
        if let Some(max) = preference.max {
            if max < today && !(min <= start && start <= max) {
                return false;
            }
        }
    }

    terms.iter().any(|term| {
        matrix
            .table(term.term_length)
            .and_then(|table| table.resolve(start, false))
            .is_some()
    })
}

/// Latest interval end across the terms' tables, never earlier than `end`.
pub fn highest_end_date(
    terms: &[LeaseTerm],
    matrix: Option<&RentMatrix>,
    end: NaiveDate,
) -> Result<NaiveDate, PricingError> {
    let matrix = matrix.ok_or(PricingError::MissingRentMatrix)?;
    Ok(terms
        .iter()
        .filter_map(|term| matrix.table(term.term_length))
        .filter_map(RentTable::last_end_date)
        .fold(end, NaiveDate::max))
}

/// Cheapest interval overlapping `[start, end]` across all terms, preferring intervals that
/// start within the preferred window.
pub fn cheapest_across_terms(
    terms: &[LeaseTerm],
    matrix: &RentMatrix,
    start: NaiveDate,
    end: NaiveDate,
    preferred_end: Option<NaiveDate>,
) -> Option<CheapestStart> {
    let in_preferred =
        |date: NaiveDate| start <= date && preferred_end.map_or(true, |max| date <= max);

    let mut cheapest: Option<CheapestStart> = None;
    for term in terms {
        let Some(table) = matrix.table(term.term_length) else {
            continue;
        };
        let overlapping = table.overlapping(start, end);

        let candidate = overlapping
            .iter()
            .filter(|(date, _)| in_preferred(*date))
            .min_by(|left, right| left.1.price.cmp(&right.1.price))
            .or_else(|| {
                overlapping
                    .iter()
                    .min_by(|left, right| left.1.price.cmp(&right.1.price))
            });

        let Some((date, range)) = candidate else {
            continue;
        };
        if cheapest
            .as_ref()
            .map_or(true, |current| range.price < current.price)
        {
            cheapest = Some(CheapestStart {
                term_id: term.id.clone(),
                term_length: term.term_length,
                start_date: *date,
                price: range.price,
            });
        }
    }
    cheapest
}

/// Searches from the preferred window start (or today) up to the matrix horizon and moves a
/// result that lies in the past to today.
pub fn lowest_price_start_date(
    matrix: Option<&RentMatrix>,
    terms: &[LeaseTerm],
    preference: &MoveInRange,
    today: NaiveDate,
    start_from_today: bool,
) -> Result<Option<CheapestStart>, PricingError> {
    if terms.is_empty() {
        return Ok(None);
    }

    let mut start = preference.min.unwrap_or(today);
    if start_from_today && start < today {
        start = today;
    }
    let end = highest_end_date(terms, matrix, start)?;
    let matrix = matrix.ok_or(PricingError::MissingRentMatrix)?;

    Ok(
        cheapest_across_terms(terms, matrix, start, end, preference.max).map(|mut found| {
            if found.start_date < today {
                found.start_date = today;
            }
            found
        }),
    )
}
