use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::{MatrixRange, RentMatrix, RentTable};
use crate::calendar::parse_iso;
use crate::quote::PricingError;

#[derive(Debug)]
pub enum MatrixImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
    Table(PricingError),
    Overlap {
        term_length: u32,
        start: String,
        previous_end: String,
    },
}

impl std::fmt::Display for MatrixImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixImportError::Io(err) => write!(f, "failed to read rent matrix export: {}", err),
            MatrixImportError::Csv(err) => write!(f, "invalid rent matrix CSV data: {}", err),
            MatrixImportError::InvalidRow { line, reason } => {
                write!(f, "rent matrix row {} is invalid: {}", line, reason)
            }
            MatrixImportError::Table(err) => write!(f, "rent matrix table is invalid: {}", err),
            MatrixImportError::Overlap {
                term_length,
                start,
                previous_end,
            } => write!(
                f,
                "{}-month interval starting {} overlaps the interval ending {}",
                term_length, start, previous_end
            ),
        }
    }
}

impl std::error::Error for MatrixImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MatrixImportError::Io(err) => Some(err),
            MatrixImportError::Csv(err) => Some(err),
            MatrixImportError::Table(err) => Some(err),
            MatrixImportError::InvalidRow { .. } | MatrixImportError::Overlap { .. } => None,
        }
    }
}

impl From<std::io::Error> for MatrixImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<PricingError> for MatrixImportError {
    fn from(err: PricingError) -> Self {
        Self::Table(err)
    }
}

impl From<csv::Error> for MatrixImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads rent matrix snapshots exported as `term_length,start_date,end_date,price` CSV.
pub struct RentMatrixImporter;

impl RentMatrixImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RentMatrix, MatrixImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RentMatrix, MatrixImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows: BTreeMap<u32, Vec<(String, MatrixRange)>> = BTreeMap::new();
        let mut imported = 0usize;

        let headers = csv_reader.headers()?.clone();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());
            let row: MatrixRow = record.deserialize(Some(&headers))?;
            let (term_length, start, range) = row.into_range(line)?;
            rows.entry(term_length).or_default().push((start, range));
            imported += 1;
        }

        let mut matrix = RentMatrix::default();
        for (term_length, ranges) in rows {
            let table = RentTable::from_ranges(ranges)?;
            check_contiguous(term_length, &table)?;
            matrix.insert(term_length, table);
        }

        info!(
            rows = imported,
            terms = matrix.term_lengths().count(),
            "rent matrix imported"
        );
        Ok(matrix)
    }
}

fn check_contiguous(term_length: u32, table: &RentTable) -> Result<(), MatrixImportError> {
    let mut previous_end: Option<&str> = None;
    for (start, range) in table.iter() {
        if let Some(previous_end) = previous_end {
            if start <= previous_end {
                return Err(MatrixImportError::Overlap {
                    term_length,
                    start: start.to_string(),
                    previous_end: previous_end.to_string(),
                });
            }
        }
        previous_end = Some(range.end_date.as_str());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    term_length: u32,
    start_date: String,
    end_date: String,
    price: String,
    #[serde(default)]
    original_base_rent: Option<String>,
}

impl MatrixRow {
    fn into_range(self, line: u64) -> Result<(u32, String, MatrixRange), MatrixImportError> {
        let invalid = |reason: String| MatrixImportError::InvalidRow { line, reason };

        let start = parse_iso(&self.start_date).map_err(|err| invalid(err.to_string()))?;
        let end = parse_iso(&self.end_date).map_err(|err| invalid(err.to_string()))?;
        if end < start {
            return Err(invalid(format!(
                "end date {} precedes start date {}",
                self.end_date, self.start_date
            )));
        }

        let price = parse_amount(&self.price).map_err(invalid)?;
        let original_base_rent = self
            .original_base_rent
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_amount)
            .transpose()
            .map_err(invalid)?;

        let mut range = MatrixRange::new(end, price);
        range.original_base_rent = original_base_rent;
        Ok((self.term_length, self.start_date, range))
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    Decimal::from_str(&cleaned).map_err(|err| format!("'{raw}' is not an amount ({err})"))
}
