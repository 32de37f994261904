use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use lease_quote::calendar::local_date;
use lease_quote::error::AppError;
use lease_quote::quote::matrix::RentMatrix;
use lease_quote::quote::{Fee, LeaseTerm, LeaseTermId, PricingConfig};
use serde::Deserialize;
use tracing::info;

/// Quote inputs as exchanged with the leasing front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) start_date: Option<NaiveDate>,
    /// Empty means every term is priced.
    #[serde(default)]
    pub(crate) selected_term_ids: Vec<LeaseTermId>,
    pub(crate) terms: Vec<LeaseTerm>,
    #[serde(default)]
    pub(crate) fees: Vec<Fee>,
    #[serde(default)]
    pub(crate) rent_matrix: Option<RentMatrix>,
    #[serde(default)]
    pub(crate) reset_overwritten_base_rent: bool,
}

pub(crate) fn load_request(path: &Path) -> Result<QuoteRequest, AppError> {
    let reader = BufReader::new(File::open(path)?);
    let request: QuoteRequest = serde_json::from_reader(reader)?;
    info!(
        terms = request.terms.len(),
        fees = request.fees.len(),
        matrix = request.rent_matrix.is_some(),
        "quote request loaded"
    );
    Ok(request)
}

/// Current date at the property, which may differ from the host's local date.
pub(crate) fn property_today(config: PricingConfig) -> NaiveDate {
    date_at_property(Utc::now(), config)
}

fn date_at_property(now: DateTime<Utc>, config: PricingConfig) -> NaiveDate {
    local_date(now, config.timezone)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
