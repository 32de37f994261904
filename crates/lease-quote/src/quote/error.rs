use super::domain::LeaseTermId;
use chrono::NaiveDate;

/// Precondition violations that abort a pricing invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("missing rent matrix")]
    MissingRentMatrix,
    #[error("lease term {term_id} has no adjusted market rent")]
    MissingMarketRent { term_id: LeaseTermId },
    #[error("lease term {term_id} has no period unit")]
    MissingPeriodUnit { term_id: LeaseTermId },
    #[error("{step} did not produce a number")]
    NotANumber { step: &'static str },
    #[error("date arithmetic left the supported range at {date}")]
    DateOutOfRange { date: NaiveDate },
    #[error("'{value}' is not a YYYY-MM-DD date")]
    InvalidDate { value: String },
}
