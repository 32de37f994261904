//! Quote pricing: rent matrix lookups, billing periods, concessions, fees and the
//! aggregated payment schedule.
//!
//! Every entry point is a pure function of its arguments. Inputs are borrowed and
//! outputs are freshly built, so the same call can be repeated for previews and
//! persistence and will agree byte for byte.

pub mod concessions;
pub mod domain;
mod error;
pub mod fees;
#[cfg(test)]
mod fixtures;
pub mod matrix;
pub mod periods;
pub mod schedule;

pub use concessions::{
    apply_monthly_concessions, apply_period_concessions, concession_value,
    concessions_on_move_in, total_concessions, CarryOver, ValuedConcession,
};
pub use domain::{
    AdjustmentKind, AppliedConcession, Concession, ConcessionId, Fee, FeeId, FloorCeiling,
    LeaseTerm, LeaseTermId, PaymentPeriod, PeriodUnit, Placement, PricingConfig,
    ProrationStrategy, QuoteSection, RelativeAmountByLeaseTerm,
};
pub use error::PricingError;
pub use fees::{DepositAmount, FeeAmounts, TermDeposit};
pub use matrix::{MatrixRange, RangeMatch, RentMatrix, RentTable};
pub use periods::{BillableDays, BillingPeriodGenerator};
pub use schedule::{QuoteAggregator, ScheduleEntry, SelectedConcession, TermSelection};
