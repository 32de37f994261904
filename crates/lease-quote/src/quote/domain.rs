use std::fmt;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidate lease terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeaseTermId(pub String);

/// Identifier wrapper for concessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConcessionId(pub String);

/// Identifier wrapper for additional and one-time fees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeeId(pub String);

macro_rules! display_id {
    ($($id:ty),*) => {
        $(impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })*
    };
}

display_id!(LeaseTermId, ConcessionId, FeeId);

/// Unit a lease term is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodUnit {
    Month,
    Week,
    Day,
    Hour,
}

impl PeriodUnit {
    pub const fn label(self) -> &'static str {
        match self {
            PeriodUnit::Month => "month",
            PeriodUnit::Week => "week",
            PeriodUnit::Day => "day",
            PeriodUnit::Hour => "hour",
        }
    }
}

/// Policy for billing partial months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProrationStrategy {
    /// Every month counts as 30 days.
    #[default]
    ThirtyDayMonth,
    /// Months count their actual number of days.
    CalendarMonth,
}

impl ProrationStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            ProrationStrategy::ThirtyDayMonth => "30 day month",
            ProrationStrategy::CalendarMonth => "Calendar month",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "30 day month" | "thirty day month" | "30 day" => Some(Self::ThirtyDayMonth),
            "calendar month" | "calendar" => Some(Self::CalendarMonth),
            _ => None,
        }
    }
}

impl TryFrom<String> for ProrationStrategy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown proration strategy '{value}'"))
    }
}

impl From<ProrationStrategy> for String {
    fn from(value: ProrationStrategy) -> Self {
        value.label().to_string()
    }
}

/// Where a concession starts consuming periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Placement {
    #[default]
    First,
    Last,
    FirstFull,
}

impl Placement {
    pub const fn label(self) -> &'static str {
        match self {
            Placement::First => "first",
            Placement::Last => "last",
            Placement::FirstFull => "firstFull",
        }
    }
}

impl From<String> for Placement {
    fn from(value: String) -> Self {
        match value.trim() {
            "last" | "Last" => Placement::Last,
            "firstFull" | "first_full" | "FirstFull" => Placement::FirstFull,
            _ => Placement::First,
        }
    }
}

impl From<Placement> for String {
    fn from(value: Placement) -> Self {
        value.label().to_string()
    }
}

/// How a concession expresses its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Relative,
    Absolute,
    Variable,
}

/// Bound applied when a price mixes an absolute and a relative component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorCeiling {
    Floor,
    Ceiling,
}

/// Quote section a fee is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuoteSection {
    Application,
    Deposit,
    Appliance,
    Parking,
    Pet,
    Storage,
    Utility,
    Service,
    Inventory,
    Penalty,
    #[default]
    Other,
}

impl QuoteSection {
    pub const fn label(self) -> &'static str {
        match self {
            QuoteSection::Application => "application",
            QuoteSection::Deposit => "deposit",
            QuoteSection::Appliance => "appliance",
            QuoteSection::Parking => "parking",
            QuoteSection::Pet => "pet",
            QuoteSection::Storage => "storage",
            QuoteSection::Utility => "utility",
            QuoteSection::Service => "service",
            QuoteSection::Inventory => "inventory",
            QuoteSection::Penalty => "penalty",
            QuoteSection::Other => "other",
        }
    }

    /// Application and deposit charges are collected once rather than per period.
    pub const fn is_one_time(self) -> bool {
        matches!(self, QuoteSection::Application | QuoteSection::Deposit)
    }
}

impl From<String> for QuoteSection {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "application" => QuoteSection::Application,
            "deposit" => QuoteSection::Deposit,
            "appliance" => QuoteSection::Appliance,
            "parking" => QuoteSection::Parking,
            "pet" => QuoteSection::Pet,
            "storage" => QuoteSection::Storage,
            "utility" => QuoteSection::Utility,
            "service" => QuoteSection::Service,
            "inventory" => QuoteSection::Inventory,
            "penalty" => QuoteSection::Penalty,
            _ => QuoteSection::Other,
        }
    }
}

impl From<QuoteSection> for String {
    fn from(value: QuoteSection) -> Self {
        value.label().to_string()
    }
}

/// Negotiated discount attached to a lease term or a fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concession {
    pub id: ConcessionId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub recurring: bool,
    /// Number of periods a recurring concession covers; zero means the whole term.
    #[serde(default)]
    pub recurring_count: u32,
    #[serde(default)]
    pub variable_adjustment: bool,
    #[serde(default)]
    pub relative_adjustment: Decimal,
    #[serde(default)]
    pub absolute_adjustment: Decimal,
    #[serde(default)]
    pub amount_variable_adjustment: Option<Decimal>,
    #[serde(default)]
    pub floor_ceiling_amount: Option<Decimal>,
    #[serde(default)]
    pub adjustment_floor_ceiling: Option<FloorCeiling>,
    #[serde(default, alias = "nonRecurringAppliedAt")]
    pub placement: Placement,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub exclude_from_rent_flag: bool,
    #[serde(default)]
    pub baked_into_applied_fee_flag: bool,
}

impl Concession {
    pub fn kind(&self) -> AdjustmentKind {
        if self.variable_adjustment {
            AdjustmentKind::Variable
        } else if !self.absolute_adjustment.is_zero() {
            AdjustmentKind::Absolute
        } else {
            AdjustmentKind::Relative
        }
    }

    /// One-time concessions neither recur nor carry a period count.
    pub fn is_one_time(&self) -> bool {
        !self.recurring && self.recurring_count == 0
    }

    /// Agent-chosen amount, zero until one is entered.
    pub fn variable_amount(&self) -> Decimal {
        self.amount_variable_adjustment.unwrap_or_default()
    }

    /// Whether the concession takes part in payment-schedule allocation.
    pub fn applies_to_schedule(&self) -> bool {
        self.selected && !self.exclude_from_rent_flag && !self.baked_into_applied_fee_flag
    }

    /// Number of periods the concession owns before its leftovers start spilling.
    pub fn monthly_limit(&self, term_length: u32) -> u32 {
        if self.is_one_time() {
            1
        } else if self.recurring_count == 0 {
            term_length
        } else {
            self.recurring_count
        }
    }
}

/// Candidate lease duration with its market rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTerm {
    pub id: LeaseTermId,
    pub term_length: u32,
    #[serde(default)]
    pub period: Option<PeriodUnit>,
    #[serde(default)]
    pub adjusted_market_rent: Option<Decimal>,
    #[serde(default)]
    pub overwritten_base_rent: Option<Decimal>,
    #[serde(default)]
    pub original_base_rent: Option<Decimal>,
    #[serde(default)]
    pub allow_base_rent_adjustment: Option<bool>,
    #[serde(default)]
    pub min_baked_fees_adjustment: Option<Decimal>,
    #[serde(default)]
    pub max_baked_fees_adjustment: Option<Decimal>,
    #[serde(default)]
    pub relative_adjustment: Decimal,
    #[serde(default)]
    pub absolute_adjustment: Decimal,
    #[serde(default)]
    pub reset_overwritten_base_rent: bool,
    #[serde(default)]
    pub concessions: Vec<Concession>,
}

impl LeaseTerm {
    /// A term with no rent, adjustments or concessions yet.
    pub fn new(id: LeaseTermId, term_length: u32, period: PeriodUnit) -> Self {
        Self {
            id,
            term_length,
            period: Some(period),
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

    /// Rent the schedule is built from: a nonzero agent override, else the market rent.
    pub fn base_rent(&self) -> Option<Decimal> {
        self.overwritten_base_rent
            .filter(|rent| !rent.is_zero())
            .or(self.adjusted_market_rent)
    }
}

/// Per-term amount of a fee priced relative to base rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeAmountByLeaseTerm {
    pub lease_term_id: LeaseTermId,
    pub amount: Decimal,
    pub max_amount: Decimal,
    #[serde(default)]
    pub selected: bool,
}

/// Additional or one-time charge offered alongside the rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub id: FeeId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub quote_section_name: QuoteSection,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub relative_price: Option<Decimal>,
    #[serde(default)]
    pub absolute_price: Option<Decimal>,
    #[serde(default)]
    pub price_floor_ceiling: Option<FloorCeiling>,
    #[serde(default)]
    pub variable_adjustment: bool,
    #[serde(default)]
    pub relative_default_price: Option<Decimal>,
    #[serde(default)]
    pub absolute_default_price: Option<Decimal>,
    #[serde(default)]
    pub parent_fee_amount: Option<Decimal>,
    #[serde(default)]
    pub selected: bool,
    /// Recurring fee folded into each payment-schedule period.
    #[serde(default, rename = "quotePaymentScheduleFlag")]
    pub in_payment_schedule: bool,
    #[serde(default)]
    pub relative_amounts_by_lease_term: Vec<RelativeAmountByLeaseTerm>,
    #[serde(default)]
    pub concessions: Vec<Concession>,
    #[serde(default)]
    pub children: Vec<FeeId>,
}

fn default_quantity() -> u32 {
    1
}

/// Amount attributed to one concession within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedConcession {
    pub concession_id: ConcessionId,
    pub amount: Decimal,
}

/// One billing period of a payment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPeriod {
    pub timeframe: String,
    /// Non-monthly periods always bill one full unit.
    pub billable_days: u32,
    pub days_in_month: u32,
    pub amount: Decimal,
    /// Carry in flight while a concession walks the schedule; zero once allocation completes.
    pub pending_concession_amount: Decimal,
    pub remaining_concession_amount: Decimal,
    pub saved_amount: Decimal,
    pub applied_concessions: Vec<AppliedConcession>,
}

impl PaymentPeriod {
    pub fn new(timeframe: String, billable_days: u32, days_in_month: u32, amount: Decimal) -> Self {
        Self {
            timeframe,
            billable_days,
            days_in_month,
            amount,
            pending_concession_amount: Decimal::ZERO,
            remaining_concession_amount: Decimal::ZERO,
            saved_amount: Decimal::ZERO,
            applied_concessions: Vec::new(),
        }
    }

    pub fn is_full_month(&self) -> bool {
        self.billable_days == self.days_in_month
    }

    /// Records a discount taken from this period, merging repeat contributions per concession.
    pub(crate) fn record_discount(&mut self, concession_id: &ConcessionId, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.saved_amount += amount;
        match self
            .applied_concessions
            .iter_mut()
            .find(|applied| &applied.concession_id == concession_id)
        {
            Some(applied) => applied.amount += amount,
            None => self.applied_concessions.push(AppliedConcession {
                concession_id: concession_id.clone(),
                amount,
            }),
        }
    }
}

/// Property-level settings every pricing call receives explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    pub timezone: Tz,
    pub proration: ProrationStrategy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            proration: ProrationStrategy::ThirtyDayMonth,
        }
    }
}
