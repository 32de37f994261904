//! Pricing and concession engine for leasing quotes.
//!
//! The `quote` module holds the pure computation; `config`, `telemetry` and `error`
//! carry the ambient plumbing shared by the binaries built on top of it.

pub mod calendar;
pub mod config;
pub mod error;
pub mod money;
pub mod quote;
pub mod telemetry;
