//! Match-event aggregation and derived metrics for water polo: grouped
//! counts, success and save rates, shot-location density maps and player
//! percentile radars over an append-only event log.

#[macro_use]
mod macros;

pub mod aggregate;
pub mod config;
pub mod csv_io;
pub mod density;
pub mod error;
pub mod event;
pub mod fake_match;
pub mod metrics;
pub mod passes;
pub mod persist;
pub mod radar;
pub mod records;
pub mod report_export;
pub mod store;

pub use error::{StatsError, StatsResult};
