//! Summary exports over Government of Canada proactive-disclosure contract
//! spending: totals by vendor, department, category and IT subcategory, per
//! fiscal year and overall, written as per-entity CSV folders.

pub mod aggregation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod exports;
pub mod filters;
pub mod fiscal;
pub mod formatting;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod vendors;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{AggregationSpec, Dimension, Measure, SummaryEngine, SummaryTable};
pub use config::SummaryConfig;
pub use error::SummaryError;
pub use filters::SummaryType;
pub use pipeline::RunReport;
