use std::fmt;

use polars::prelude::*;

use crate::config::CoverageConfig;
use crate::dataset::OwnerOrgTypes;
use crate::schema::{spending, summary_type};

/// Named cohort of owning organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryType {
    Core,
    Dnd,
    All,
}

impl SummaryType {
    pub const EVERY: [SummaryType; 3] = [SummaryType::Core, SummaryType::Dnd, SummaryType::All];

    /// Resolve a tag. Unrecognized tags fall back to `All`, i.e. every org
    /// known to the reference table; this is never an error.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            summary_type::CORE => SummaryType::Core,
            summary_type::DND => SummaryType::Dnd,
            summary_type::ALL => SummaryType::All,
            other => {
                tracing::warn!(
                    summary_type = other,
                    "unrecognized summary type, using all known owner orgs"
                );
                SummaryType::All
            }
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            SummaryType::Core => summary_type::CORE,
            SummaryType::Dnd => summary_type::DND,
            SummaryType::All => summary_type::ALL,
        }
    }
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Keep rows whose owner org is in the cohort.
///
/// Orgs missing from the reference table are dropped under every summary
/// type, including `All`.
pub fn by_summary_type(lf: LazyFrame, orgs: &OwnerOrgTypes, summary_type: SummaryType) -> LazyFrame {
    let codes = Series::new(spending::OWNER_ORG.into(), orgs.cohort(summary_type));
    lf.filter(col(spending::OWNER_ORG).is_in(lit(codes).implode(), false))
}

/// Keep rows whose vendor is in `vendors`.
pub fn by_vendor_set<'a>(lf: LazyFrame, vendors: impl IntoIterator<Item = &'a String>) -> LazyFrame {
    let names: Vec<&str> = vendors.into_iter().map(String::as_str).collect();
    let names = Series::new(spending::VENDOR.into(), names);
    lf.filter(col(spending::VENDOR).is_in(lit(names).implode(), false))
}

/// Keep rows whose fiscal year lies in `[start, end]`.
pub fn by_fiscal_years(lf: LazyFrame, start: i64, end: i64) -> LazyFrame {
    lf.filter(
        col(spending::FISCAL_YEAR_SHORT)
            .gt_eq(lit(start))
            .and(col(spending::FISCAL_YEAR_SHORT).lt_eq(lit(end))),
    )
}

/// Keep rows inside the configured coverage window.
pub fn by_coverage(lf: LazyFrame, coverage: &CoverageConfig) -> LazyFrame {
    by_fiscal_years(lf, coverage.start_fiscal_year, coverage.end_fiscal_year)
}
