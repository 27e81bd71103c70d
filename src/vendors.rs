use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;

use crate::config::{CoverageConfig, VendorConfig};
use crate::error::SummaryError;
use crate::filters;
use crate::schema::{output, spending};

/// Vendors large enough to get their own breakdown exports.
///
/// A vendor qualifies when its average annual value reaches the threshold
/// either over the whole coverage window or over the most recent
/// `recent_years` fiscal years. Built once per run from the unfiltered
/// spending table.
#[derive(Debug, Clone, Default)]
pub struct IncludedVendors {
    /// Vendor name -> total value over the coverage window.
    totals: BTreeMap<String, f64>,
    coverage_years: i64,
}

impl IncludedVendors {
    pub fn build(
        spending: &DataFrame,
        coverage: &CoverageConfig,
        vendors: &VendorConfig,
    ) -> Result<Self, SummaryError> {
        let coverage_years = coverage.years();
        let window = vendor_totals(filters::by_coverage(spending.clone().lazy(), coverage))?;

        // The recent pass never reaches before the coverage window.
        let recent_start =
            (coverage.end_fiscal_year - vendors.recent_years + 1).max(coverage.start_fiscal_year);
        let recent_years = coverage.end_fiscal_year - recent_start + 1;
        let recent = vendor_totals(filters::by_fiscal_years(
            spending.clone().lazy(),
            recent_start,
            coverage.end_fiscal_year,
        ))?;

        let mut included: BTreeSet<&String> = window
            .iter()
            .filter(|(_, total)| meets_threshold(**total, vendors.annual_threshold, coverage_years))
            .map(|(name, _)| name)
            .collect();
        let long_term = included.len();
        included.extend(
            recent
                .iter()
                .filter(|(_, total)| {
                    meets_threshold(**total, vendors.annual_threshold, recent_years)
                })
                .map(|(name, _)| name),
        );

        let totals: BTreeMap<String, f64> = included
            .into_iter()
            .map(|name| (name.clone(), window.get(name).copied().unwrap_or(0.0)))
            .collect();

        tracing::info!(
            included = totals.len(),
            long_term,
            emerging = totals.len() - long_term,
            threshold = vendors.annual_threshold,
            "built included vendor set"
        );

        Ok(Self {
            totals,
            coverage_years,
        })
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Included vendor names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.totals.keys()
    }

    /// Coverage-window total for an included vendor.
    pub fn window_total(&self, vendor: &str) -> Option<f64> {
        self.totals.get(vendor).copied()
    }

    pub fn coverage_years(&self) -> i64 {
        self.coverage_years
    }
}

/// Average over `years` at or above the per-year threshold, inclusive.
fn meets_threshold(total: f64, annual_threshold: f64, years: i64) -> bool {
    total >= annual_threshold * years as f64
}

fn vendor_totals(lf: LazyFrame) -> Result<BTreeMap<String, f64>, SummaryError> {
    let df = lf
        .group_by([col(spending::VENDOR)])
        .agg([col(spending::DAILY_VALUE).sum().alias(output::TOTAL)])
        .collect()?;

    let names = df.column(spending::VENDOR)?.str()?;
    let totals = df.column(output::TOTAL)?.f64()?;

    let mut map = BTreeMap::new();
    for (name, total) in names.into_iter().zip(totals.into_iter()) {
        if let Some(name) = name {
            map.insert(name.to_string(), total.unwrap_or(0.0));
        }
    }
    Ok(map)
}
