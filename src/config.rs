use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SummaryError;
use crate::fiscal;
use crate::formatting::Precision;

/// Full run configuration, threaded explicitly through every entry point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    pub paths: PathsConfig,
    pub run: RunConfig,
    pub coverage: CoverageConfig,
    pub vendors: VendorConfig,
    pub precision: Precision,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub spending: PathBuf,
    pub owner_orgs: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            spending: PathBuf::from("data/contract_spending_by_date.csv"),
            owner_orgs: PathBuf::from("data/owner_orgs.csv"),
            output: PathBuf::from("data/out"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Gate for every CSV write; false turns the run into a dry run.
    pub update_summary_csv_files: bool,
    /// Gate for removing the vendor/department/category/overall roots first.
    pub remove_existing_summary_folders: bool,
    /// Cohort used for the per-entity exports.
    pub summary_type: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            update_summary_csv_files: true,
            remove_existing_summary_folders: false,
            summary_type: crate::schema::summary_type::ALL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    pub start_fiscal_year: i64,
    pub end_fiscal_year: i64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            start_fiscal_year: 2017,
            end_fiscal_year: fiscal::last_completed_fiscal_year(),
        }
    }
}

impl CoverageConfig {
    /// Number of fiscal years in the window, inclusive on both ends.
    pub fn years(&self) -> i64 {
        self.end_fiscal_year - self.start_fiscal_year + 1
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VendorConfig {
    /// Minimum average annual value for a vendor to get its own exports.
    pub annual_threshold: f64,
    /// Length of the "recent years" window for the second inclusion pass.
    pub recent_years: i64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            annual_threshold: 1_000_000.0,
            recent_years: 3,
        }
    }
}

impl SummaryConfig {
    /// Load a TOML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SummaryError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, SummaryError> {
        let config: SummaryConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SummaryError> {
        if self.coverage.years() < 1 {
            return Err(SummaryError::Config(format!(
                "coverage window is empty: start_fiscal_year {} > end_fiscal_year {}",
                self.coverage.start_fiscal_year, self.coverage.end_fiscal_year
            )));
        }
        if self.vendors.recent_years < 1 {
            return Err(SummaryError::Config(format!(
                "vendors.recent_years must be at least 1, got {}",
                self.vendors.recent_years
            )));
        }
        if !self.vendors.annual_threshold.is_finite() {
            return Err(SummaryError::Config(
                "vendors.annual_threshold must be a finite number".into(),
            ));
        }
        if !(self.precision.fancy_accuracy > 0.0) {
            return Err(SummaryError::Config(
                "precision.fancy_accuracy must be positive".into(),
            ));
        }
        Ok(())
    }
}
