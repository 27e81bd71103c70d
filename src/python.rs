use std::path::PathBuf;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::aggregation::{AggregationSpec, Dimension, Measure, SummaryEngine};
use crate::config::SummaryConfig;
use crate::filters::SummaryType;
use crate::pipeline;
use crate::schema;

/// Python handle on a loaded aggregation engine.
#[pyclass(name = "SummaryEngine")]
pub struct PySummaryEngine {
    engine: SummaryEngine,
}

fn dimension(name: &str) -> PyResult<Dimension> {
    Dimension::from_name(name).ok_or_else(|| {
        PyValueError::new_err(format!(
            "Invalid dimension: '{}'. Must be 'vendor', 'owner_org', 'category' or 'it_subcategory'",
            name
        ))
    })
}

#[pymethods]
impl PySummaryEngine {
    #[new]
    #[pyo3(signature = (spending_csv, owner_orgs_csv, config_path=None))]
    fn new(
        spending_csv: PathBuf,
        owner_orgs_csv: PathBuf,
        config_path: Option<PathBuf>,
    ) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => SummaryConfig::load(&path)?,
            None => SummaryConfig::default(),
        };
        config.paths.spending = spending_csv;
        config.paths.owner_orgs = owner_orgs_csv;
        let engine = pipeline::load_engine(&config)?;
        Ok(Self { engine })
    }

    /// Run one aggregation and return it as a rounded Polars DataFrame.
    ///
    /// `entity` is a `(dimension, value)` pair scoping the result to one
    /// vendor, owner org, category or IT subcategory.
    #[pyo3(signature = (
        summary_type = "all",
        by = None,
        entity = None,
        include_fiscal_year = false,
        included_vendors_only = false,
        measure = "totals",
    ))]
    fn aggregate(
        &self,
        summary_type: &str,
        by: Option<Vec<String>>,
        entity: Option<(String, String)>,
        include_fiscal_year: bool,
        included_vendors_only: bool,
        measure: &str,
    ) -> PyResult<PyDataFrame> {
        let measure = Measure::from_name(measure).ok_or_else(|| {
            PyValueError::new_err(format!(
                "Invalid measure: '{}'. Must be 'totals', 'ranking', 'distribution' or 'counts'",
                measure
            ))
        })?;

        let mut spec = AggregationSpec::new(SummaryType::from_tag(summary_type)).measure(measure);
        for name in by.unwrap_or_default() {
            spec = spec.by(dimension(&name)?);
        }
        if let Some((name, value)) = entity {
            spec = spec.for_entity(dimension(&name)?, value);
        }
        if include_fiscal_year {
            spec = spec.per_fiscal_year();
        }
        if included_vendors_only {
            spec = spec.included_vendors_only();
        }

        let table = self.engine.aggregate(&spec)?;
        Ok(PyDataFrame(table.frame))
    }

    /// Names in the included vendor set, sorted.
    fn included_vendors(&self) -> Vec<String> {
        self.engine.included_vendors().names().cloned().collect()
    }
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let spending = PyModule::new(m.py(), "spending")?;
    spending.add("OWNER_ORG", schema::spending::OWNER_ORG)?;
    spending.add("VENDOR", schema::spending::VENDOR)?;
    spending.add("CATEGORY", schema::spending::CATEGORY)?;
    spending.add("IT_SUBCATEGORY", schema::spending::IT_SUBCATEGORY)?;
    spending.add("FISCAL_YEAR_SHORT", schema::spending::FISCAL_YEAR_SHORT)?;
    spending.add("DAILY_VALUE", schema::spending::DAILY_VALUE)?;
    spending.add("DAILY_VALUE_CONSTANT", schema::spending::DAILY_VALUE_CONSTANT)?;
    m.add_submodule(&spending)?;

    let output = PyModule::new(m.py(), "output")?;
    output.add("FISCAL_YEAR", schema::output::FISCAL_YEAR)?;
    output.add("TOTAL", schema::output::TOTAL)?;
    output.add("TOTAL_CONSTANT_DOLLARS", schema::output::TOTAL_CONSTANT_DOLLARS)?;
    output.add("PERCENTAGE", schema::output::PERCENTAGE)?;
    output.add("COUNT", schema::output::COUNT)?;
    output.add("COUNT_PERCENTAGE", schema::output::COUNT_PERCENTAGE)?;
    m.add_submodule(&output)?;

    let summary_type = PyModule::new(m.py(), "summary_type")?;
    summary_type.add("CORE", schema::summary_type::CORE)?;
    summary_type.add("DND", schema::summary_type::DND)?;
    summary_type.add("ALL", schema::summary_type::ALL)?;
    m.add_submodule(&summary_type)?;

    Ok(())
}

#[pymodule]
#[pyo3(name = "contract_summaries")]
fn python_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySummaryEngine>()?;
    add_schema_exports(m)?;
    Ok(())
}
