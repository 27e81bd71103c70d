use std::path::Path;

use polars::prelude::*;

use crate::error::SummaryError;
use crate::filters::SummaryType;
use crate::schema::{owner_org_types, spending};

/// One row of the owner-org reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerOrg {
    pub code: String,
    pub is_core: bool,
    pub is_dnd: bool,
}

/// Owner-org reference table: the source of summary-type cohorts.
#[derive(Debug, Clone, Default)]
pub struct OwnerOrgTypes {
    orgs: Vec<OwnerOrg>,
}

impl OwnerOrgTypes {
    pub fn new(orgs: Vec<OwnerOrg>) -> Self {
        Self { orgs }
    }

    pub fn len(&self) -> usize {
        self.orgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orgs.is_empty()
    }

    /// Org codes belonging to the cohort named by `summary_type`.
    pub fn cohort(&self, summary_type: SummaryType) -> Vec<String> {
        let mut codes: Vec<String> = self
            .orgs
            .iter()
            .filter(|org| match summary_type {
                SummaryType::Core => org.is_core,
                SummaryType::Dnd => org.is_dnd,
                SummaryType::All => true,
            })
            .map(|org| org.code.clone())
            .collect();
        codes.sort();
        codes.dedup();
        codes
    }

    /// Build from a reference DataFrame (all columns as strings).
    pub fn from_frame(df: &DataFrame) -> Result<Self, SummaryError> {
        require_columns(df, &owner_org_types::REQUIRED)?;
        let codes = df.column(owner_org_types::OWNER_ORG)?.str()?;
        let core = df.column(owner_org_types::IS_CORE)?.str()?;
        let dnd = df.column(owner_org_types::IS_DND)?.str()?;

        let mut orgs = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(code) = codes.get(i).map(str::trim).filter(|c| !c.is_empty()) else {
                continue;
            };
            orgs.push(OwnerOrg {
                code: code.to_string(),
                is_core: parse_flag(core.get(i)),
                is_dnd: parse_flag(dnd.get(i)),
            });
        }
        Ok(Self { orgs })
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "y" | "t")
    )
}

/// Load the owner-org reference CSV.
pub fn load_owner_orgs(path: &Path) -> Result<OwnerOrgTypes, SummaryError> {
    let raw = read_csv_as_strings(path)?;
    let orgs = OwnerOrgTypes::from_frame(&raw)?;
    tracing::info!(path = %path.display(), orgs = orgs.len(), "loaded owner org reference");
    Ok(orgs)
}

/// Load the daily spending CSV and parse its numeric columns.
pub fn load_spending(path: &Path) -> Result<DataFrame, SummaryError> {
    let raw = read_csv_as_strings(path)?;
    let df = prepare_spending(raw)?;
    tracing::info!(path = %path.display(), rows = df.height(), "loaded spending table");
    Ok(df)
}

/// Validate and normalise a spending table.
///
/// Text columns become String, the fiscal year Int64 and the value columns
/// Float64. Unparseable numbers become nulls.
pub fn prepare_spending(raw: DataFrame) -> Result<DataFrame, SummaryError> {
    require_columns(&raw, &spending::REQUIRED)?;

    let mut exprs: Vec<Expr> = spending::TEXT
        .iter()
        .map(|name| col(*name).cast(DataType::String))
        .collect();
    exprs.push(parse_numeric(
        &raw,
        spending::FISCAL_YEAR_SHORT,
        DataType::Int64,
    )?);
    for name in spending::VALUES {
        exprs.push(parse_numeric(&raw, name, DataType::Float64)?);
    }

    let df = raw.lazy().select(exprs).collect()?;
    Ok(df)
}

fn parse_numeric(df: &DataFrame, column: &str, dtype: DataType) -> Result<Expr, SummaryError> {
    let expr = if df.column(column)?.dtype() == &DataType::String {
        col(column)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(dtype)
    } else {
        col(column).cast(dtype)
    };
    Ok(expr)
}

/// Read a CSV file with all columns as String dtype, trimming column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame, SummaryError> {
    if !path.exists() {
        return Err(SummaryError::NotLoaded(format!(
            "input file {} does not exist",
            path.display()
        )));
    }
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), SummaryError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(SummaryError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}
