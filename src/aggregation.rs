use std::collections::BTreeSet;
use std::fmt;

use polars::prelude::*;

use crate::config::{CoverageConfig, SummaryConfig};
use crate::dataset::OwnerOrgTypes;
use crate::error::SummaryError;
use crate::filters::{self, SummaryType};
use crate::fiscal::fiscal_year_label;
use crate::formatting::{self, ColumnRole, OutputColumn, Precision};
use crate::schema::{output, spending};
use crate::vendors::IncludedVendors;

/// Row counter for ungrouped aggregations, dropped before output.
const ROWS: &str = "_rows";

/// Entity column a summary can be grouped or filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Vendor,
    OwnerOrg,
    Category,
    ItSubcategory,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Vendor,
        Dimension::OwnerOrg,
        Dimension::Category,
        Dimension::ItSubcategory,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Vendor => spending::VENDOR,
            Dimension::OwnerOrg => spending::OWNER_ORG,
            Dimension::Category => spending::CATEGORY,
            Dimension::ItSubcategory => spending::IT_SUBCATEGORY,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Vendor => "vendor",
            Dimension::OwnerOrg => "owner_org",
            Dimension::Category => "category",
            Dimension::ItSubcategory => "it_subcategory",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output shape of an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// `total`, `total_constant_dollars` per group, ordered by key.
    Totals,
    /// `total` per group, largest first.
    Ranking,
    /// `total` and its share of the result set, largest first.
    Distribution,
    /// Number of contributing spending rows and its share, largest first.
    Counts,
}

impl Measure {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "totals" => Some(Measure::Totals),
            "ranking" => Some(Measure::Ranking),
            "distribution" => Some(Measure::Distribution),
            "counts" => Some(Measure::Counts),
            _ => None,
        }
    }

    fn columns(&self) -> Vec<OutputColumn> {
        match self {
            Measure::Totals => vec![
                OutputColumn::new(output::TOTAL, ColumnRole::Monetary),
                OutputColumn::new(output::TOTAL_CONSTANT_DOLLARS, ColumnRole::Monetary),
            ],
            Measure::Ranking => vec![OutputColumn::new(output::TOTAL, ColumnRole::Monetary)],
            Measure::Distribution => vec![
                OutputColumn::new(output::TOTAL, ColumnRole::Monetary),
                OutputColumn::new(output::PERCENTAGE, ColumnRole::Percentage),
            ],
            Measure::Counts => vec![
                OutputColumn::new(output::COUNT, ColumnRole::Count),
                OutputColumn::new(output::COUNT_PERCENTAGE, ColumnRole::Percentage),
            ],
        }
    }

    fn aggregations(&self) -> Vec<Expr> {
        match self {
            Measure::Totals => vec![
                col(spending::DAILY_VALUE).sum().alias(output::TOTAL),
                col(spending::DAILY_VALUE_CONSTANT)
                    .sum()
                    .alias(output::TOTAL_CONSTANT_DOLLARS),
            ],
            Measure::Ranking | Measure::Distribution => {
                vec![col(spending::DAILY_VALUE).sum().alias(output::TOTAL)]
            }
            Measure::Counts => vec![len().cast(DataType::Int64).alias(output::COUNT)],
        }
    }

    /// Column the result is ranked by, if any.
    fn rank_column(&self) -> Option<&'static str> {
        match self {
            Measure::Totals => None,
            Measure::Ranking | Measure::Distribution => Some(output::TOTAL),
            Measure::Counts => Some(output::COUNT),
        }
    }
}

/// Declarative aggregation specification.
///
/// Every summary export is one of these plus a file name.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSpec {
    pub summary_type: SummaryType,
    /// Zero to two grouping dimensions, in output order.
    pub dimensions: Vec<Dimension>,
    /// Scope to a single entity instance.
    pub entity: Option<(Dimension, String)>,
    pub include_fiscal_year: bool,
    pub included_vendors_only: bool,
    pub measure: Measure,
}

impl AggregationSpec {
    pub fn new(summary_type: SummaryType) -> Self {
        Self {
            summary_type,
            dimensions: Vec::new(),
            entity: None,
            include_fiscal_year: false,
            included_vendors_only: false,
            measure: Measure::Totals,
        }
    }

    pub fn by(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn for_entity(mut self, dimension: Dimension, value: impl Into<String>) -> Self {
        self.entity = Some((dimension, value.into()));
        self
    }

    pub fn per_fiscal_year(mut self) -> Self {
        self.include_fiscal_year = true;
        self
    }

    pub fn included_vendors_only(mut self) -> Self {
        self.included_vendors_only = true;
        self
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    fn validate(&self) -> Result<(), SummaryError> {
        if self.dimensions.len() > 2 {
            return Err(SummaryError::InvalidData(format!(
                "at most two grouping dimensions are supported, got {}",
                self.dimensions.len()
            )));
        }
        if self.dimensions.len() == 2 && self.dimensions[0] == self.dimensions[1] {
            return Err(SummaryError::InvalidData(format!(
                "grouping dimension {} given twice",
                self.dimensions[0]
            )));
        }
        Ok(())
    }

    /// Output schema: grouping keys, fiscal year label, then measure columns.
    pub fn output_columns(&self) -> Vec<OutputColumn> {
        let mut columns: Vec<OutputColumn> = self
            .dimensions
            .iter()
            .map(|d| OutputColumn::new(d.column(), ColumnRole::Label))
            .collect();
        if self.include_fiscal_year {
            columns.push(OutputColumn::new(output::FISCAL_YEAR, ColumnRole::Label));
        }
        columns.extend(self.measure.columns());
        columns
    }
}

/// Aggregated, rounded result with its column roles.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub frame: DataFrame,
    pub columns: Vec<OutputColumn>,
}

impl SummaryTable {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Frame ready for CSV: monetary columns rendered with fixed decimals.
    pub fn to_export_frame(&self, precision: &Precision) -> Result<DataFrame, SummaryError> {
        let mut df = self.frame.clone();
        formatting::render_monetary(&mut df, &self.columns, precision)?;
        Ok(df)
    }
}

/// Aggregation engine over one in-memory spending table.
///
/// Holds the cohort reference and the included-vendor set, which is built
/// once in [`SummaryEngine::new`].
pub struct SummaryEngine {
    spending: DataFrame,
    owner_orgs: OwnerOrgTypes,
    coverage: CoverageConfig,
    precision: Precision,
    included_vendors: IncludedVendors,
}

impl SummaryEngine {
    pub fn new(
        spending: DataFrame,
        owner_orgs: OwnerOrgTypes,
        config: &SummaryConfig,
    ) -> Result<Self, SummaryError> {
        let included_vendors = IncludedVendors::build(&spending, &config.coverage, &config.vendors)?;
        Ok(Self {
            spending,
            owner_orgs,
            coverage: config.coverage.clone(),
            precision: config.precision.clone(),
            included_vendors,
        })
    }

    pub fn included_vendors(&self) -> &IncludedVendors {
        &self.included_vendors
    }

    pub fn coverage(&self) -> &CoverageConfig {
        &self.coverage
    }

    pub fn precision(&self) -> &Precision {
        &self.precision
    }

    /// Spending rows inside the coverage window and the cohort.
    fn scoped(&self, summary_type: SummaryType) -> LazyFrame {
        let lf = filters::by_coverage(self.spending.clone().lazy(), &self.coverage);
        filters::by_summary_type(lf, &self.owner_orgs, summary_type)
    }

    /// Distinct non-null values of `dimension` within the cohort, sorted.
    pub fn entities(
        &self,
        summary_type: SummaryType,
        dimension: Dimension,
        included_vendors_only: bool,
    ) -> Result<Vec<String>, SummaryError> {
        let mut lf = self.scoped(summary_type);
        if included_vendors_only {
            lf = filters::by_vendor_set(lf, self.included_vendors.names());
        }
        let df = lf.select([col(dimension.column())]).collect()?;
        let values: BTreeSet<String> = df
            .column(dimension.column())?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        Ok(values.into_iter().collect())
    }

    /// Run one aggregation: filter, group, summarize, order, round.
    pub fn aggregate(&self, spec: &AggregationSpec) -> Result<SummaryTable, SummaryError> {
        spec.validate()?;

        let mut lf = self.scoped(spec.summary_type);
        if let Some((dimension, value)) = &spec.entity {
            lf = lf.filter(col(dimension.column()).eq(lit(value.as_str())));
        }
        if spec.included_vendors_only {
            lf = filters::by_vendor_set(lf, self.included_vendors.names());
        }
        // Rows without a value for a grouping dimension are left out of that
        // breakdown rather than published under a blank key.
        for dimension in &spec.dimensions {
            lf = lf.filter(col(dimension.column()).is_not_null());
        }

        let mut keys: Vec<Expr> = spec.dimensions.iter().map(|d| col(d.column())).collect();
        if spec.include_fiscal_year {
            keys.push(col(spending::FISCAL_YEAR_SHORT));
        }

        let aggregations = spec.measure.aggregations();
        lf = if keys.is_empty() {
            let mut exprs = aggregations;
            exprs.push(len().alias(ROWS));
            lf.select(exprs).filter(col(ROWS).gt(lit(0)))
        } else {
            lf.group_by(keys.clone()).agg(aggregations)
        };

        lf = with_shares(lf, spec);
        lf = sorted(lf, spec);

        let measure_cols = spec.measure.columns();
        let mut selection = keys;
        selection.extend(measure_cols.iter().map(|c| col(c.name.as_str())));
        let mut df = lf.select(selection).collect()?;

        if spec.include_fiscal_year {
            label_fiscal_years(&mut df)?;
        }

        let columns = spec.output_columns();
        formatting::round_columns(&mut df, &columns, &self.precision)?;

        tracing::debug!(
            summary_type = %spec.summary_type,
            dimensions = ?spec.dimensions,
            entity = ?spec.entity,
            rows = df.height(),
            "aggregated"
        );

        Ok(SummaryTable { frame: df, columns })
    }
}

/// Add share-of-total columns. Shares are scoped to the result set, and to
/// each fiscal year when the result is per fiscal year. A scope whose total
/// is zero gets a share of zero for every row.
fn with_shares(lf: LazyFrame, spec: &AggregationSpec) -> LazyFrame {
    let share = |column: &str, alias: &str| -> Expr {
        let value = col(column).cast(DataType::Float64);
        let whole = col(column).cast(DataType::Float64).sum();
        let whole = if spec.include_fiscal_year {
            whole.over([col(spending::FISCAL_YEAR_SHORT)])
        } else {
            whole
        };
        when(whole.clone().eq(lit(0.0)))
            .then(lit(0.0))
            .otherwise(value / whole)
            .alias(alias)
    };
    match spec.measure {
        Measure::Distribution => lf.with_columns([share(output::TOTAL, output::PERCENTAGE)]),
        Measure::Counts => lf.with_columns([share(output::COUNT, output::COUNT_PERCENTAGE)]),
        Measure::Totals | Measure::Ranking => lf,
    }
}

/// Deterministic ordering: fiscal year first when present, then the rank
/// column descending (ranking measures), then grouping keys ascending.
fn sorted(lf: LazyFrame, spec: &AggregationSpec) -> LazyFrame {
    let mut by: Vec<Expr> = Vec::new();
    let mut descending: Vec<bool> = Vec::new();

    let rank = spec.measure.rank_column();
    if spec.include_fiscal_year && rank.is_some() {
        by.push(col(spending::FISCAL_YEAR_SHORT));
        descending.push(false);
    }
    if let Some(rank) = rank {
        by.push(col(rank));
        descending.push(true);
    }
    for dimension in &spec.dimensions {
        by.push(col(dimension.column()));
        descending.push(false);
    }
    if spec.include_fiscal_year && rank.is_none() {
        by.push(col(spending::FISCAL_YEAR_SHORT));
        descending.push(false);
    }

    if by.is_empty() {
        return lf;
    }
    lf.sort_by_exprs(
        by,
        SortMultipleOptions::default()
            .with_order_descending_multi(descending)
            .with_maintain_order(true),
    )
}

/// Replace the numeric fiscal-year short code with its display label.
fn label_fiscal_years(df: &mut DataFrame) -> Result<(), SummaryError> {
    let labels: StringChunked = df
        .column(spending::FISCAL_YEAR_SHORT)?
        .i64()?
        .into_iter()
        .map(|v| v.map(fiscal_year_label))
        .collect();
    df.with_column(labels.with_name(spending::FISCAL_YEAR_SHORT.into()).into_series())?;
    df.rename(spending::FISCAL_YEAR_SHORT, output::FISCAL_YEAR.into())?;
    Ok(())
}
