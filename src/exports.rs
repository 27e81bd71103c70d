//! Export catalogue.
//!
//! Every published CSV is a [`Breakdown`]: a file name plus the parameters of
//! one [`AggregationSpec`]. Entity exports apply each breakdown to every
//! instance of an entity dimension; the overall exports apply theirs to each
//! summary type; meta tables describe the run itself.

use std::fmt;

use polars::prelude::*;

use crate::aggregation::{AggregationSpec, Dimension, Measure, SummaryEngine, SummaryTable};
use crate::error::SummaryError;
use crate::filters::SummaryType;
use crate::formatting::{self, fancy_number, ColumnRole, OutputColumn};
use crate::schema::{meta, output};

use Dimension::{Category, ItSubcategory, OwnerOrg, Vendor};
use Measure::{Counts, Distribution, Ranking};

/// Top-level output folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCategory {
    Vendors,
    Departments,
    Categories,
    ItSubcategories,
    Overall,
    Meta,
}

impl OutputCategory {
    pub fn dir_name(&self) -> &'static str {
        match self {
            OutputCategory::Vendors => "vendors",
            OutputCategory::Departments => "departments",
            OutputCategory::Categories => "categories",
            OutputCategory::ItSubcategories => "it_subcategories",
            OutputCategory::Overall => "overall",
            OutputCategory::Meta => "meta",
        }
    }

    /// Roots that the gated cleanup is allowed to remove.
    pub const CLEANABLE: [OutputCategory; 4] = [
        OutputCategory::Vendors,
        OutputCategory::Departments,
        OutputCategory::Categories,
        OutputCategory::Overall,
    ];
}

impl fmt::Display for OutputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.dir_name())
    }
}

/// One CSV file: name plus aggregation parameters.
#[derive(Debug, Clone, Copy)]
pub struct Breakdown {
    pub file_name: &'static str,
    pub dimensions: &'static [Dimension],
    pub per_fiscal_year: bool,
    pub included_vendors_only: bool,
    pub measure: Measure,
}

impl Breakdown {
    const fn new(file_name: &'static str, dimensions: &'static [Dimension], measure: Measure) -> Self {
        Self {
            file_name,
            dimensions,
            per_fiscal_year: false,
            included_vendors_only: false,
            measure,
        }
    }

    const fn yearly(file_name: &'static str, dimensions: &'static [Dimension]) -> Self {
        Self {
            file_name,
            dimensions,
            per_fiscal_year: true,
            included_vendors_only: false,
            measure: Measure::Totals,
        }
    }

    const fn vendors_only(mut self) -> Self {
        self.included_vendors_only = true;
        self
    }

    pub fn spec(&self, summary_type: SummaryType, entity: Option<(Dimension, &str)>) -> AggregationSpec {
        let mut spec = AggregationSpec::new(summary_type).measure(self.measure);
        for dimension in self.dimensions {
            spec = spec.by(*dimension);
        }
        if let Some((dimension, value)) = entity {
            spec = spec.for_entity(dimension, value);
        }
        if self.per_fiscal_year {
            spec = spec.per_fiscal_year();
        }
        if self.included_vendors_only {
            spec = spec.included_vendors_only();
        }
        spec
    }
}

/// Per-entity export: one folder per instance of `dimension`.
#[derive(Debug, Clone, Copy)]
pub struct EntityExport {
    pub category: OutputCategory,
    pub dimension: Dimension,
    /// Restrict the entity list itself to the included vendor set.
    pub included_vendors_only: bool,
    pub breakdowns: &'static [Breakdown],
}

const VENDOR_BREAKDOWNS: &[Breakdown] = &[
    Breakdown::yearly("summary_by_fiscal_year", &[]),
    Breakdown::yearly("summary_by_fiscal_year_by_department", &[OwnerOrg]),
    Breakdown::yearly("summary_by_fiscal_year_by_category", &[Category]),
    Breakdown::new("summary_by_category", &[Category], Distribution),
    Breakdown::new("summary_by_department", &[OwnerOrg], Distribution),
];

const DEPARTMENT_BREAKDOWNS: &[Breakdown] = &[
    Breakdown::yearly("summary_by_fiscal_year", &[]),
    Breakdown::yearly("summary_by_fiscal_year_by_category", &[Category]),
    Breakdown::yearly("summary_by_fiscal_year_by_vendor", &[Vendor]).vendors_only(),
    Breakdown::new("summary_by_category", &[Category], Distribution),
    Breakdown::new("summary_by_it_subcategory", &[ItSubcategory], Distribution),
    Breakdown::new("summary_by_vendor", &[Vendor], Ranking).vendors_only(),
];

const CATEGORY_BREAKDOWNS: &[Breakdown] = &[
    Breakdown::yearly("summary_by_fiscal_year", &[]),
    Breakdown::yearly("summary_by_fiscal_year_by_department", &[OwnerOrg]),
    Breakdown::new("summary_by_department", &[OwnerOrg], Distribution),
    Breakdown::new("summary_by_vendor", &[Vendor], Ranking).vendors_only(),
];

const IT_SUBCATEGORY_BREAKDOWNS: &[Breakdown] = &[
    Breakdown::yearly("summary_by_fiscal_year", &[]),
    Breakdown::new("summary_by_department", &[OwnerOrg], Distribution),
    Breakdown::new("summary_by_vendor", &[Vendor], Ranking).vendors_only(),
];

pub const ENTITY_EXPORTS: &[EntityExport] = &[
    EntityExport {
        category: OutputCategory::Vendors,
        dimension: Vendor,
        included_vendors_only: true,
        breakdowns: VENDOR_BREAKDOWNS,
    },
    EntityExport {
        category: OutputCategory::Departments,
        dimension: OwnerOrg,
        included_vendors_only: false,
        breakdowns: DEPARTMENT_BREAKDOWNS,
    },
    EntityExport {
        category: OutputCategory::Categories,
        dimension: Category,
        included_vendors_only: false,
        breakdowns: CATEGORY_BREAKDOWNS,
    },
    EntityExport {
        category: OutputCategory::ItSubcategories,
        dimension: ItSubcategory,
        included_vendors_only: false,
        breakdowns: IT_SUBCATEGORY_BREAKDOWNS,
    },
];

/// Breakdowns written once per summary type under `overall/<summary_type>/`.
pub const OVERALL_BREAKDOWNS: &[Breakdown] = &[
    Breakdown::yearly("summary_by_fiscal_year", &[]),
    Breakdown::new("summary_by_category", &[Category], Distribution),
    Breakdown::yearly("summary_by_fiscal_year_by_category", &[Category]),
    Breakdown::new("summary_by_department", &[OwnerOrg], Distribution),
    Breakdown::new("summary_by_it_subcategory", &[ItSubcategory], Distribution),
    Breakdown::new("summary_by_vendor", &[Vendor], Ranking).vendors_only(),
    Breakdown::new("record_counts_by_category", &[Category], Counts),
];

/// Entity folder name used for meta tables.
pub const META_ENTITY: &str = "general";

/// All breakdown tables for one entity.
#[derive(Debug, Clone)]
pub struct EntityResults {
    pub entity: String,
    pub tables: Vec<(&'static str, SummaryTable)>,
}

impl EntityExport {
    pub fn entities(&self, engine: &SummaryEngine, summary_type: SummaryType) -> Result<Vec<String>, SummaryError> {
        engine.entities(summary_type, self.dimension, self.included_vendors_only)
    }

    pub fn build(
        &self,
        engine: &SummaryEngine,
        summary_type: SummaryType,
        entity: &str,
    ) -> Result<EntityResults, SummaryError> {
        let tables = self
            .breakdowns
            .iter()
            .map(|b| {
                let spec = b.spec(summary_type, Some((self.dimension, entity)));
                Ok((b.file_name, engine.aggregate(&spec)?))
            })
            .collect::<Result<Vec<_>, SummaryError>>()?;
        Ok(EntityResults {
            entity: entity.to_string(),
            tables,
        })
    }
}

/// Overall breakdowns for one summary type; the entity is the type's tag.
pub fn overall_results(engine: &SummaryEngine, summary_type: SummaryType) -> Result<EntityResults, SummaryError> {
    let tables = OVERALL_BREAKDOWNS
        .iter()
        .map(|b| Ok((b.file_name, engine.aggregate(&b.spec(summary_type, None))?)))
        .collect::<Result<Vec<_>, SummaryError>>()?;
    Ok(EntityResults {
        entity: summary_type.tag().to_string(),
        tables,
    })
}

/// Meta tables: included vendors, coverage window, and headline totals.
pub fn meta_results(engine: &SummaryEngine) -> Result<EntityResults, SummaryError> {
    Ok(EntityResults {
        entity: META_ENTITY.to_string(),
        tables: vec![
            ("included_vendors", included_vendors_table(engine)?),
            ("summary_coverage", coverage_table(engine)?),
            ("summary_overview", overview_table(engine)?),
        ],
    })
}

fn finish(mut frame: DataFrame, columns: Vec<OutputColumn>, engine: &SummaryEngine) -> Result<SummaryTable, SummaryError> {
    formatting::round_columns(&mut frame, &columns, engine.precision())?;
    Ok(SummaryTable { frame, columns })
}

fn included_vendors_table(engine: &SummaryEngine) -> Result<SummaryTable, SummaryError> {
    let vendors = engine.included_vendors();
    let years = vendors.coverage_years() as f64;
    let names: Vec<&str> = vendors.names().map(String::as_str).collect();
    let totals: Vec<f64> = names
        .iter()
        .map(|name| vendors.window_total(name).unwrap_or(0.0))
        .collect();
    let means: Vec<f64> = totals.iter().map(|total| total / years).collect();

    let frame = DataFrame::new(vec![
        Column::new(meta::VENDOR.into(), names),
        Column::new(output::TOTAL.into(), totals),
        Column::new(meta::MEAN_ANNUAL_TOTAL.into(), means),
    ])?;
    let columns = vec![
        OutputColumn::new(meta::VENDOR, ColumnRole::Label),
        OutputColumn::new(output::TOTAL, ColumnRole::Monetary),
        OutputColumn::new(meta::MEAN_ANNUAL_TOTAL, ColumnRole::Mean),
    ];
    finish(frame, columns, engine)
}

fn coverage_table(engine: &SummaryEngine) -> Result<SummaryTable, SummaryError> {
    let coverage = engine.coverage();
    let frame = DataFrame::new(vec![
        Column::new(meta::START_FISCAL_YEAR.into(), [coverage.start_fiscal_year]),
        Column::new(meta::END_FISCAL_YEAR.into(), [coverage.end_fiscal_year]),
        Column::new(meta::COVERAGE_YEARS.into(), [coverage.years() as f64]),
    ])?;
    let columns = vec![
        OutputColumn::new(meta::START_FISCAL_YEAR, ColumnRole::Label),
        OutputColumn::new(meta::END_FISCAL_YEAR, ColumnRole::Label),
        OutputColumn::new(meta::COVERAGE_YEARS, ColumnRole::Years),
    ];
    finish(frame, columns, engine)
}

fn overview_table(engine: &SummaryEngine) -> Result<SummaryTable, SummaryError> {
    let accuracy = engine.precision().fancy_accuracy;
    let mut tags = Vec::new();
    let mut totals = Vec::new();
    for summary_type in SummaryType::EVERY {
        let table = engine.aggregate(&AggregationSpec::new(summary_type))?;
        let total = table
            .frame
            .column(output::TOTAL)?
            .f64()?
            .get(0)
            .unwrap_or(0.0);
        tags.push(summary_type.tag());
        totals.push(total);
    }
    let display: Vec<String> = totals.iter().map(|t| fancy_number(*t, accuracy)).collect();

    let frame = DataFrame::new(vec![
        Column::new(meta::SUMMARY_TYPE.into(), tags),
        Column::new(output::TOTAL.into(), totals),
        Column::new(meta::TOTAL_DISPLAY.into(), display),
    ])?;
    let columns = vec![
        OutputColumn::new(meta::SUMMARY_TYPE, ColumnRole::Label),
        OutputColumn::new(output::TOTAL, ColumnRole::Monetary),
        OutputColumn::new(meta::TOTAL_DISPLAY, ColumnRole::Label),
    ];
    finish(frame, columns, engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CoverageConfig, SummaryConfig};
    use crate::dataset::{OwnerOrg, OwnerOrgTypes};
    use crate::schema::spending;

    fn engine() -> SummaryEngine {
        let df = DataFrame::new(vec![
            Column::new(spending::OWNER_ORG.into(), &["X", "X", "D"]),
            Column::new(spending::VENDOR.into(), &["Big Co.", "Small", "Big Co."]),
            Column::new(spending::CATEGORY.into(), &["P", "Q", "P"]),
            Column::new(spending::IT_SUBCATEGORY.into(), &[Some("software"), None, None]),
            Column::new(spending::FISCAL_YEAR_SHORT.into(), &[2021i64, 2021, 2022]),
            Column::new(spending::DAILY_VALUE.into(), &[3_000_000.0, 10.0, 1_000_000.0]),
            Column::new(spending::DAILY_VALUE_CONSTANT.into(), &[2_000_000.0, 5.0, 900_000.0]),
        ])
        .unwrap();
        let orgs = OwnerOrgTypes::new(vec![
            OwnerOrg { code: "X".into(), is_core: true, is_dnd: false },
            OwnerOrg { code: "D".into(), is_core: false, is_dnd: true },
        ]);
        let mut config = SummaryConfig::default();
        config.coverage = CoverageConfig { start_fiscal_year: 2021, end_fiscal_year: 2022 };
        SummaryEngine::new(df, orgs, &config).unwrap()
    }

    #[test]
    fn breakdowns_expand_to_specs() {
        let spec = Breakdown::yearly("x", &[Category])
            .vendors_only()
            .spec(SummaryType::Core, Some((Vendor, "Big Co.")));
        assert_eq!(spec.summary_type, SummaryType::Core);
        assert_eq!(spec.dimensions, vec![Category]);
        assert_eq!(spec.entity, Some((Vendor, "Big Co.".to_string())));
        assert!(spec.include_fiscal_year);
        assert!(spec.included_vendors_only);
        assert_eq!(spec.measure, Measure::Totals);
    }

    #[test]
    fn file_names_are_unique_per_export() {
        let mut groups: Vec<&[Breakdown]> = ENTITY_EXPORTS.iter().map(|e| e.breakdowns).collect();
        groups.push(OVERALL_BREAKDOWNS);
        for breakdowns in groups {
            let mut names: Vec<&str> = breakdowns.iter().map(|b| b.file_name).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), breakdowns.len());
        }
    }

    #[test]
    fn vendor_exports_cover_included_vendors_only() {
        let engine = engine();
        let export = &ENTITY_EXPORTS[0];
        assert_eq!(export.category, OutputCategory::Vendors);
        assert_eq!(export.entities(&engine, SummaryType::All).unwrap(), vec!["Big Co."]);

        let results = export.build(&engine, SummaryType::All, "Big Co.").unwrap();
        assert_eq!(results.tables.len(), export.breakdowns.len());
        let (name, by_year) = &results.tables[0];
        assert_eq!(*name, "summary_by_fiscal_year");
        assert_eq!(by_year.height(), 2);
    }

    #[test]
    fn overall_uses_summary_type_as_entity() {
        let engine = engine();
        let results = overall_results(&engine, SummaryType::Dnd).unwrap();
        assert_eq!(results.entity, "dnd");
        let (_, by_year) = &results.tables[0];
        assert_eq!(by_year.height(), 1);
    }

    #[test]
    fn meta_tables_describe_the_run() {
        let engine = engine();
        let results = meta_results(&engine).unwrap();
        assert_eq!(results.entity, META_ENTITY);

        let (_, vendors) = &results.tables[0];
        let means: Vec<Option<f64>> = vendors
            .frame
            .column(meta::MEAN_ANNUAL_TOTAL)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(means, vec![Some(2_000_000.0)]);

        let (_, coverage) = &results.tables[1];
        let years = coverage.frame.column(meta::COVERAGE_YEARS).unwrap().f64().unwrap().get(0);
        assert_eq!(years, Some(2.0));

        let (_, overview) = &results.tables[2];
        let display: Vec<Option<&str>> = overview
            .frame
            .column(meta::TOTAL_DISPLAY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(display, vec![Some("3.0M"), Some("1.0M"), Some("4.0M")]);
    }
}
