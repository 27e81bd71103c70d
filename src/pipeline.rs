use std::fmt;

use crate::aggregation::SummaryEngine;
use crate::config::SummaryConfig;
use crate::dataset;
use crate::error::SummaryError;
use crate::exports::{self, OutputCategory};
use crate::filters::SummaryType;
use crate::output::CsvExporter;

/// Entities and files handled for one output category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: OutputCategory,
    pub entities: usize,
    pub files: usize,
}

/// Outcome of one summary run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub live: bool,
    pub included_vendors: usize,
    pub categories: Vec<CategoryReport>,
}

impl RunReport {
    pub fn total_files(&self) -> usize {
        self.categories.iter().map(|c| c.files).sum()
    }

    pub fn category(&self, category: OutputCategory) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.live { "written" } else { "planned (dry run)" };
        writeln!(f, "included vendors: {}", self.included_vendors)?;
        for c in &self.categories {
            writeln!(f, "{:<17} {:>6} entities {:>7} files", c.category, c.entities, c.files)?;
        }
        write!(f, "{} files {}", self.total_files(), mode)
    }
}

/// Load inputs named by the config and run every export.
pub fn run(config: &SummaryConfig) -> Result<RunReport, SummaryError> {
    let engine = load_engine(config)?;
    run_with_engine(&engine, config)
}

pub fn load_engine(config: &SummaryConfig) -> Result<SummaryEngine, SummaryError> {
    let spending = dataset::load_spending(&config.paths.spending)?;
    let owner_orgs = dataset::load_owner_orgs(&config.paths.owner_orgs)?;
    SummaryEngine::new(spending, owner_orgs, config)
}

/// Run every export against an already-built engine.
pub fn run_with_engine(engine: &SummaryEngine, config: &SummaryConfig) -> Result<RunReport, SummaryError> {
    let exporter = CsvExporter::new(
        &config.paths.output,
        config.run.update_summary_csv_files,
        engine.precision().clone(),
    );
    if !exporter.is_live() {
        tracing::warn!("update_summary_csv_files is off, no files will be written");
    }
    if config.run.remove_existing_summary_folders {
        exporter.remove_existing_summary_folders()?;
    }

    let summary_type = SummaryType::from_tag(&config.run.summary_type);
    let mut categories = Vec::new();

    for export in exports::ENTITY_EXPORTS {
        let entities = export.entities(engine, summary_type)?;
        let mut files = 0;
        for entity in &entities {
            let results = export.build(engine, summary_type, entity)?;
            files += exporter.write_entity(export.category, &results)?;
        }
        tracing::info!(
            category = %export.category,
            entities = entities.len(),
            files,
            "exported entity summaries"
        );
        categories.push(CategoryReport {
            category: export.category,
            entities: entities.len(),
            files,
        });
    }

    let mut files = 0;
    for overall_type in SummaryType::EVERY {
        let results = exports::overall_results(engine, overall_type)?;
        files += exporter.write_entity(OutputCategory::Overall, &results)?;
    }
    tracing::info!(files, "exported overall summaries");
    categories.push(CategoryReport {
        category: OutputCategory::Overall,
        entities: SummaryType::EVERY.len(),
        files,
    });

    let meta = exports::meta_results(engine)?;
    let files = exporter.write_entity(OutputCategory::Meta, &meta)?;
    categories.push(CategoryReport {
        category: OutputCategory::Meta,
        entities: 1,
        files,
    });

    let report = RunReport {
        live: exporter.is_live(),
        included_vendors: engine.included_vendors().len(),
        categories,
    };
    tracing::info!(files = report.total_files(), live = report.live, "summary run complete");
    Ok(report)
}
