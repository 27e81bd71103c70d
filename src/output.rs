use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::error::SummaryError;
use crate::exports::{EntityResults, OutputCategory};
use crate::formatting::Precision;

/// Filesystem-safe folder name: lowercase, runs of anything that is not
/// alphanumeric collapse to a single `-`, no leading or trailing `-`.
///
/// Distinct names may share a slug; their files then land in one folder.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}

/// Writes per-entity breakdown CSVs under `<root>/<category>/<slug>/`.
///
/// With `live == false` nothing touches the filesystem; intended
/// destinations are logged instead.
pub struct CsvExporter {
    root: PathBuf,
    live: bool,
    precision: Precision,
}

impl CsvExporter {
    pub fn new(root: impl Into<PathBuf>, live: bool, precision: Precision) -> Self {
        Self {
            root: root.into(),
            live,
            precision,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn entity_dir(&self, category: OutputCategory, entity: &str) -> PathBuf {
        self.root.join(category.dir_name()).join(slugify(entity))
    }

    /// Write every table of one entity. Returns the number of files handled.
    pub fn write_entity(
        &self,
        category: OutputCategory,
        results: &EntityResults,
    ) -> Result<usize, SummaryError> {
        let dir = self.entity_dir(category, &results.entity);
        if self.live {
            fs::create_dir_all(&dir)?;
        }
        for (file_name, table) in &results.tables {
            let path = dir.join(format!("{file_name}.csv"));
            if !self.live {
                tracing::info!(path = %path.display(), rows = table.height(), "dry run, not writing");
                continue;
            }
            let mut df = table.to_export_frame(&self.precision)?;
            write_csv(&path, &mut df)?;
            tracing::debug!(path = %path.display(), rows = df.height(), "wrote summary csv");
        }
        Ok(results.tables.len())
    }

    /// Remove the vendor, department, category and overall roots.
    ///
    /// Whole folders only; individual files are never deleted. Skipped in
    /// dry-run mode.
    pub fn remove_existing_summary_folders(&self) -> Result<(), SummaryError> {
        for category in OutputCategory::CLEANABLE {
            let dir = self.root.join(category.dir_name());
            if !dir.exists() {
                continue;
            }
            if !self.live {
                tracing::warn!(path = %dir.display(), "dry run, not removing existing summary folder");
                continue;
            }
            fs::remove_dir_all(&dir)?;
            tracing::info!(path = %dir.display(), "removed existing summary folder");
        }
        Ok(())
    }
}

/// Write a frame as CSV with a header row, replacing any existing file.
pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<(), SummaryError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
