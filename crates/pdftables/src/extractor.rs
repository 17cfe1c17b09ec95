//! Turns engine output into row records and collapses errors into an outcome.

use std::path::Path;

use pdftables_core::{
    DetectedTable, ExtractError, ExtractOutcome, PageSelection, RecordOptions, TableEngine,
    TableRecords, grid_to_records,
};
use tracing::{debug, warn};

use crate::lattice::LatticeEngine;

/// Options controlling one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Pages to scan.
    pub pages: PageSelection,
    /// Keep each detected table separate. When `false`, every grid is
    /// stacked under the first grid's header into a single table.
    pub multiple_tables: bool,
    pub records: RecordOptions,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: PageSelection::All,
            multiple_tables: true,
            records: RecordOptions::default(),
        }
    }
}

/// Extracts tables from PDF files as row records.
///
/// ```no_run
/// use pdftables::Extractor;
///
/// let outcome = Extractor::new().extract("report.pdf");
/// println!("{}", serde_json::to_string(&outcome).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor<E: TableEngine = LatticeEngine> {
    engine: E,
    options: ExtractOptions,
}

impl Extractor<LatticeEngine> {
    /// An extractor using the lattice engine and default options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: TableEngine> Extractor<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Extract every table; failures become [`ExtractOutcome::Failed`].
    pub fn extract(&self, path: impl AsRef<Path>) -> ExtractOutcome {
        let path = path.as_ref();
        let result = self.try_extract(path);
        if let Err(err) = &result {
            warn!(path = %path.display(), error = %err, "extraction failed");
        }
        ExtractOutcome::from(result)
    }

    /// Extract every table, keeping the error typed.
    pub fn try_extract(&self, path: impl AsRef<Path>) -> Result<Vec<TableRecords>, ExtractError> {
        let path = path.as_ref();
        let detected = self.engine.detect(path, &self.options.pages)?;
        debug!(path = %path.display(), tables = detected.len(), "engine finished");

        let tables = if self.options.multiple_tables {
            detected
                .into_iter()
                .map(|table| TableRecords {
                    page: table.page,
                    rows: grid_to_records(&table.rows, &self.options.records),
                })
                .collect()
        } else {
            stack_tables(detected, &self.options.records).into_iter().collect()
        };
        Ok(tables)
    }
}

/// Concatenate every grid under the first grid's header row.
fn stack_tables(detected: Vec<DetectedTable>, options: &RecordOptions) -> Option<TableRecords> {
    let page = detected.first()?.page;
    let width = detected
        .iter()
        .flat_map(|t| t.rows.iter().map(Vec::len))
        .max()
        .unwrap_or(0);
    let rows: Vec<Vec<Option<String>>> = detected
        .into_iter()
        .flat_map(|t| t.rows)
        .map(|mut row| {
            row.resize(width, None);
            row
        })
        .collect();
    Some(TableRecords {
        page,
        rows: grid_to_records(&rows, options),
    })
}
