//! The default engine: tables drawn with ruling lines.

use std::path::Path;

use pdftables_core::{DetectedTable, ExtractError, GridFinder, PageSelection, TableEngine, TableSettings};
use pdftables_parse::LopdfDocument;
use tracing::debug;

/// Detects tables from the ruling lines drawn on each page.
///
/// Cells are the rectangles enclosed by horizontal and vertical edges; text
/// is assigned to the cell containing each glyph's centre. Pages without
/// ruling lines yield no tables.
#[derive(Debug, Clone, Default)]
pub struct LatticeEngine {
    finder: GridFinder,
}

impl LatticeEngine {
    pub fn new(settings: TableSettings) -> Self {
        Self {
            finder: GridFinder::new(settings),
        }
    }

    pub fn settings(&self) -> &TableSettings {
        self.finder.settings()
    }

    /// Detect tables in an already opened document.
    pub fn detect_document(
        &self,
        doc: &LopdfDocument,
        pages: &PageSelection,
    ) -> Result<Vec<DetectedTable>, ExtractError> {
        let mut tables = Vec::new();
        for index in pages.resolve(doc.page_count())? {
            let page_number = index + 1;
            let page = doc.page(index).map_err(|e| ExtractError::Page {
                page: page_number,
                message: e.to_string(),
            })?;

            let grids = self.finder.find(page.edges, &page.chars);
            debug!(page = page_number, tables = grids.len(), "detected tables");
            tables.extend(grids.into_iter().map(|grid| DetectedTable {
                page: page_number,
                bbox: grid.bbox,
                rows: grid.rows,
            }));
        }
        Ok(tables)
    }
}

impl TableEngine for LatticeEngine {
    fn detect(&self, path: &Path, pages: &PageSelection) -> Result<Vec<DetectedTable>, ExtractError> {
        let doc = LopdfDocument::open_file(path)?;
        self.detect_document(&doc, pages)
    }
}
