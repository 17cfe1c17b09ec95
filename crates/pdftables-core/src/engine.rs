use std::path::Path;

use crate::error::ExtractError;
use crate::geometry::BBox;
use crate::pages::PageSelection;

/// A table found by an engine, before header and record conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// 1-based page number.
    pub page: usize,
    pub bbox: BBox,
    /// Rectangular grid of optional cell text, top-to-bottom.
    pub rows: Vec<Vec<Option<String>>>,
}

/// Trait for table detection engines.
///
/// Implementors turn a document into grids; header handling, record
/// conversion and error reporting live in the extractor on top.
pub trait TableEngine: Send + Sync {
    /// Detect every table on the selected pages, in page order and then
    /// top-to-bottom, left-to-right within a page.
    fn detect(&self, path: &Path, pages: &PageSelection) -> Result<Vec<DetectedTable>, ExtractError>;
}
