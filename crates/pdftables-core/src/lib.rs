//! pdftables-core: backend-independent data types and algorithms.
//!
//! Holds geometry, ruling edges, positioned chars, ruled-grid detection,
//! record conversion, page selection, the [`TableEngine`] seam and the
//! [`ExtractOutcome`] returned to callers. Nothing here touches PDF bytes.

pub mod edges;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod outcome;
pub mod pages;
pub mod records;
pub mod table;
pub mod text;

pub use edges::{Edge, edge_from_segment};
pub use engine::{DetectedTable, TableEngine};
pub use error::ExtractError;
pub use geometry::{BBox, Ctm, Orientation};
pub use outcome::ExtractOutcome;
pub use pages::PageSelection;
pub use records::{CellValue, HeaderMode, RecordOptions, Row, TableRecords, grid_to_records};
pub use table::{Cell, Grid, GridFinder, TableSettings};
pub use text::Char;
