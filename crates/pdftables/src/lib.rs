//! pdftables: extract ruled tables from PDF documents as row records.
//!
//! This is the public API facade. It ties the backend-independent types in
//! `pdftables-core` to the lopdf-based reader in `pdftables-parse`.
//!
//! # Architecture
//!
//! - **pdftables-core**: geometry, grid detection, records, outcome, engine trait
//! - **pdftables-parse**: PDF loading and content stream interpretation
//! - **pdftables** (this crate): [`LatticeEngine`] and [`Extractor`]

mod extractor;
mod lattice;

pub use extractor::{ExtractOptions, Extractor};
pub use lattice::LatticeEngine;

pub use pdftables_core::{
    BBox, CellValue, DetectedTable, ExtractError, ExtractOutcome, HeaderMode, PageSelection,
    RecordOptions, Row, TableEngine, TableRecords, TableSettings,
};
pub use pdftables_parse::{BackendError, LopdfDocument, PageObjects};
