//! PDF parsing for pdftables.
//!
//! Loads documents with `lopdf`, interprets page content streams and hands
//! back positioned chars and ruling edges as [`PageObjects`].

pub mod error;
pub mod fonts;
pub mod interpreter;
pub mod lopdf_backend;
pub mod page_geometry;

pub use error::BackendError;
pub use fonts::FontInfo;
pub use lopdf_backend::{LopdfDocument, PageObjects};
pub use page_geometry::PageGeometry;
