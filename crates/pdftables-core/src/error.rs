//! Error type for table extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Why an extraction failed.
///
/// The `Display` text is what callers see in a failed outcome, so every
/// variant renders a non-empty, human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    /// The input path does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The document could not be read or parsed as a PDF.
    #[error("failed to open PDF: {0}")]
    Open(String),

    /// A page could not be interpreted.
    #[error("failed to read page {page}: {message}")]
    Page {
        /// 1-based page number.
        page: usize,
        message: String,
    },

    /// The page selection does not fit the document.
    #[error("invalid page selection: {0}")]
    PageRange(String),

    /// Any other failure raised by a table engine.
    #[error("table extraction failed: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_mentions_path() {
        let err = ExtractError::NotFound(PathBuf::from("/tmp/missing.pdf"));
        assert_eq!(err.to_string(), "file not found: /tmp/missing.pdf");
    }

    #[test]
    fn page_error_is_one_based() {
        let err = ExtractError::Page {
            page: 2,
            message: "bad operator".to_string(),
        };
        assert_eq!(err.to_string(), "failed to read page 2: bad operator");
    }

    #[test]
    fn every_variant_has_text() {
        let errors = [
            ExtractError::Open(String::new()),
            ExtractError::PageRange(String::new()),
            ExtractError::Engine(String::new()),
        ];
        assert!(errors.iter().all(|e| !e.to_string().is_empty()));
    }
}
