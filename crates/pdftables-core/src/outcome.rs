//! The result of one extraction, success or failure.

use serde::{Serialize, Serializer};

use crate::error::ExtractError;
use crate::records::TableRecords;

/// Tagged extraction result.
///
/// On the wire `Tables` is a JSON array of tables and `Failed` a JSON
/// string, so the output keeps a single shape per variant while callers in
/// Rust match on the tag instead of inspecting JSON types.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    Tables(Vec<TableRecords>),
    Failed(String),
}

impl ExtractOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractOutcome::Tables(_))
    }

    /// The tables, if extraction succeeded.
    pub fn tables(&self) -> Option<&[TableRecords]> {
        match self {
            ExtractOutcome::Tables(tables) => Some(tables),
            ExtractOutcome::Failed(_) => None,
        }
    }

    /// The failure message, if extraction failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            ExtractOutcome::Tables(_) => None,
            ExtractOutcome::Failed(message) => Some(message),
        }
    }
}

impl From<Result<Vec<TableRecords>, ExtractError>> for ExtractOutcome {
    fn from(result: Result<Vec<TableRecords>, ExtractError>) -> Self {
        match result {
            Ok(tables) => ExtractOutcome::Tables(tables),
            Err(err) => ExtractOutcome::Failed(err.to_string()),
        }
    }
}

impl Serialize for ExtractOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractOutcome::Tables(tables) => serializer.collect_seq(tables),
            ExtractOutcome::Failed(message) => serializer.serialize_str(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CellValue, Row};

    #[test]
    fn tables_serialize_as_nested_arrays() {
        let outcome = ExtractOutcome::Tables(vec![TableRecords {
            page: 1,
            rows: vec![Row::new(vec![
                ("A".to_string(), CellValue::Text("1".to_string())),
                ("B".to_string(), CellValue::Text("2".to_string())),
            ])],
        }]);
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"[[{"A":"1","B":"2"}]]"#
        );
        assert!(outcome.is_success());
        assert_eq!(outcome.tables().map(<[_]>::len), Some(1));
    }

    #[test]
    fn empty_success_is_empty_array() {
        let outcome = ExtractOutcome::Tables(Vec::new());
        assert_eq!(serde_json::to_string(&outcome).unwrap(), "[]");
    }

    #[test]
    fn failure_serializes_as_string() {
        let result: Result<Vec<TableRecords>, _> = Err(ExtractError::Open("bad xref".to_string()));
        let outcome = ExtractOutcome::from(result);
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure(), Some("failed to open PDF: bad xref"));
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#""failed to open PDF: bad xref""#
        );
    }
}
