//! Conversion of detected grids into row records (column header -> value).

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// A single cell value in a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One table row: an ordered mapping from column header to value.
///
/// Serialises as a JSON object whose keys keep column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new(fields: Vec<(String, CellValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// The records of one detected table.
///
/// Serialises as a JSON array of row objects; `page` is metadata only.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecords {
    /// 1-based page the table was found on.
    pub page: usize,
    pub rows: Vec<Row>,
}

impl Serialize for TableRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.rows)
    }
}

/// Where column headers come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first grid row names the columns.
    #[default]
    FirstRow,
    /// Columns are keyed by index (`"0"`, `"1"`, ...) and every row is data.
    None,
}

/// Options for [`grid_to_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOptions {
    pub header: HeaderMode,
    /// Coerce all-numeric columns to numbers.
    pub infer_types: bool,
}

/// Convert a grid of optional cell strings into records.
///
/// Every record carries every header key. Empty cells become
/// [`CellValue::Null`]. A grid holding only a header row yields no records.
pub fn grid_to_records(grid: &[Vec<Option<String>>], options: &RecordOptions) -> Vec<Row> {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let (headers, body) = match options.header {
        HeaderMode::FirstRow => match grid.split_first() {
            Some((first, rest)) => (header_names(first, width), rest),
            None => return Vec::new(),
        },
        HeaderMode::None => ((0..width).map(|i| i.to_string()).collect(), grid),
    };

    let mut columns: Vec<Vec<CellValue>> = (0..width)
        .map(|c| {
            body.iter()
                .map(|row| cell_value(row.get(c).and_then(|v| v.as_deref())))
                .collect()
        })
        .collect();

    if options.infer_types {
        for column in &mut columns {
            infer_column(column);
        }
    }

    (0..body.len())
        .map(|r| {
            Row::new(
                headers
                    .iter()
                    .zip(&columns)
                    .map(|(h, col)| (h.clone(), col[r].clone()))
                    .collect(),
            )
        })
        .collect()
}

/// Build unique header names from the first row.
///
/// Blank headers become `Unnamed: i`; repeats get `.1`, `.2`, ... suffixes.
pub fn header_names(first: &[Option<String>], width: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(width);
    for i in 0..width {
        let base = match first.get(i).and_then(|v| v.as_deref()).map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Unnamed: {i}"),
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn cell_value(raw: Option<&str>) -> CellValue {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() => CellValue::Text(text.to_string()),
        _ => CellValue::Null,
    }
}

fn infer_column(column: &mut [CellValue]) {
    let texts: Vec<&str> = column.iter().filter_map(CellValue::as_str).collect();
    if texts.is_empty() {
        return;
    }

    if texts.iter().all(|t| t.parse::<i64>().is_ok()) {
        for value in column.iter_mut() {
            if let CellValue::Text(t) = value {
                if let Ok(n) = t.parse::<i64>() {
                    *value = CellValue::Integer(n);
                }
            }
        }
    } else if texts
        .iter()
        .all(|t| t.parse::<f64>().is_ok_and(f64::is_finite))
    {
        for value in column.iter_mut() {
            if let CellValue::Text(t) = value {
                if let Ok(n) = t.parse::<f64>() {
                    *value = CellValue::Float(n);
                }
            }
        }
    }
}
