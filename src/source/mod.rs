//! Tabular input for the ingestion pipeline.
//!
//! Rows are read from a header-driven CSV file into an explicit [`Row`] type.
//! Optional cells are typed per column, so the normalizer can tell text
//! from numbers without looking at the raw record again.

mod reader;

pub use reader::{read_rows, read_rows_from, REQUIRED_COLUMNS};

use serde::Serialize;
use std::fmt;

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

/// Cell spellings that mean "no value", matching what dataframe loaders
/// such as pandas treat as missing by default.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell is empty or one of the [`MISSING_MARKERS`].
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}

impl FieldValue {
    /// The text of this value, if it is text-typed.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Type of a whole column, decided from every present cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnType {
    fn of_cell(trimmed: &str) -> Self {
        if trimmed.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if looks_numeric(trimmed) && trimmed.parse::<f64>().is_ok() {
            ColumnType::Float
        } else if parse_bool(trimmed).is_some() {
            ColumnType::Bool
        } else {
            ColumnType::Text
        }
    }

    fn widen(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer) => {
                ColumnType::Float
            }
            _ => ColumnType::Text,
        }
    }

    fn value(self, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        match self {
            ColumnType::Integer => trimmed.parse().ok().map(FieldValue::Integer),
            ColumnType::Float => trimmed.parse().ok().map(FieldValue::Float),
            ColumnType::Bool => parse_bool(trimmed).map(FieldValue::Bool),
            ColumnType::Text => Some(FieldValue::Text(raw.to_string())),
        }
    }
}

/// Type a column of raw cells as a unit.
///
/// Missing cells become `None`. The remaining cells are numbers only when
/// every one of them parses as a number, booleans only when every one is a
/// boolean spelling, and text otherwise. A lone `1984` in a text column
/// therefore stays text.
pub fn infer_column<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<Option<FieldValue>> {
    let cells: Vec<&str> = cells.into_iter().collect();

    let column_type = cells
        .iter()
        .filter(|raw| !is_missing(raw))
        .map(|raw| ColumnType::of_cell(raw.trim()))
        .reduce(ColumnType::widen)
        .unwrap_or(ColumnType::Text);

    cells
        .iter()
        .map(|raw| {
            if is_missing(raw) {
                None
            } else {
                column_type.value(raw)
            }
        })
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Digits and exponent syntax only. Keeps words like "Infinity" as text.
fn looks_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

/// One movie record before normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Unique row identifier, reused verbatim as the document ID.
    pub id: String,
    pub title: String,
    pub year: FieldValue,
    pub genre: String,
    pub description: Option<FieldValue>,
    pub director: Option<FieldValue>,
    pub actors: Option<FieldValue>,
}

impl Row {
    /// Create a row with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        year: impl Into<FieldValue>,
        genre: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: year.into(),
            genre: genre.into(),
            description: None,
            director: None,
            actors: None,
        }
    }

    pub fn with_description(mut self, value: impl Into<FieldValue>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn with_director(mut self, value: impl Into<FieldValue>) -> Self {
        self.director = Some(value.into());
        self
    }

    pub fn with_actors(mut self, value: impl Into<FieldValue>) -> Self {
        self.actors = Some(value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(s.to_string()))
    }

    #[test]
    fn test_numeric_columns() {
        assert_eq!(
            infer_column(["1927", "", "1995"]),
            vec![Some(FieldValue::Integer(1927)), None, Some(FieldValue::Integer(1995))]
        );
        assert_eq!(
            infer_column(["7", "7.5"]),
            vec![Some(FieldValue::Float(7.0)), Some(FieldValue::Float(7.5))]
        );
        assert_eq!(
            infer_column(["True", "false"]),
            vec![Some(FieldValue::Bool(true)), Some(FieldValue::Bool(false))]
        );
    }

    #[test]
    fn test_mixed_column_is_text() {
        assert_eq!(
            infer_column(["1984", "A tramp cares for a child"]),
            vec![text("1984"), text("A tramp cares for a child")]
        );
        assert_eq!(infer_column(["1995", "true"]), vec![text("1995"), text("true")]);
    }

    #[test]
    fn test_missing_markers() {
        assert_eq!(
            infer_column(["N/A", "NULL", "nan", "<NA>", "None", "  ", "Fritz Lang"]),
            vec![None, None, None, None, None, None, text("Fritz Lang")]
        );
        assert!(is_missing("#N/A"));
        assert!(!is_missing("Nan Goldin"));
        assert_eq!(infer_column(["NA", "NA"]), vec![None, None]);
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Integer(1927).to_string(), "1927");
        assert_eq!(FieldValue::from("Sci-Fi").to_string(), "Sci-Fi");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_words_stay_text() {
        assert_eq!(infer_column(["Infinity"]), vec![text("Infinity")]);
        assert_eq!(infer_column(["e"]), vec![text("e")]);
    }
}
