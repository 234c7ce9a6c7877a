//! Row normalization into indexable documents.

use crate::source::{FieldValue, Row};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Default metadata key the row identifier is copied to.
pub const DEFAULT_ID_METADATA_KEY: &str = "imdb_id";

/// A normalized unit of free text plus flat string metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source row identifier, reused verbatim.
    pub id: String,
    /// Human-readable rendering of the row.
    pub text: String,
    /// Flat metadata used for filtering.
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Flatten into the record shape the index expects: `_id`, the embedded
    /// text under `text_field`, and every metadata entry at the root.
    ///
    /// Metadata keys that collide with `_id` or the text field are dropped.
    pub fn to_record(&self, text_field: &str) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("_id".to_string(), Value::String(self.id.clone()));
        record.insert(text_field.to_string(), Value::String(self.text.clone()));
        for (key, value) in &self.metadata {
            if key != "_id" && key != text_field {
                record.insert(key.clone(), Value::String(value.clone()));
            }
        }
        record
    }
}

/// Turns rows into documents.
#[derive(Debug, Clone)]
pub struct Normalizer {
    id_metadata_key: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ID_METADATA_KEY)
    }
}

impl Normalizer {
    pub fn new(id_metadata_key: &str) -> Self {
        Self {
            id_metadata_key: id_metadata_key.to_string(),
        }
    }

    /// Produce exactly one document for a row. Never fails: optional fields
    /// that are absent or not text are left out of the rendered text.
    pub fn normalize(&self, row: &Row) -> Document {
        let mut text = String::new();
        let _ = writeln!(text, "Title: {} ({})", row.title, row.year);
        let _ = writeln!(text, "Genre: {}", row.genre);
        push_text_line(&mut text, "Description", row.description.as_ref());
        push_text_line(&mut text, "Director", row.director.as_ref());
        push_text_line(&mut text, "Actors", row.actors.as_ref());

        let mut metadata = BTreeMap::new();
        metadata.insert("title".to_string(), row.title.clone());
        metadata.insert("year".to_string(), row.year.to_string());
        metadata.insert("genre".to_string(), row.genre.clone());
        metadata.insert(self.id_metadata_key.clone(), row.id.clone());

        Document {
            id: row.id.clone(),
            text,
            metadata,
        }
    }

    /// Normalize every row, preserving order.
    pub fn normalize_all(&self, rows: &[Row]) -> Vec<Document> {
        rows.iter().map(|row| self.normalize(row)).collect()
    }
}

fn push_text_line(text: &mut String, label: &str, value: Option<&FieldValue>) {
    if let Some(s) = value.and_then(FieldValue::as_text) {
        let _ = writeln!(text, "{}: {}", label, s);
    }
}

/// Normalize a row with the default metadata layout.
pub fn normalize(row: &Row) -> Document {
    Normalizer::default().normalize(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metropolis() -> Row {
        Row::new("tt0001", "Metropolis", 1927i64, "Sci-Fi")
    }

    #[test]
    fn test_metadata_for_required_fields() {
        let doc = normalize(&metropolis());

        let expected: BTreeMap<String, String> = [
            ("title", "Metropolis"),
            ("year", "1927"),
            ("genre", "Sci-Fi"),
            ("imdb_id", "tt0001"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(doc.id, "tt0001");
        assert_eq!(doc.metadata, expected);
        assert!(!doc.text.contains("Description:"));
    }

    #[test]
    fn test_text_layout() {
        let row = metropolis()
            .with_description("A futuristic city")
            .with_director("Fritz Lang")
            .with_actors("Brigitte Helm");
        let doc = normalize(&row);

        assert_eq!(
            doc.text,
            "Title: Metropolis (1927)\n\
             Genre: Sci-Fi\n\
             Description: A futuristic city\n\
             Director: Fritz Lang\n\
             Actors: Brigitte Helm\n"
        );
    }

    #[test]
    fn test_non_text_optional_fields_omitted() {
        let row = metropolis()
            .with_description(f64::NAN)
            .with_director(42i64)
            .with_actors(FieldValue::Bool(true));
        let doc = normalize(&row);

        assert_eq!(doc.text, "Title: Metropolis (1927)\nGenre: Sci-Fi\n");
    }

    #[test]
    fn test_every_optional_combination_normalizes() {
        let values = [
            None,
            Some(FieldValue::from("text")),
            Some(FieldValue::Integer(1)),
            Some(FieldValue::Float(f64::NAN)),
        ];

        for description in &values {
            for director in &values {
                for actors in &values {
                    let mut row = metropolis();
                    row.description = description.clone();
                    row.director = director.clone();
                    row.actors = actors.clone();

                    let doc = normalize(&row);
                    assert_eq!(doc.id, "tt0001");
                    assert_eq!(doc.metadata.len(), 4);
                    assert!(doc.text.starts_with("Title: Metropolis (1927)\nGenre: Sci-Fi\n"));
                    let lines = doc.text.lines().count();
                    let text_fields = [description, director, actors]
                        .iter()
                        .filter(|v| v.as_ref().and_then(|v| v.as_text()).is_some())
                        .count();
                    assert_eq!(lines, 2 + text_fields);
                }
            }
        }
    }

    #[test]
    fn test_custom_id_metadata_key() {
        let doc = Normalizer::new("source_id").normalize(&metropolis());
        assert_eq!(doc.metadata.get("source_id").map(String::as_str), Some("tt0001"));
        assert!(!doc.metadata.contains_key("imdb_id"));
    }

    #[test]
    fn test_to_record_flattens_metadata() {
        let doc = normalize(&metropolis());
        let record = doc.to_record("text");

        assert_eq!(record["_id"], "tt0001");
        assert_eq!(record["year"], "1927");
        assert_eq!(record["imdb_id"], "tt0001");
        assert!(record["text"].as_str().unwrap().starts_with("Title:"));
        assert!(!record.contains_key("metadata"));
    }
}
