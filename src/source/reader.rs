//! CSV reader producing [`Row`]s.

use super::{infer_column, is_missing, Row};
use crate::config::IngestSettings;
use crate::error::{CineloadError, Result};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Columns that must be present besides the configured ID column.
pub const REQUIRED_COLUMNS: [&str; 3] = ["title", "year", "genre"];

const OPTIONAL_COLUMNS: [&str; 3] = ["description", "director", "actors"];

/// Column positions resolved from the header row.
#[derive(Debug)]
struct ColumnMap {
    id: (String, usize),
    title: usize,
    year: usize,
    genre: usize,
    description: Option<usize>,
    director: Option<usize>,
    actors: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord, id_column: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| CineloadError::MissingColumn(name.to_string()))
        };

        let id = require(id_column)?;
        let title = require(REQUIRED_COLUMNS[0])?;
        let year = require(REQUIRED_COLUMNS[1])?;
        let genre = require(REQUIRED_COLUMNS[2])?;

        for name in OPTIONAL_COLUMNS {
            if find(name).is_none() {
                warn!("Column '{}' not found, field will be omitted", name);
            }
        }

        Ok(Self {
            id: (id_column.to_string(), id),
            title,
            year,
            genre,
            description: find(OPTIONAL_COLUMNS[0]),
            director: find(OPTIONAL_COLUMNS[1]),
            actors: find(OPTIONAL_COLUMNS[2]),
        })
    }

    fn check_required(&self, record: &StringRecord) -> Result<()> {
        let required = [
            (self.id.1, self.id.0.as_str()),
            (self.title, REQUIRED_COLUMNS[0]),
            (self.year, REQUIRED_COLUMNS[1]),
            (self.genre, REQUIRED_COLUMNS[2]),
        ];
        for (idx, name) in required {
            if is_missing(record.get(idx).unwrap_or("")) {
                return Err(CineloadError::MissingValue {
                    line: line_of(record),
                    column: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build rows from records that passed [`ColumnMap::check_required`].
    fn rows(&self, records: &[StringRecord]) -> Result<Vec<Row>> {
        let column = |idx: Option<usize>| match idx {
            Some(i) => infer_column(records.iter().map(|r| r.get(i).unwrap_or(""))),
            None => vec![None; records.len()],
        };
        let mut years = column(Some(self.year));
        let mut descriptions = column(self.description);
        let mut directors = column(self.director);
        let mut actors = column(self.actors);

        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let cell = |idx: usize| record.get(idx).unwrap_or("").to_string();
            let year = years[i].take().ok_or_else(|| CineloadError::MissingValue {
                line: line_of(record),
                column: REQUIRED_COLUMNS[1].to_string(),
            })?;

            rows.push(Row {
                id: cell(self.id.1),
                title: cell(self.title),
                year,
                genre: cell(self.genre),
                description: descriptions[i].take(),
                director: directors[i].take(),
                actors: actors[i].take(),
            });
        }
        Ok(rows)
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Read rows from a CSV file on disk.
#[instrument(skip(settings), fields(path = %path.display()))]
pub fn read_rows(path: &Path, settings: &IngestSettings) -> Result<Vec<Row>> {
    let file = std::fs::File::open(path)?;
    read_rows_from(file, settings)
}

/// Read rows from any CSV source.
///
/// The header is checked before any data row is parsed, and every row is
/// validated before returning, so a malformed input fails before anything
/// is uploaded. Year and optional columns are typed over all rows read.
pub fn read_rows_from<R: Read>(input: R, settings: &IngestSettings) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);

    let headers = reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers, settings.id_column.trim())?;
    debug!("Resolved columns: {:?}", columns);

    let limit = settings.row_limit().unwrap_or(usize::MAX);
    let mut records = Vec::new();
    for record in reader.records().take(limit) {
        let record = record?;
        columns.check_required(&record)?;
        records.push(record);
    }
    let rows = columns.rows(&records)?;

    debug!("Read {} rows", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize;
    use crate::source::FieldValue;

    const HEADER: &str = "imdb_title_id,title,year,genre,description,director,actors\n";

    fn settings() -> IngestSettings {
        IngestSettings::default()
    }

    #[test]
    fn test_reads_typed_rows() {
        let input = format!(
            "{}tt0017136,Metropolis,1927,Sci-Fi,,Fritz Lang,\"Alfred Abel, Brigitte Helm\"\n",
            HEADER
        );
        let rows = read_rows_from(input.as_bytes(), &settings()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, "tt0017136");
        assert_eq!(row.title, "Metropolis");
        assert_eq!(row.year, FieldValue::Integer(1927));
        assert_eq!(row.description, None);
        assert_eq!(row.director, Some(FieldValue::from("Fritz Lang")));
        assert_eq!(
            row.actors,
            Some(FieldValue::from("Alfred Abel, Brigitte Helm"))
        );
    }

    #[test]
    fn test_column_order_irrelevant() {
        let input = "genre,year,actors,title,director,description,imdb_title_id,votes\n\
                     Drama,1920,,The Cabinet,Robert Wiene,A tale,tt0010323,5000\n";
        let rows = read_rows_from(input.as_bytes(), &settings()).unwrap();

        assert_eq!(rows[0].id, "tt0010323");
        assert_eq!(rows[0].genre, "Drama");
        assert_eq!(rows[0].description, Some(FieldValue::from("A tale")));
    }

    #[test]
    fn test_missing_required_column_fails_fast() {
        let input = "imdb_title_id,year,genre\ntt1,1999,Drama\n";
        let err = read_rows_from(input.as_bytes(), &settings()).unwrap_err();
        assert!(matches!(err, CineloadError::MissingColumn(ref c) if c == "title"));
    }

    #[test]
    fn test_missing_optional_column_is_absent() {
        let input = "imdb_title_id,title,year,genre\ntt1,Heat,1995,Crime\n";
        let rows = read_rows_from(input.as_bytes(), &settings()).unwrap();
        assert!(rows[0].description.is_none());
        assert!(rows[0].actors.is_none());
    }

    #[test]
    fn test_empty_required_value_names_line() {
        let input = format!("{}tt1,Heat,1995,Crime,,,\ntt2,,1996,Drama,,,\n", HEADER);
        let err = read_rows_from(input.as_bytes(), &settings()).unwrap_err();
        match err {
            CineloadError::MissingValue { line, column } => {
                assert_eq!(line, 3);
                assert_eq!(column, "title");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_limit() {
        let mut input = HEADER.to_string();
        for i in 0..10 {
            input.push_str(&format!("tt{i},Movie {i},2000,Drama,,,\n"));
        }

        let mut settings = settings();
        settings.limit = 4;
        assert_eq!(read_rows_from(input.as_bytes(), &settings).unwrap().len(), 4);

        settings.limit = 0;
        assert_eq!(read_rows_from(input.as_bytes(), &settings).unwrap().len(), 10);
    }

    #[test]
    fn test_custom_id_column() {
        let input = "movie_id,title,year,genre\nm-1,Alien,1979,Horror\n";
        let mut settings = settings();
        settings.id_column = "movie_id".to_string();
        let rows = read_rows_from(input.as_bytes(), &settings).unwrap();
        assert_eq!(rows[0].id, "m-1");
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        std::fs::write(&path, format!("{}tt1,Heat,1995,Crime,,,\n", HEADER)).unwrap();

        let rows = read_rows(&path, &settings()).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_optional_columns_typed_as_a_whole() {
        let input = format!(
            "{}tt0113277,Heat,1995,Crime,1984,N/A,NULL\n\
             tt0078748,Alien,1979,Horror,A crew meets a creature,Ridley Scott,#N/A\n",
            HEADER
        );
        let rows = read_rows_from(input.as_bytes(), &settings()).unwrap();

        assert_eq!(rows[0].description, Some(FieldValue::from("1984")));
        assert_eq!(rows[0].director, None);
        assert_eq!(rows[0].actors, None);
        assert_eq!(rows[1].actors, None);
        assert_eq!(
            normalize(&rows[0]).text,
            "Title: Heat (1995)\nGenre: Crime\nDescription: 1984\n"
        );
    }

    #[test]
    fn test_numeric_optional_column_is_not_text() {
        let input = format!("{}tt1,Heat,1995,Crime,1984,,\ntt2,Alien,1979,Horror,NA,,\n", HEADER);
        let rows = read_rows_from(input.as_bytes(), &settings()).unwrap();

        assert_eq!(rows[0].description, Some(FieldValue::Integer(1984)));
        assert!(!normalize(&rows[0]).text.contains("Description:"));
    }

    #[test]
    fn test_missing_marker_in_required_column() {
        let input = format!("{}tt1,Heat,N/A,Crime,,,\n", HEADER);
        let err = read_rows_from(input.as_bytes(), &settings()).unwrap_err();
        assert!(matches!(err, CineloadError::MissingValue { line: 2, ref column } if column == "year"));
    }
}
