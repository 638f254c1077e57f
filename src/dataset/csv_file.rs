//! Comma-separated record files with a header line.
//!
//! Fields are joined with `,` and never quoted or escaped. A value that
//! contains a comma shifts the columns of its line when read back.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::{ColumnKind, Record, Row};

const SEPARATOR: char = ',';

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid header in {path}: expected {expected:?}, found {found:?}")]
    Header {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Write `records` to `path` unless a file already exists there.
///
/// Returns `Ok(false)` when the file was left untouched.
pub fn write_if_missing<T: Record>(path: &Path, records: &[T]) -> Result<bool, DatasetError> {
    if path.exists() {
        tracing::info!("Dataset {} already exists; keeping it", path.display());
        return Ok(false);
    }
    let io_error = |source: std::io::Error| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let schema = T::schema();
    let names = schema.names();
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    writeln!(writer, "{}", names.join(",")).map_err(io_error)?;
    for record in records {
        let row = record.to_row();
        let fields: Vec<String> = names
            .iter()
            .map(|name| row.get(name).map(|value| value.to_string()).unwrap_or_default())
            .collect();
        writeln!(writer, "{}", fields.join(",")).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(true)
}

/// Read every record of a file written by [`write_if_missing`].
///
/// Header names match case-insensitively and may stop before the trailing
/// schema columns. Rows may omit trailing fields. Fields are trimmed, and
/// empty or absent numeric fields are left out of the row so the record can
/// apply its own default. Blank lines are skipped.
pub fn load_records<T: Record>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let schema = T::schema();
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?,
        None => String::new(),
    };
    let header = header.trim_start_matches('\u{feff}').trim_end();
    let columns = match header_columns(header, &schema.names()) {
        Some(count) => &schema.columns[..count],
        None => {
            return Err(DatasetError::Header {
                path: path.to_path_buf(),
                expected: schema.names().join(","),
                found: header.to_string(),
            });
        }
    };

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_number = index + 2;
        let line = line.map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let parse_error = |message: String| DatasetError::Parse {
            path: path.to_path_buf(),
            line: line_number,
            message,
        };
        let fields: Vec<&str> = line.split(SEPARATOR).map(str::trim).collect();
        if fields.len() > columns.len() {
            return Err(parse_error(format!(
                "expected at most {} fields, found {}",
                columns.len(),
                fields.len()
            )));
        }
        let mut row = Row::new();
        for (column, field) in columns.iter().zip(fields) {
            if field.is_empty() && column.kind != ColumnKind::Text {
                continue;
            }
            let value = column
                .kind
                .parse(field)
                .map_err(|message| parse_error(format!("{}: {message}", column.name)))?;
            row.insert(&column.name, value);
        }
        records.push(T::from_row(&row).map_err(|err| parse_error(err.to_string()))?);
    }
    tracing::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Number of leading schema columns named by `header`, ignoring case.
fn header_columns(header: &str, expected: &[&str]) -> Option<usize> {
    let found: Vec<&str> = header.split(SEPARATOR).map(str::trim).collect();
    let matches = found.len() <= expected.len()
        && found
            .iter()
            .zip(expected)
            .all(|(found, expected)| found.eq_ignore_ascii_case(expected));
    (matches && !found[0].is_empty()).then_some(found.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{UserLessonInteraction, WordSample};
    use tempfile::tempdir;

    #[test]
    fn writes_header_and_rows_then_reads_them_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("words.csv");
        let samples = vec![WordSample::new("animals", "cat"), WordSample::new("sports", "golf")];

        assert!(write_if_missing(&path, &samples).unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Category,Word\nanimals,cat\nsports,golf\n");
        assert_eq!(load_records::<WordSample>(&path).unwrap(), samples);
    }

    #[test]
    fn existing_file_is_left_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "Category,Word\nx,y\n").unwrap();

        assert!(!write_if_missing(&path, &[WordSample::new("a", "b")]).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Category,Word\nx,y\n");
    }

    #[test]
    fn empty_label_defaults_to_one() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "UserId,LessonId,Label\nu1,26,\nu2,38,1\n\n").unwrap();

        let records = load_records::<UserLessonInteraction>(&path).unwrap();
        assert_eq!(
            records,
            vec![
                UserLessonInteraction::new("u1", 26),
                UserLessonInteraction::new("u2", 38)
            ]
        );
    }

    #[test]
    fn wrong_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "LessonId,UserId,Label\n1,u1,1\n").unwrap();

        let err = load_records::<UserLessonInteraction>(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Header { .. }));

        std::fs::write(&path, "UserId,LessonId,Label,Extra\nu1,1,1,x\n").unwrap();
        let err = load_records::<UserLessonInteraction>(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Header { .. }));
    }

    #[test]
    fn header_names_match_regardless_of_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "userId,lessonId,label\nu1,26,1\n").unwrap();

        let records = load_records::<UserLessonInteraction>(&path).unwrap();
        assert_eq!(records, vec![UserLessonInteraction::new("u1", 26)]);
    }

    #[test]
    fn file_without_label_column_gets_default_label() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "UserId,LessonId\nu1,1\nu2,7\n").unwrap();

        let records = load_records::<UserLessonInteraction>(&path).unwrap();
        assert_eq!(
            records,
            vec![
                UserLessonInteraction::new("u1", 1),
                UserLessonInteraction::new("u2", 7)
            ]
        );
        assert!(records.iter().all(|record| record.label == 1.0));
    }

    #[test]
    fn rows_may_omit_trailing_label() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "UserId,LessonId,Label\nu1,26\nu2,38,0.5\n").unwrap();

        let records = load_records::<UserLessonInteraction>(&path).unwrap();
        assert_eq!(records[0], UserLessonInteraction::new("u1", 26));
        assert_eq!(records[1].label, 0.5);
    }

    #[test]
    fn rows_missing_required_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "UserId,LessonId\nu1\n").unwrap();

        let err = load_records::<UserLessonInteraction>(&path).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 2, .. }));
    }

    #[test]
    fn padded_fields_are_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "Category ,Word\nfruit ,apple\nfruit, banana \n").unwrap();

        let records = load_records::<WordSample>(&path).unwrap();
        assert_eq!(
            records,
            vec![WordSample::new("fruit", "apple"), WordSample::new("fruit", "banana")]
        );
    }

    #[test]
    fn extra_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "UserId,LessonId\nu1,1,1\n").unwrap();

        match load_records::<UserLessonInteraction>(&path).unwrap_err() {
            DatasetError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("at most 2 fields"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_field_reports_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(&path, "UserId,LessonId,Label\nu1,26,1\nu2,abc,1\n").unwrap();

        match load_records::<UserLessonInteraction>(&path).unwrap_err() {
            DatasetError::Parse { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("LessonId"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load_records::<WordSample>(&dir.path().join("none.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
