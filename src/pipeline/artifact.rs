//! Zip artifact holding a fitted pipeline and its training schema.
//!
//! Layout:
//! - `manifest.json`: format version, creation time, SHA-256 of `pipeline.json`
//! - `schema.json`: column layout of the training data
//! - `pipeline.json`: fitted stages with learned state
//!
//! The format is private to this crate and not stable across versions.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::PipelineError;
use super::schema::DataSchema;
use super::stage::FittedPipeline;

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

const MANIFEST_ENTRY: &str = "manifest.json";
const SCHEMA_ENTRY: &str = "schema.json";
const PIPELINE_ENTRY: &str = "pipeline.json";
const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("zip error at {path}: {message}")]
    Zip { path: PathBuf, message: String },
    #[error("json error in {entry}: {source}")]
    Json {
        entry: &'static str,
        source: serde_json::Error,
    },
    #[error("unsupported artifact format version {found} (expected {expected})", expected = FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },
    #[error("artifact entry {entry} exceeds {limit} bytes", limit = MAX_ENTRY_BYTES)]
    EntryTooLarge { entry: &'static str },
    #[error("pipeline checksum mismatch (manifest {expected}, payload {actual})")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    created_at: String,
    pipeline_sha256: String,
}

/// A loaded artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub schema: DataSchema,
    pub pipeline: FittedPipeline,
}

/// Write `pipeline` and `schema` to `path`, replacing any existing file.
///
/// The archive is staged in a temporary file next to `path` and renamed into
/// place, so readers see either the old artifact or the complete new one.
pub fn save(path: &Path, pipeline: &FittedPipeline, schema: &DataSchema) -> Result<(), ArtifactError> {
    let io_error = |source: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    let zip_error = |err: zip::result::ZipError| ArtifactError::Zip {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let pipeline_json = serde_json::to_vec_pretty(pipeline).map_err(|source| ArtifactError::Json {
        entry: PIPELINE_ENTRY,
        source,
    })?;
    let schema_json = serde_json::to_vec_pretty(schema).map_err(|source| ArtifactError::Json {
        entry: SCHEMA_ENTRY,
        source,
    })?;
    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        created_at: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        pipeline_sha256: sha256_hex(&pipeline_json),
    };
    let manifest_json =
        serde_json::to_vec_pretty(&manifest).map_err(|source| ArtifactError::Json {
            entry: MANIFEST_ENTRY,
            source,
        })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_error)?;
    let mut staged = tempfile::NamedTempFile::new_in(&dir).map_err(io_error)?;
    {
        let mut zip = zip::ZipWriter::new(staged.as_file_mut());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in [
            (MANIFEST_ENTRY, &manifest_json),
            (SCHEMA_ENTRY, &schema_json),
            (PIPELINE_ENTRY, &pipeline_json),
        ] {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(data).map_err(io_error)?;
        }
        zip.finish().map_err(zip_error)?;
    }
    staged.as_file().sync_all().map_err(io_error)?;
    staged
        .persist(path)
        .map_err(|err| io_error(err.error))?;
    tracing::info!(
        "Saved artifact {} ({} stages)",
        path.display(),
        pipeline.stages.len()
    );
    Ok(())
}

/// Read an artifact, checking its format version and payload checksum.
pub fn load(path: &Path) -> Result<Artifact, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|err| ArtifactError::Zip {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let manifest: Manifest = parse_entry(path, &mut archive, MANIFEST_ENTRY)?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found: manifest.format_version,
        });
    }
    let schema: DataSchema = parse_entry(path, &mut archive, SCHEMA_ENTRY)?;
    let pipeline_json = read_entry(path, &mut archive, PIPELINE_ENTRY)?;
    let actual = sha256_hex(&pipeline_json);
    if !actual.eq_ignore_ascii_case(&manifest.pipeline_sha256) {
        return Err(ArtifactError::ChecksumMismatch {
            expected: manifest.pipeline_sha256,
            actual,
        });
    }
    let pipeline: FittedPipeline =
        serde_json::from_slice(&pipeline_json).map_err(|source| ArtifactError::Json {
            entry: PIPELINE_ENTRY,
            source,
        })?;
    pipeline.validate()?;
    tracing::debug!(
        "Loaded artifact {} created {} with schema {schema}",
        path.display(),
        manifest.created_at
    );
    Ok(Artifact { schema, pipeline })
}

fn read_entry<R: Read + Seek>(
    path: &Path,
    archive: &mut zip::ZipArchive<R>,
    entry: &'static str,
) -> Result<Vec<u8>, ArtifactError> {
    let file = archive.by_name(entry).map_err(|err| ArtifactError::Zip {
        path: path.to_path_buf(),
        message: format!("{entry}: {err}"),
    })?;
    if file.size() > MAX_ENTRY_BYTES {
        return Err(ArtifactError::EntryTooLarge { entry });
    }
    let mut bytes = Vec::new();
    file.take(MAX_ENTRY_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    if bytes.len() as u64 > MAX_ENTRY_BYTES {
        return Err(ArtifactError::EntryTooLarge { entry });
    }
    Ok(bytes)
}

fn parse_entry<T: for<'de> Deserialize<'de>, R: Read + Seek>(
    path: &Path,
    archive: &mut zip::ZipArchive<R>,
    entry: &'static str,
) -> Result<T, ArtifactError> {
    let bytes = read_entry(path, archive, entry)?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json { entry, source })
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        Column, ColumnKind, DataView, Estimator, Row, StageSpec, TrainingContext, Value,
    };
    use tempfile::tempdir;

    fn fitted() -> (FittedPipeline, DataSchema) {
        let schema = DataSchema::new(vec![Column::new("Word", ColumnKind::Text)]);
        let data = DataView {
            schema: schema.clone(),
            rows: vec![
                Row::new().with("Word", Value::Text("alpha".into())),
                Row::new().with("Word", Value::Text("beta".into())),
            ],
        };
        let pipeline = Estimator::new()
            .append(StageSpec::map_value_to_key("WordKey", "Word"))
            .fit(&TrainingContext::default(), &data)
            .unwrap();
        (pipeline, schema)
    }

    fn rewrite_entry(path: &Path, entry: &str, data: &[u8]) {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).unwrap();
            entries.push((file.name().to_string(), bytes));
        }
        drop(archive);
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in entries {
            zip.start_file(name.as_str(), options).unwrap();
            if name == entry {
                zip.write_all(data).unwrap();
            } else {
                zip.write_all(&bytes).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn save_then_load_restores_schema_and_stages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.zip");
        let (pipeline, schema) = fitted();
        save(&path, &pipeline, &schema).unwrap();

        let artifact = load(&path).unwrap();
        assert_eq!(artifact.schema, schema);
        assert_eq!(artifact.pipeline.stages.len(), 1);
        let vocabulary = artifact.pipeline.key_vocabulary("WordKey").unwrap();
        assert_eq!(vocabulary.key_of(&Value::Text("beta".into())), 2);
    }

    #[test]
    fn save_overwrites_existing_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.zip");
        std::fs::write(&path, b"stale").unwrap();
        let (pipeline, schema) = fitted();
        save(&path, &pipeline, &schema).unwrap();
        assert!(load(&path).is_ok());
    }

    #[test]
    fn load_rejects_tampered_pipeline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.zip");
        let (pipeline, schema) = fitted();
        save(&path, &pipeline, &schema).unwrap();
        let tampered = serde_json::to_vec(&pipeline).unwrap();
        rewrite_entry(&path, PIPELINE_ENTRY, &tampered);

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::ChecksumMismatch { .. }));
    }

    #[test]
    fn load_rejects_unknown_format_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.zip");
        let (pipeline, schema) = fitted();
        save(&path, &pipeline, &schema).unwrap();
        let manifest = br#"{"format_version":99,"created_at":"","pipeline_sha256":""}"#;
        rewrite_entry(&path, MANIFEST_ENTRY, manifest);

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::UnsupportedVersion { found: 99 }));
    }

    #[test]
    fn load_reports_missing_and_non_zip_files() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.zip");
        assert!(matches!(load(&missing).unwrap_err(), ArtifactError::Io { .. }));

        let junk = dir.path().join("junk.zip");
        std::fs::write(&junk, b"not a zip").unwrap();
        assert!(matches!(load(&junk).unwrap_err(), ArtifactError::Zip { .. }));
    }
}
