//! Minimal train/persist/score toolkit.
//!
//! An [`Estimator`] is an ordered list of [`StageSpec`] descriptors. Fitting
//! walks the list once: each stage is fitted on the rows produced by the
//! stages before it, then applied to those rows. The resulting
//! [`FittedPipeline`] is the same list with learned state attached and can be
//! persisted with [`artifact::save`] next to the schema of the data it was
//! fitted on.

pub mod artifact;
mod encoding;
mod engine;
mod schema;
mod stage;
mod text;

pub use encoding::{KeyValue, KeyVocabulary};
pub use engine::PredictionEngine;
pub use schema::{Column, ColumnKind, DataSchema, Prediction, Record, Row, Value};
pub use stage::{
    DataView, Estimator, FittedPipeline, FittedStage, PREDICTED_LABEL_COLUMN, SCORE_COLUMN,
    StageSpec, TrainingContext,
};
pub use text::{TextFeaturizer, TextFeaturizerOptions};

/// Errors raised while fitting or applying a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Fitting was attempted without any rows.
    #[error("Training data is empty")]
    EmptyDataset,
    /// A column held a different value type than the stage needs.
    #[error("Column {column}: expected {expected}, found {found}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: String,
    },
    /// Input records do not match the schema the pipeline was fitted with.
    #[error("Schema mismatch: pipeline expects {expected}, input provides {found}")]
    SchemaMismatch { expected: String, found: String },
    /// A stage names a column no earlier key encoder produces.
    #[error("Stage {stage} needs a key encoder producing column {column}")]
    UnknownSource { stage: &'static str, column: String },
    /// A trainer rejected its input.
    #[error("{stage} training failed: {message}")]
    Training {
        stage: &'static str,
        message: String,
    },
    /// Deserialized learned state is structurally invalid.
    #[error("Invalid fitted stage {stage}: {message}")]
    InvalidModel {
        stage: &'static str,
        message: String,
    },
}
