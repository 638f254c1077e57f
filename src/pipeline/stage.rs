use serde::{Deserialize, Serialize};

use super::PipelineError;
use super::encoding::KeyVocabulary;
use super::schema::{DataSchema, Record, Row, Value};
use super::text::{TextFeaturizer, TextFeaturizerOptions};
use crate::ml::{matrix_factorization as mf, sdca};

/// Column written by trainer stages with the model output.
pub const SCORE_COLUMN: &str = "Score";
/// Column written by classifier stages with the predicted class key.
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

/// Run-wide training settings, passed explicitly to [`Estimator::fit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingContext {
    /// When set, replaces the seed of every trainer stage.
    pub seed: Option<u64>,
}

impl TrainingContext {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn seed_or(&self, stage_seed: u64) -> u64 {
        self.seed.unwrap_or(stage_seed)
    }
}

/// Unfitted description of one pipeline step.
#[derive(Debug, Clone)]
pub enum StageSpec {
    /// Learn a dense key for every distinct value of `input`.
    MapValueToKey { input: String, output: String },
    /// Learn an n-gram vocabulary over `input` and emit count vectors.
    FeaturizeText {
        input: String,
        output: String,
        options: TextFeaturizerOptions,
    },
    /// Factorize the `row` x `column` key matrix filled with `label`.
    MatrixFactorization {
        row: String,
        column: String,
        label: String,
        options: mf::TrainOptions,
    },
    /// Multiclass linear classifier over a feature vector and a key label.
    SdcaMaximumEntropy {
        label: String,
        features: String,
        options: sdca::TrainOptions,
    },
    /// Map keys of `input` back to the raw values of the encoder that produced `source`.
    MapKeyToValue {
        input: String,
        output: String,
        source: String,
    },
}

impl StageSpec {
    pub fn map_value_to_key(output: &str, input: &str) -> Self {
        Self::MapValueToKey {
            input: input.to_string(),
            output: output.to_string(),
        }
    }

    pub fn featurize_text(output: &str, input: &str) -> Self {
        Self::FeaturizeText {
            input: input.to_string(),
            output: output.to_string(),
            options: TextFeaturizerOptions::default(),
        }
    }

    pub fn map_key_to_value(output: &str, input: &str, source: &str) -> Self {
        Self::MapKeyToValue {
            input: input.to_string(),
            output: output.to_string(),
            source: source.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MapValueToKey { .. } => "MapValueToKey",
            Self::FeaturizeText { .. } => "FeaturizeText",
            Self::MatrixFactorization { .. } => "MatrixFactorization",
            Self::SdcaMaximumEntropy { .. } => "SdcaMaximumEntropy",
            Self::MapKeyToValue { .. } => "MapKeyToValue",
        }
    }
}

/// Rows loaded for training together with their schema.
#[derive(Debug, Clone)]
pub struct DataView {
    pub schema: DataSchema,
    pub rows: Vec<Row>,
}

impl DataView {
    pub fn from_records<T: Record>(records: &[T]) -> Self {
        Self {
            schema: T::schema(),
            rows: records.iter().map(Record::to_row).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Ordered list of stages to fit.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    stages: Vec<StageSpec>,
}

impl Estimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    /// Fit every stage in order over all rows of `data`.
    pub fn fit(
        &self,
        context: &TrainingContext,
        data: &DataView,
    ) -> Result<FittedPipeline, PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let mut rows = data.rows.clone();
        let mut fitted: Vec<FittedStage> = Vec::with_capacity(self.stages.len());
        for spec in &self.stages {
            let stage = fit_stage(spec, context, &rows, &fitted)?;
            for row in &mut rows {
                stage.apply(row)?;
            }
            tracing::debug!("Fitted stage {} over {} rows", spec.name(), rows.len());
            fitted.push(stage);
        }
        Ok(FittedPipeline { stages: fitted })
    }
}

/// A stage with its learned state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FittedStage {
    MapValueToKey {
        input: String,
        output: String,
        vocabulary: KeyVocabulary,
    },
    FeaturizeText {
        input: String,
        output: String,
        featurizer: TextFeaturizer,
    },
    MatrixFactorization {
        row: String,
        column: String,
        model: mf::MatrixFactorizationModel,
    },
    SdcaMaximumEntropy {
        features: String,
        model: sdca::MaxEntModel,
    },
    MapKeyToValue {
        input: String,
        output: String,
        vocabulary: KeyVocabulary,
    },
}

impl FittedStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MapValueToKey { .. } => "MapValueToKey",
            Self::FeaturizeText { .. } => "FeaturizeText",
            Self::MatrixFactorization { .. } => "MatrixFactorization",
            Self::SdcaMaximumEntropy { .. } => "SdcaMaximumEntropy",
            Self::MapKeyToValue { .. } => "MapKeyToValue",
        }
    }

    /// Transform one row in place. Never fails on unseen values: they take the
    /// missing key and flow on.
    pub fn apply(&self, row: &mut Row) -> Result<(), PipelineError> {
        match self {
            Self::MapValueToKey {
                input,
                output,
                vocabulary,
            } => {
                let key = row.get(input).map(|value| vocabulary.key_of(value)).unwrap_or(0);
                row.insert(output, Value::Key(key));
            }
            Self::FeaturizeText {
                input,
                output,
                featurizer,
            } => {
                let features = match row.get(input) {
                    None => featurizer.transform(""),
                    Some(_) => featurizer.transform(row.text(input)?),
                };
                row.insert(output, Value::Vector(features));
            }
            Self::MatrixFactorization { row: row_column, column, model } => {
                let row_key = row.key(row_column)?;
                let column_key = row.key(column)?;
                let score = match (row_key.checked_sub(1), column_key.checked_sub(1)) {
                    (Some(r), Some(c)) => model.score(r as usize, c as usize),
                    _ => None,
                };
                let score = score.unwrap_or_else(|| {
                    tracing::warn!(
                        "No factors for {row_column}={row_key}, {column}={column_key}; scoring 0"
                    );
                    0.0
                });
                row.insert(SCORE_COLUMN, Value::Float(score));
            }
            Self::SdcaMaximumEntropy { features, model } => {
                let proba = model.predict_proba(row.vector(features)?);
                let best = sdca::argmax(&proba);
                row.insert(PREDICTED_LABEL_COLUMN, Value::Key(best as u32 + 1));
                row.insert(SCORE_COLUMN, Value::Vector(proba));
            }
            Self::MapKeyToValue {
                input,
                output,
                vocabulary,
            } => {
                let value = vocabulary
                    .value_of(row.key(input)?)
                    .map(|value| value.to_value())
                    .unwrap_or_else(|| Value::Text(String::new()));
                row.insert(output, value);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), PipelineError> {
        let result = match self {
            Self::MatrixFactorization { model, .. } => model.validate(),
            Self::SdcaMaximumEntropy { model, .. } => model.validate(),
            _ => Ok(()),
        };
        result.map_err(|message| PipelineError::InvalidModel {
            stage: self.name(),
            message,
        })
    }
}

/// Fitted stages in application order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    pub stages: Vec<FittedStage>,
}

impl FittedPipeline {
    /// Run a row through every stage.
    pub fn transform(&self, row: &mut Row) -> Result<(), PipelineError> {
        for stage in &self.stages {
            stage.apply(row)?;
        }
        Ok(())
    }

    /// Check learned state of every stage.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.stages.iter().try_for_each(FittedStage::validate)
    }

    /// Vocabulary of the key encoder writing `column`, if any.
    pub fn key_vocabulary(&self, column: &str) -> Option<&KeyVocabulary> {
        find_encoder(&self.stages, column)
    }
}

fn find_encoder<'a>(stages: &'a [FittedStage], column: &str) -> Option<&'a KeyVocabulary> {
    stages.iter().rev().find_map(|stage| match stage {
        FittedStage::MapValueToKey {
            output, vocabulary, ..
        } if output == column => Some(vocabulary),
        _ => None,
    })
}

/// Number of keys a column can take: the encoder's vocabulary size, or the
/// largest key seen when no encoder is known.
fn key_cardinality(fitted: &[FittedStage], rows: &[Row], column: &str) -> Result<usize, PipelineError> {
    if let Some(vocabulary) = find_encoder(fitted, column) {
        return Ok(vocabulary.len());
    }
    let mut max = 0u32;
    for row in rows {
        max = max.max(row.key(column)?);
    }
    Ok(max as usize)
}

fn fit_stage(
    spec: &StageSpec,
    context: &TrainingContext,
    rows: &[Row],
    fitted: &[FittedStage],
) -> Result<FittedStage, PipelineError> {
    let training_error = |message: String| PipelineError::Training {
        stage: spec.name(),
        message,
    };
    match spec {
        StageSpec::MapValueToKey { input, output } => {
            let vocabulary = KeyVocabulary::fit(rows.iter().filter_map(|row| row.get(input)));
            tracing::debug!("{input} -> {output}: {} distinct values", vocabulary.len());
            Ok(FittedStage::MapValueToKey {
                input: input.clone(),
                output: output.clone(),
                vocabulary,
            })
        }
        StageSpec::FeaturizeText {
            input,
            output,
            options,
        } => {
            let mut texts = Vec::with_capacity(rows.len());
            for row in rows {
                if row.get(input).is_some() {
                    texts.push(row.text(input)?);
                }
            }
            let featurizer = TextFeaturizer::fit(options.clone(), texts);
            tracing::debug!("{input} -> {output}: {} grams", featurizer.dimension());
            Ok(FittedStage::FeaturizeText {
                input: input.clone(),
                output: output.clone(),
                featurizer,
            })
        }
        StageSpec::MatrixFactorization {
            row,
            column,
            label,
            options,
        } => {
            let mut entries = Vec::with_capacity(rows.len());
            for data in rows {
                let (r, c) = (data.key(row)?, data.key(column)?);
                if r == 0 || c == 0 {
                    continue;
                }
                entries.push(mf::Interaction {
                    row: r as usize - 1,
                    column: c as usize - 1,
                    label: data.float(label)?,
                });
            }
            let dataset = mf::TrainDataset {
                rows: key_cardinality(fitted, rows, row)?,
                columns: key_cardinality(fitted, rows, column)?,
                entries,
            };
            let options = mf::TrainOptions {
                seed: context.seed_or(options.seed),
                ..options.clone()
            };
            let model = mf::train_matrix_factorization(&dataset, &options).map_err(training_error)?;
            Ok(FittedStage::MatrixFactorization {
                row: row.clone(),
                column: column.clone(),
                model,
            })
        }
        StageSpec::SdcaMaximumEntropy {
            label,
            features,
            options,
        } => {
            let mut x = Vec::with_capacity(rows.len());
            let mut y = Vec::with_capacity(rows.len());
            for row in rows {
                let key = row.key(label)?;
                if key == 0 {
                    continue;
                }
                x.push(row.vector(features)?.to_vec());
                y.push(key as usize - 1);
            }
            let dataset = sdca::TrainDataset {
                n_classes: key_cardinality(fitted, rows, label)?,
                x,
                y,
            };
            let options = sdca::TrainOptions {
                seed: context.seed_or(options.seed),
                ..options.clone()
            };
            let model =
                sdca::train_sdca_maximum_entropy(&dataset, &options).map_err(training_error)?;
            Ok(FittedStage::SdcaMaximumEntropy {
                features: features.clone(),
                model,
            })
        }
        StageSpec::MapKeyToValue {
            input,
            output,
            source,
        } => {
            let vocabulary =
                find_encoder(fitted, source)
                    .cloned()
                    .ok_or_else(|| PipelineError::UnknownSource {
                        stage: spec.name(),
                        column: source.clone(),
                    })?;
            Ok(FittedStage::MapKeyToValue {
                input: input.clone(),
                output: output.clone(),
                vocabulary,
            })
        }
    }
}
