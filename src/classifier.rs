//! Word-category classifier: text features into a multiclass SDCA model.

use std::path::Path;

use crate::config::ClassifierSettings;
use crate::dataset::{WordAssociationClient, WordSample, load_categories, load_records, write_if_missing};
use crate::ml::metrics::{ConfusionMatrix, accuracy};
use crate::pipeline::artifact;
use crate::pipeline::{
    DataView, Estimator, FittedPipeline, PREDICTED_LABEL_COLUMN, PipelineError, Prediction,
    PredictionEngine, Row, SCORE_COLUMN, StageSpec, TrainingContext,
};
use crate::workflow::WorkflowError;

pub const LABEL_COLUMN: &str = "Label";
pub const FEATURES_COLUMN: &str = "Features";

/// Predicted category of one word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPrediction {
    pub word: String,
    pub category: String,
    /// Probability of the predicted category.
    pub confidence: f32,
}

impl Prediction for WordPrediction {
    fn from_row(row: &Row) -> Result<Self, PipelineError> {
        let confidence = row
            .vector(SCORE_COLUMN)?
            .iter()
            .copied()
            .fold(0.0f32, f32::max);
        Ok(Self {
            word: row.text(WordSample::WORD)?.to_string(),
            category: row.text(PREDICTED_LABEL_COLUMN)?.to_string(),
            confidence,
        })
    }
}

pub fn estimator(settings: &ClassifierSettings) -> Estimator {
    Estimator::new()
        .append(StageSpec::map_value_to_key(LABEL_COLUMN, WordSample::CATEGORY))
        .append(StageSpec::featurize_text(FEATURES_COLUMN, WordSample::WORD))
        .append(StageSpec::SdcaMaximumEntropy {
            label: LABEL_COLUMN.to_string(),
            features: FEATURES_COLUMN.to_string(),
            options: settings.train_options(),
        })
        .append(StageSpec::map_key_to_value(
            PREDICTED_LABEL_COLUMN,
            PREDICTED_LABEL_COLUMN,
            LABEL_COLUMN,
        ))
}

/// Download words for every category unless the data file already exists.
///
/// Returns `true` when a new data file was written.
pub fn acquire(settings: &ClassifierSettings) -> Result<bool, WorkflowError> {
    if settings.data_file.exists() {
        tracing::info!(
            "Using existing word data {}",
            settings.data_file.display()
        );
        return Ok(false);
    }
    let categories = load_categories(&settings.categories_file)?;
    let client = WordAssociationClient::new(settings.api_base_url()?, settings.max_words);
    let samples = client.fetch_all(&categories)?;
    Ok(write_if_missing(&settings.data_file, &samples)?)
}

/// Fit on the words in `data_path` and write the artifact to `model_path`.
pub fn train(
    settings: &ClassifierSettings,
    data_path: &Path,
    model_path: &Path,
) -> Result<FittedPipeline, WorkflowError> {
    let records: Vec<WordSample> = load_records(data_path)?;
    tracing::info!(
        "Training word classifier on {} words from {}",
        records.len(),
        data_path.display()
    );
    let data = DataView::from_records(&records);
    let context = TrainingContext::with_seed(settings.seed);
    let fitted = estimator(settings).fit(&context, &data)?;
    log_training_accuracy(&fitted, &data)?;
    artifact::save(model_path, &fitted, &data.schema)?;
    Ok(fitted)
}

/// Train only when no artifact exists at `model_path`, or when `retrain` is set.
///
/// Returns `true` when a new artifact was written.
pub fn ensure_trained(
    settings: &ClassifierSettings,
    data_path: &Path,
    model_path: &Path,
    retrain: bool,
) -> Result<bool, WorkflowError> {
    if model_path.exists() && !retrain {
        tracing::info!("Reusing existing model {}", model_path.display());
        return Ok(false);
    }
    train(settings, data_path, model_path)?;
    Ok(true)
}

/// Reload the artifact and classify each word in order.
pub fn score(model_path: &Path, words: &[String]) -> Result<Vec<WordPrediction>, WorkflowError> {
    let engine: PredictionEngine<WordSample, WordPrediction> =
        PredictionEngine::new(artifact::load(model_path)?)?;
    let mut predictions = Vec::with_capacity(words.len());
    for word in words {
        predictions.push(engine.predict(&WordSample::unlabeled(word.as_str()))?);
    }
    Ok(predictions)
}

/// Acquire data, train if needed, then classify the configured sample words.
pub fn run(settings: &ClassifierSettings, retrain: bool) -> Result<Vec<WordPrediction>, WorkflowError> {
    acquire(settings)?;
    ensure_trained(settings, &settings.data_file, &settings.model_file, retrain)?;
    score(&settings.model_file, &settings.samples)
}

/// Console block for one prediction.
pub fn format_prediction(prediction: &WordPrediction) -> String {
    format!(
        "{}\nContent: {}\nPrediction: {}",
        "-".repeat(60),
        prediction.word,
        prediction.category
    )
}

fn log_training_accuracy(fitted: &FittedPipeline, data: &DataView) -> Result<(), PipelineError> {
    let Some(labels) = fitted.key_vocabulary(LABEL_COLUMN) else {
        return Ok(());
    };
    let mut matrix = ConfusionMatrix::new(labels.len());
    for source in &data.rows {
        let mut row = source.clone();
        fitted.transform(&mut row)?;
        let truth = row.key(LABEL_COLUMN)?;
        let predicted = row
            .get(PREDICTED_LABEL_COLUMN)
            .map(|value| labels.key_of(value))
            .unwrap_or(0);
        if let (Some(truth), Some(predicted)) = (truth.checked_sub(1), predicted.checked_sub(1)) {
            matrix.add(truth as usize, predicted as usize);
        }
    }
    tracing::info!(
        "Training accuracy {:.3} over {} words, {} categories",
        accuracy(&matrix),
        matrix.total(),
        labels.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn samples() -> Vec<WordSample> {
        let mut samples = Vec::new();
        for word in ["apple", "banana", "cherry", "grape"] {
            samples.push(WordSample::new("fruit", word));
        }
        for word in ["car", "truck", "bus", "bicycle"] {
            samples.push(WordSample::new("vehicle", word));
        }
        samples
    }

    #[test]
    fn ensure_trained_skips_existing_artifact() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("words.csv");
        let model_path = dir.path().join("model.zip");
        write_if_missing(&data_path, &samples()).unwrap();
        let settings = ClassifierSettings::default();

        assert!(ensure_trained(&settings, &data_path, &model_path, false).unwrap());
        let first = std::fs::read(&model_path).unwrap();
        assert!(!ensure_trained(&settings, &data_path, &model_path, false).unwrap());
        assert_eq!(std::fs::read(&model_path).unwrap(), first);
        assert!(ensure_trained(&settings, &data_path, &model_path, true).unwrap());
    }

    #[test]
    fn training_words_map_back_to_their_category() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("words.csv");
        let model_path = dir.path().join("model.zip");
        write_if_missing(&data_path, &samples()).unwrap();
        train(&ClassifierSettings::default(), &data_path, &model_path).unwrap();

        let predictions = score(&model_path, &["truck".to_string(), "apple".to_string()]).unwrap();
        assert_eq!(predictions[0].category, "vehicle");
        assert_eq!(predictions[1].category, "fruit");
        assert!(predictions.iter().all(|p| p.confidence > 0.5 && p.confidence <= 1.0));
    }

    #[test]
    fn acquire_keeps_existing_data_without_fetching() {
        let dir = tempdir().unwrap();
        let settings = ClassifierSettings {
            data_file: dir.path().join("words.csv"),
            categories_file: dir.path().join("missing.txt"),
            ..ClassifierSettings::default()
        };
        std::fs::write(&settings.data_file, "Category,Word\nfruit,apple\n").unwrap();
        assert!(!acquire(&settings).unwrap());
    }

    #[test]
    fn prediction_block_has_separator_and_labels() {
        let block = format_prediction(&WordPrediction {
            word: "cat".into(),
            category: "animals".into(),
            confidence: 0.9,
        });
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "-".repeat(60));
        assert_eq!(lines[1], "Content: cat");
        assert_eq!(lines[2], "Prediction: animals");
    }
}
