use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::defaults::{
    default_alpha, default_api_base_url, default_c, default_categories_file,
    default_interactions_file, default_iterations, default_l2, default_lambda,
    default_lesson_probes, default_lessons_model_file, default_max_epochs, default_max_words,
    default_rank, default_sample_words, default_seed, default_words_file,
    default_words_model_file,
};
use crate::ml::matrix_factorization::{LossFunction, TrainOptions as MfOptions};
use crate::ml::sdca::TrainOptions as SdcaOptions;

/// Errors that may occur while loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// A setting holds a value the workflows cannot use.
    #[error("Invalid setting {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// A (user, lesson) pair scored after training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProbe {
    pub user_id: String,
    pub lesson_id: i64,
}

/// Settings of the lesson recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderSettings {
    /// Interaction CSV to train on.
    #[serde(default = "default_interactions_file")]
    pub data_file: PathBuf,
    /// Artifact written after training and read back for scoring.
    #[serde(default = "default_lessons_model_file")]
    pub model_file: PathBuf,
    #[serde(default = "default_rank")]
    pub rank: usize,
    /// Weight of unobserved cells.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default = "default_lambda")]
    pub lambda: f32,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Target value of unobserved cells.
    #[serde(default = "default_c")]
    pub c: f32,
    #[serde(default = "default_lesson_probes")]
    pub samples: Vec<LessonProbe>,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            data_file: default_interactions_file(),
            model_file: default_lessons_model_file(),
            rank: default_rank(),
            alpha: default_alpha(),
            lambda: default_lambda(),
            iterations: default_iterations(),
            c: default_c(),
            samples: default_lesson_probes(),
        }
    }
}

impl RecommenderSettings {
    /// Solver options for the one-class factorization.
    pub fn train_options(&self) -> MfOptions {
        MfOptions {
            loss: LossFunction::SquareLossOneClass,
            rank: self.rank,
            alpha: self.alpha,
            lambda: self.lambda,
            c: self.c,
            iterations: self.iterations,
            ..MfOptions::default()
        }
    }
}

/// Settings of the word classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Word CSV written after download and read for training.
    #[serde(default = "default_words_file")]
    pub data_file: PathBuf,
    #[serde(default = "default_words_model_file")]
    pub model_file: PathBuf,
    /// Text file listing categories separated by `", "`.
    #[serde(default = "default_categories_file")]
    pub categories_file: PathBuf,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Words requested per category.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_l2")]
    pub l2: f32,
    #[serde(default = "default_max_epochs")]
    pub max_epochs: usize,
    /// Words classified after training.
    #[serde(default = "default_sample_words")]
    pub samples: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            data_file: default_words_file(),
            model_file: default_words_model_file(),
            categories_file: default_categories_file(),
            api_base_url: default_api_base_url(),
            max_words: default_max_words(),
            seed: default_seed(),
            l2: default_l2(),
            max_epochs: default_max_epochs(),
            samples: default_sample_words(),
        }
    }
}

impl ClassifierSettings {
    pub fn train_options(&self) -> SdcaOptions {
        SdcaOptions {
            l2: self.l2,
            max_epochs: self.max_epochs,
            ..SdcaOptions::default()
        }
    }

    /// Parsed API base URL.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base_url).map_err(|err| ConfigError::Invalid {
            field: "classifier.api_base_url",
            message: err.to_string(),
        })
    }
}

/// Settings of both utilities, stored as `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudymlConfig {
    #[serde(default)]
    pub recommender: RecommenderSettings,
    #[serde(default)]
    pub classifier: ClassifierSettings,
}

impl StudymlConfig {
    /// Reject values the trainers or the fetcher cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, message: &str| {
            Err(ConfigError::Invalid {
                field,
                message: message.to_string(),
            })
        };
        let recommender = &self.recommender;
        if recommender.rank == 0 {
            return invalid("recommender.rank", "must be at least 1");
        }
        if recommender.iterations == 0 {
            return invalid("recommender.iterations", "must be at least 1");
        }
        if recommender.lambda.is_nan() || recommender.lambda < 0.0 {
            return invalid("recommender.lambda", "must be zero or positive");
        }
        if recommender.alpha.is_nan() || recommender.alpha < 0.0 {
            return invalid("recommender.alpha", "must be zero or positive");
        }
        if !recommender.c.is_finite() {
            return invalid("recommender.c", "must be finite");
        }

        let classifier = &self.classifier;
        if classifier.max_words == 0 {
            return invalid("classifier.max_words", "must be at least 1");
        }
        if classifier.l2.is_nan() || classifier.l2 <= 0.0 {
            return invalid("classifier.l2", "must be positive");
        }
        if classifier.max_epochs == 0 {
            return invalid("classifier.max_epochs", "must be at least 1");
        }
        classifier.api_base_url()?;
        Ok(())
    }
}
