//! Labeled word download from a word-association service.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::WordSample;
use crate::http_client::{self, HttpError};

/// Default word-association endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.datamuse.com/";
/// Default number of words requested per category.
pub const DEFAULT_MAX_WORDS: usize = 80;

const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Failed to read categories from {path}: {source}")]
    Categories {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid request URL for category {category}: {source}")]
    Url {
        category: String,
        source: url::ParseError,
    },
    #[error("Fetching words for {category} failed: {source}")]
    Http {
        category: String,
        source: HttpError,
    },
}

/// Split a `", "`-joined category list into lower-case names.
pub fn parse_categories(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(", ")
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse the category resource file.
pub fn load_categories(path: &Path) -> Result<Vec<String>, AcquisitionError> {
    let text = std::fs::read_to_string(path).map_err(|source| AcquisitionError::Categories {
        path: path.to_path_buf(),
        source,
    })?;
    let categories = parse_categories(&text);
    tracing::info!("Loaded {} categories from {}", categories.len(), path.display());
    Ok(categories)
}

/// One result of the query; `score` and `tags` are ignored.
#[derive(Debug, Deserialize)]
struct WordEntry {
    word: String,
}

/// Blocking client for the `words?topics=` query.
#[derive(Debug, Clone)]
pub struct WordAssociationClient {
    base_url: Url,
    max_words: usize,
}

impl WordAssociationClient {
    pub fn new(base_url: Url, max_words: usize) -> Self {
        Self {
            base_url,
            max_words,
        }
    }

    fn request_url(&self, category: &str) -> Result<Url, AcquisitionError> {
        let mut url = self
            .base_url
            .join("words")
            .map_err(|source| AcquisitionError::Url {
                category: category.to_string(),
                source,
            })?;
        url.query_pairs_mut()
            .append_pair("topics", category)
            .append_pair("max", &self.max_words.to_string());
        Ok(url)
    }

    /// Fetch up to `max_words` single-word entries related to `category`.
    pub fn fetch_category(&self, category: &str) -> Result<Vec<WordSample>, AcquisitionError> {
        let url = self.request_url(category)?;
        let entries: Vec<WordEntry> = http_client::get_json(url.as_str(), MAX_RESPONSE_BYTES)
            .map_err(|source| AcquisitionError::Http {
                category: category.to_string(),
                source,
            })?;
        let total = entries.len();
        let samples: Vec<WordSample> = entries
            .into_iter()
            .filter(|entry| !entry.word.chars().any(char::is_whitespace))
            .map(|entry| WordSample::new(category, entry.word))
            .collect();
        tracing::debug!("{category}: kept {} of {total} words", samples.len());
        Ok(samples)
    }

    /// Fetch every category in order and concatenate the results.
    pub fn fetch_all(&self, categories: &[String]) -> Result<Vec<WordSample>, AcquisitionError> {
        let mut samples = Vec::new();
        for category in categories {
            samples.extend(self.fetch_category(category)?);
        }
        tracing::info!(
            "Fetched {} words across {} categories",
            samples.len(),
            categories.len()
        );
        Ok(samples)
    }
}
