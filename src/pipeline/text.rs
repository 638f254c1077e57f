//! Bag-of-n-grams text featurizer.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::encoding::KeyVocabulary;
use super::schema::Value;

static WORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("static word token pattern"));

const WORD_PREFIX: &str = "w:";
const CHAR_PREFIX: &str = "c:";
const BOW: char = '<';
const EOW: char = '>';

/// How raw text is broken into grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFeaturizerOptions {
    /// Lower-case text before tokenizing.
    pub lowercase: bool,
    /// Emit one gram per word token.
    pub word_unigrams: bool,
    /// Character n-gram length over `<token>`; `0` disables character grams.
    pub char_ngram_length: usize,
    /// Scale each vector to unit L2 norm.
    pub l2_normalize: bool,
}

impl Default for TextFeaturizerOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            word_unigrams: true,
            char_ngram_length: 3,
            l2_normalize: true,
        }
    }
}

/// Fitted featurizer: a gram vocabulary plus the options that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFeaturizer {
    pub options: TextFeaturizerOptions,
    pub grams: KeyVocabulary,
}

impl TextFeaturizer {
    /// Learn the gram vocabulary from training texts.
    pub fn fit<'a>(options: TextFeaturizerOptions, texts: impl IntoIterator<Item = &'a str>) -> Self {
        let grams: Vec<Value> = texts
            .into_iter()
            .flat_map(|text| extract_grams(&options, text))
            .map(Value::Text)
            .collect();
        let grams = KeyVocabulary::fit(grams.iter());
        Self { options, grams }
    }

    /// Length of every vector produced by [`TextFeaturizer::transform`].
    pub fn dimension(&self) -> usize {
        self.grams.len()
    }

    /// Count known grams into a fixed-length vector. Unknown grams are dropped,
    /// so text made only of unseen grams yields the zero vector.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut features = vec![0.0f32; self.dimension()];
        for gram in extract_grams(&self.options, text) {
            let key = self.grams.key_of(&Value::Text(gram));
            if key > 0 {
                features[key as usize - 1] += 1.0;
            }
        }
        if self.options.l2_normalize {
            let norm = features.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut features {
                    *value /= norm;
                }
            }
        }
        features
    }
}

fn extract_grams(options: &TextFeaturizerOptions, text: &str) -> Vec<String> {
    let text = if options.lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    let mut grams = Vec::new();
    for token in WORD_TOKEN.find_iter(&text) {
        let token = token.as_str();
        if options.word_unigrams {
            grams.push(format!("{WORD_PREFIX}{token}"));
        }
        let n = options.char_ngram_length;
        if n == 0 {
            continue;
        }
        let marked: Vec<char> = std::iter::once(BOW)
            .chain(token.chars())
            .chain(std::iter::once(EOW))
            .collect();
        if marked.len() <= n {
            grams.push(format!("{CHAR_PREFIX}{}", marked.iter().collect::<String>()));
            continue;
        }
        for window in marked.windows(n) {
            grams.push(format!("{CHAR_PREFIX}{}", window.iter().collect::<String>()));
        }
    }
    grams
}
