use std::path::PathBuf;

use super::types::LessonProbe;
use crate::dataset::acquisition::{DEFAULT_API_BASE_URL, DEFAULT_MAX_WORDS};
use crate::ml::matrix_factorization::TrainOptions as MfOptions;
use crate::ml::sdca::TrainOptions as SdcaOptions;

const PROBE_USER: &str = "ee14a184-7282-49b8-bd9a-ade05693f6e4";
const PROBE_LESSONS: [i64; 6] = [26, 38, 51, 81, 75, 63];
const SAMPLE_WORDS: [&str; 10] = [
    "cat",
    "tennis",
    "building",
    "painting",
    "home",
    "shoes",
    "automobile",
    "brother",
    "waterfall",
    "occupation",
];

pub(super) fn default_interactions_file() -> PathBuf {
    PathBuf::from("judge-system-user-lessons.csv")
}

pub(super) fn default_lessons_model_file() -> PathBuf {
    PathBuf::from("JudgeSystemLessonsModel.zip")
}

pub(super) fn default_rank() -> usize {
    MfOptions::default().rank
}

pub(super) fn default_alpha() -> f32 {
    MfOptions::default().alpha
}

pub(super) fn default_lambda() -> f32 {
    MfOptions::default().lambda
}

pub(super) fn default_iterations() -> usize {
    MfOptions::default().iterations
}

pub(super) fn default_c() -> f32 {
    MfOptions::default().c
}

pub(super) fn default_lesson_probes() -> Vec<LessonProbe> {
    PROBE_LESSONS
        .iter()
        .map(|&lesson_id| LessonProbe {
            user_id: PROBE_USER.to_string(),
            lesson_id,
        })
        .collect()
}

pub(super) fn default_words_file() -> PathBuf {
    PathBuf::from("words-train-data.csv")
}

pub(super) fn default_words_model_file() -> PathBuf {
    PathBuf::from("WordsCategoryModel.zip")
}

pub(super) fn default_categories_file() -> PathBuf {
    PathBuf::from("resources/WordCategories.txt")
}

pub(super) fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

pub(super) fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

pub(super) fn default_seed() -> u64 {
    0
}

pub(super) fn default_l2() -> f32 {
    SdcaOptions::default().l2
}

pub(super) fn default_max_epochs() -> usize {
    SdcaOptions::default().max_epochs
}

pub(super) fn default_sample_words() -> Vec<String> {
    SAMPLE_WORDS.iter().map(|word| word.to_string()).collect()
}
