use std::path::{Path, PathBuf};

use studyml::dataset::{UserLessonInteraction, WordSample, write_if_missing};

/// Interactions of scenario A: `u1` on lessons 1, 2, 3 and `u2` on 2, 4.
pub fn scenario_a_interactions() -> Vec<UserLessonInteraction> {
    vec![
        UserLessonInteraction::new("u1", 1),
        UserLessonInteraction::new("u1", 2),
        UserLessonInteraction::new("u1", 3),
        UserLessonInteraction::new("u2", 2),
        UserLessonInteraction::new("u2", 4),
    ]
}

/// Words of scenario B: two fruits and two vehicles.
pub fn scenario_b_words() -> Vec<WordSample> {
    vec![
        WordSample::new("fruit", "apple"),
        WordSample::new("fruit", "banana"),
        WordSample::new("vehicle", "car"),
        WordSample::new("vehicle", "truck"),
    ]
}

pub fn write_csv<T: studyml::pipeline::Record>(dir: &Path, name: &str, records: &[T]) -> PathBuf {
    let path = dir.join(name);
    assert!(write_if_missing(&path, records).unwrap());
    path
}
