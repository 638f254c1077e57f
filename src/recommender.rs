//! Lesson recommender: one-class matrix factorization over (user, lesson) pairs.
//!
//! Training always rebuilds the artifact from the interaction file.

use std::path::Path;

use crate::config::{LessonProbe, RecommenderSettings};
use crate::dataset::{UserLessonInteraction, load_records};
use crate::pipeline::artifact;
use crate::pipeline::{
    DataView, Estimator, FittedPipeline, Prediction, PipelineError, PredictionEngine, Row,
    SCORE_COLUMN, StageSpec, TrainingContext,
};
use crate::workflow::WorkflowError;

pub const USER_KEY_COLUMN: &str = "userIdEncoded";
pub const LESSON_KEY_COLUMN: &str = "lessonIdEncoded";

/// Affinity of a user for a lesson. Higher means more likely to engage.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonScore {
    pub user_id: String,
    pub lesson_id: i64,
    pub score: f32,
}

impl Prediction for LessonScore {
    fn from_row(row: &Row) -> Result<Self, PipelineError> {
        Ok(Self {
            user_id: row.text(UserLessonInteraction::USER_ID)?.to_string(),
            lesson_id: row.int(UserLessonInteraction::LESSON_ID)?,
            score: row.float(SCORE_COLUMN)?,
        })
    }
}

impl From<&LessonProbe> for UserLessonInteraction {
    fn from(probe: &LessonProbe) -> Self {
        UserLessonInteraction::new(probe.user_id.clone(), probe.lesson_id)
    }
}

/// Key both ids, then factorize the lesson x user matrix.
pub fn estimator(settings: &RecommenderSettings) -> Estimator {
    Estimator::new()
        .append(StageSpec::map_value_to_key(
            USER_KEY_COLUMN,
            UserLessonInteraction::USER_ID,
        ))
        .append(StageSpec::map_value_to_key(
            LESSON_KEY_COLUMN,
            UserLessonInteraction::LESSON_ID,
        ))
        .append(StageSpec::MatrixFactorization {
            row: LESSON_KEY_COLUMN.to_string(),
            column: USER_KEY_COLUMN.to_string(),
            label: UserLessonInteraction::LABEL.to_string(),
            options: settings.train_options(),
        })
}

/// Fit on the interactions in `data_path` and write the artifact to `model_path`.
pub fn train(
    settings: &RecommenderSettings,
    data_path: &Path,
    model_path: &Path,
) -> Result<FittedPipeline, WorkflowError> {
    let records: Vec<UserLessonInteraction> = load_records(data_path)?;
    tracing::info!(
        "Training lesson recommender on {} interactions from {}",
        records.len(),
        data_path.display()
    );
    let data = DataView::from_records(&records);
    let fitted = estimator(settings).fit(&TrainingContext::default(), &data)?;
    artifact::save(model_path, &fitted, &data.schema)?;
    Ok(fitted)
}

/// Reload the artifact and score each pair in order.
pub fn score(
    model_path: &Path,
    inputs: &[UserLessonInteraction],
) -> Result<Vec<LessonScore>, WorkflowError> {
    let engine: PredictionEngine<UserLessonInteraction, LessonScore> =
        PredictionEngine::new(artifact::load(model_path)?)?;
    let mut scores = Vec::with_capacity(inputs.len());
    for input in inputs {
        scores.push(engine.predict(input)?);
    }
    Ok(scores)
}

/// Retrain from the configured data file and score the configured probes.
pub fn run(settings: &RecommenderSettings) -> Result<Vec<LessonScore>, WorkflowError> {
    train(settings, &settings.data_file, &settings.model_file)?;
    let probes: Vec<UserLessonInteraction> = settings.samples.iter().map(Into::into).collect();
    score(&settings.model_file, &probes)
}

/// Console line for one score.
pub fn format_score(score: &LessonScore) -> String {
    format!(
        "User: {}, Lesson: {}, Score: {}",
        score.user_id, score.lesson_id, score.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::write_if_missing;
    use tempfile::tempdir;

    fn interactions() -> Vec<UserLessonInteraction> {
        let mut records = Vec::new();
        for user in ["a", "b", "c"] {
            for lesson in [1, 2] {
                records.push(UserLessonInteraction::new(user, lesson));
            }
        }
        records.push(UserLessonInteraction::new("d", 3));
        records
    }

    #[test]
    fn trained_artifact_scores_pairs_in_input_order() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("interactions.csv");
        let model_path = dir.path().join("model.zip");
        write_if_missing(&data_path, &interactions()).unwrap();

        let fitted = train(&RecommenderSettings::default(), &data_path, &model_path).unwrap();
        assert_eq!(fitted.stages.len(), 3);

        let inputs = vec![
            UserLessonInteraction::new("a", 2),
            UserLessonInteraction::new("a", 3),
        ];
        let scores = score(&model_path, &inputs).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].lesson_id, 2);
        assert_eq!(scores[1].lesson_id, 3);
        assert!(scores.iter().all(|s| s.score.is_finite()));
    }

    #[test]
    fn unseen_ids_score_zero() {
        let dir = tempdir().unwrap();
        let data_path = dir.path().join("interactions.csv");
        let model_path = dir.path().join("model.zip");
        write_if_missing(&data_path, &interactions()).unwrap();
        train(&RecommenderSettings::default(), &data_path, &model_path).unwrap();

        let scores = score(&model_path, &[UserLessonInteraction::new("nobody", 999)]).unwrap();
        assert_eq!(scores[0].score, 0.0);
        assert_eq!(scores[0].user_id, "nobody");
    }

    #[test]
    fn score_line_matches_console_format() {
        let line = format_score(&LessonScore {
            user_id: "u".into(),
            lesson_id: 26,
            score: 0.5,
        });
        assert_eq!(line, "User: u, Lesson: 26, Score: 0.5");
    }
}
