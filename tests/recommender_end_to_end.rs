mod support;

use studyml::WorkflowError;
use studyml::config::RecommenderSettings;
use studyml::dataset::{UserLessonInteraction, WordSample};
use studyml::pipeline::{PipelineError, PredictionEngine, artifact};
use studyml::{classifier::WordPrediction, recommender};
use support::fixtures::{scenario_a_interactions, write_csv};
use tempfile::tempdir;

#[test]
fn observed_lesson_outscores_lesson_seen_only_by_other_user() {
    let dir = tempdir().unwrap();
    let data = write_csv(dir.path(), "interactions.csv", &scenario_a_interactions());
    let model = dir.path().join("lessons.zip");
    recommender::train(&RecommenderSettings::default(), &data, &model).unwrap();

    let scores = recommender::score(
        &model,
        &[
            UserLessonInteraction::new("u1", 2),
            UserLessonInteraction::new("u1", 4),
        ],
    )
    .unwrap();
    assert!(scores[1].score.is_finite());
    assert!(
        scores[0].score > scores[1].score,
        "expected (u1, 2) = {} above (u1, 4) = {}",
        scores[0].score,
        scores[1].score
    );
}

#[test]
fn retraining_overwrites_the_artifact() {
    let dir = tempdir().unwrap();
    let data = write_csv(dir.path(), "interactions.csv", &scenario_a_interactions());
    let model = dir.path().join("lessons.zip");
    std::fs::write(&model, b"previous run").unwrap();

    let settings = RecommenderSettings {
        data_file: data,
        model_file: model.clone(),
        ..RecommenderSettings::default()
    };
    let scores = recommender::run(&settings).unwrap();
    assert_eq!(scores.len(), settings.samples.len());
    assert!(artifact::load(&model).is_ok());
}

#[test]
fn unseen_user_and_lesson_still_score() {
    let dir = tempdir().unwrap();
    let data = write_csv(dir.path(), "interactions.csv", &scenario_a_interactions());
    let model = dir.path().join("lessons.zip");
    recommender::train(&RecommenderSettings::default(), &data, &model).unwrap();

    let scores = recommender::score(
        &model,
        &[
            UserLessonInteraction::new("u3", 1),
            UserLessonInteraction::new("u1", 99),
        ],
    )
    .unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|score| score.score == 0.0));
}

#[test]
fn engine_refuses_records_of_another_schema() {
    let dir = tempdir().unwrap();
    let data = write_csv(dir.path(), "interactions.csv", &scenario_a_interactions());
    let model = dir.path().join("lessons.zip");
    recommender::train(&RecommenderSettings::default(), &data, &model).unwrap();

    let loaded = artifact::load(&model).unwrap();
    let err = PredictionEngine::<WordSample, WordPrediction>::new(loaded).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
}

#[test]
fn empty_interaction_file_fails_to_train() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("interactions.csv");
    std::fs::write(&data, "UserId,LessonId,Label\n").unwrap();

    let err = recommender::train(
        &RecommenderSettings::default(),
        &data,
        &dir.path().join("lessons.zip"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Pipeline(PipelineError::EmptyDataset)
    ));
}
