use std::marker::PhantomData;

use super::PipelineError;
use super::artifact::Artifact;
use super::schema::{Prediction, Record, Row};
use super::stage::FittedPipeline;

/// Single-record predictor bound to a loaded pipeline.
///
/// Stateless between calls, so one engine serves every input of a run.
#[derive(Debug)]
pub struct PredictionEngine<I, O> {
    pipeline: FittedPipeline,
    _io: PhantomData<fn(&I) -> O>,
}

impl<I: Record, O: Prediction> PredictionEngine<I, O> {
    /// Bind to an artifact, refusing inputs whose schema differs from the
    /// training schema.
    pub fn new(artifact: Artifact) -> Result<Self, PipelineError> {
        artifact.schema.ensure_compatible(&I::schema())?;
        Ok(Self {
            pipeline: artifact.pipeline,
            _io: PhantomData,
        })
    }

    /// Run one record through the fitted stages and read the typed output.
    pub fn predict(&self, input: &I) -> Result<O, PipelineError> {
        O::from_row(&self.predict_row(input)?)
    }

    /// Like [`PredictionEngine::predict`] but returns every column.
    pub fn predict_row(&self, input: &I) -> Result<Row, PipelineError> {
        let mut row = input.to_row();
        self.pipeline.transform(&mut row)?;
        Ok(row)
    }
}
