use thiserror::Error;

use crate::config::ConfigError;
use crate::dataset::{AcquisitionError, DatasetError};
use crate::pipeline::PipelineError;
use crate::pipeline::artifact::ArtifactError;

/// Any failure of a train or score run.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
