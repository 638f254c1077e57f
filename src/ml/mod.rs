//! Trainers and fitted models used by the pipeline stages.
//!
//! Models work on dense indices and plain `f32` slices; the `pipeline` module
//! is responsible for turning typed rows into that shape.

pub mod matrix_factorization;
pub mod metrics;
pub mod sdca;
