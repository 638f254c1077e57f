//! Low-rank matrix factorization for (row, column) interaction data.
//!
//! Supports plain squared-loss regression over observed cells and the
//! one-class variant for implicit feedback, where every unobserved cell is a
//! weak negative example.

mod model;
mod train;

pub use model::MatrixFactorizationModel;
pub use train::{Interaction, LossFunction, TrainDataset, TrainOptions, train_matrix_factorization};
