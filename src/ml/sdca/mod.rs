//! Multiclass maximum-entropy (softmax) classifier trained with stochastic dual
//! coordinate ascent.
//!
//! - Linear scores over dense feature vectors plus a per-class bias.
//! - Seeded example order, so identical inputs give identical weights.
//! - JSON-serializable model for artifact persistence.

mod model;
mod train;

pub use model::{MaxEntModel, argmax, softmax};
pub use train::{TrainDataset, TrainOptions, train_sdca_maximum_entropy};
