//! Library exports shared by the command-line utilities, tests and benchmarks.
/// Application directory helpers.
pub mod app_dirs;
/// Word-category classifier workflow.
pub mod classifier;
/// TOML configuration.
pub mod config;
/// Record types, CSV files and word download.
pub mod dataset;
/// Shared HTTP agent.
pub mod http_client;
/// Logging setup.
pub mod logging;
/// Hand-written trainers and metrics.
pub mod ml;
/// Train, persist and score toolkit.
pub mod pipeline;
/// Lesson recommender workflow.
pub mod recommender;
mod workflow;

pub use workflow::WorkflowError;
