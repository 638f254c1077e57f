//! Training data: record types, CSV persistence and word download.

pub mod acquisition;
pub mod csv_file;
mod records;

pub use acquisition::{AcquisitionError, WordAssociationClient, load_categories, parse_categories};
pub use csv_file::{DatasetError, load_records, write_if_missing};
pub use records::{DEFAULT_INTERACTION_LABEL, UserLessonInteraction, WordSample};
