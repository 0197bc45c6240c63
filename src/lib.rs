//! GTSRB dataset preparation
//!
//! This library converts GTSRB-style per-class CSV annotations into one XML
//! record per image plus a flat, renamed image corpus, and splits the resulting
//! annotation identifiers into train/val/test image sets.

pub mod config;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod gtsrb_dataset;
pub mod io;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use config::{ConvertArgs, DatasetLayout, SplitArgs, SplitConfig};
pub use conversion::convert_to_xml;
pub use dataset::{process_split, split_identifiers};
pub use error::DevkitError;
pub use gtsrb_dataset::process_dataset;
pub use io::setup_output_directories;
pub use types::{AnnotationRecord, GtsrbRow, ProcessingStats, SplitData};
