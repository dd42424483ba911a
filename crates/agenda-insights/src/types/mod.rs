//! Core data types for the agenda pipeline

pub mod outcome;
pub mod project;

pub use outcome::{PipelineOutcome, Stage};
pub use project::{Category, ProjectRecord, RawProjectData};
