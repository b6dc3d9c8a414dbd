//! Mood data model and the four pure analysis stages run by the pipeline coordinator.

pub mod analyzer;
pub mod graph;
pub mod insight;
pub mod label;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod time_serde;
pub mod validate;

mod error;

pub use error::{StageError, ValidationError};
