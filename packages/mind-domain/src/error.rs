use crate::pipeline::Stage;

/// Malformed input rejected before it reaches a mood graph.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("Invalid {field}: {message}")]
pub struct ValidationError {
	pub field: &'static str,
	pub message: String,
}
impl ValidationError {
	pub fn new(field: &'static str, message: impl Into<String>) -> Self {
		Self { field, message: message.into() }
	}
}

/// An agent could not produce its output.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("Stage {stage} failed: {message}")]
pub struct StageError {
	pub stage: Stage,
	pub message: String,
}
impl StageError {
	pub fn new(stage: Stage, message: impl Into<String>) -> Self {
		Self { stage, message: message.into() }
	}
}
