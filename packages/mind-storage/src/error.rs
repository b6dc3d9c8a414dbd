use mind_domain::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
}
