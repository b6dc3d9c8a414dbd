use mind_domain::{StageError, ValidationError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<ValidationError> for Error {
	fn from(err: ValidationError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

impl From<mind_storage::Error> for Error {
	fn from(err: mind_storage::Error) -> Self {
		match err {
			mind_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			mind_storage::Error::Validation(inner) => Self::from(inner),
			mind_storage::Error::NotFound(message) => Self::NotFound { message },
			mind_storage::Error::Conflict(message) => Self::Conflict { message },
			mind_storage::Error::Serialization(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}

// Reports built outside the pipeline only fail on stored data the analyzer cannot read.
impl From<StageError> for Error {
	fn from(err: StageError) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
