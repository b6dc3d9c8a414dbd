pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid {dsn_env}: {source}")]
	Dsn { dsn_env: &'static str, source: sqlx::Error },
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Io(#[from] std::io::Error),
}
