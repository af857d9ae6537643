#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// Maps Postgres constraint violations onto the store's own variants.
	pub(crate) fn from_write(err: sqlx::Error) -> Self {
		let code = err.as_database_error().and_then(|db_err| db_err.code()).map(|c| c.into_owned());

		match code.as_deref() {
			Some("23505") => Self::Conflict(err.to_string()),
			Some("23503") => Self::InvalidArgument(err.to_string()),
			_ => Self::Sqlx(err),
		}
	}
}
