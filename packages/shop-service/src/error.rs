pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search query must not be empty.")]
	EmptyQuery,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error(transparent)]
	PhoneticTable(#[from] shop_domain::Error),
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}

	pub(crate) fn item_not_found(item_id: uuid::Uuid) -> Self {
		Self::NotFound { message: format!("Catalog item {item_id} does not exist.") }
	}
}

impl From<shop_storage::Error> for Error {
	fn from(err: shop_storage::Error) -> Self {
		match err {
			shop_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			shop_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			shop_storage::Error::NotFound(message) => Self::NotFound { message },
			shop_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
