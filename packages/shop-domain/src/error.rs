pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read phonetic table at {path:?}.")]
	ReadPhoneticTable { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse phonetic table.")]
	ParsePhoneticTable { source: toml::de::Error },
	#[error("Invalid phonetic table: {message}")]
	InvalidPhoneticTable { message: String },
}
