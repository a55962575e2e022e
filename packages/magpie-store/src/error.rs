pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {0}.")]
	NotFound(String),
	#[error("Conflict: {0}.")]
	Conflict(String),
}
