use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// All I/O failures are fatal for the current run; a partially written bucket
// cannot be resumed without re-ingesting its source, so nothing here retries.
#[derive(Debug, Error)]
pub enum Error {
	#[error("i/o failure on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("bucket file {} is corrupt: {len} bytes is not a multiple of the record size", path.display())]
	CorruptBucket { path: PathBuf, len: u64 },

	#[error("metadata file {} could not be parsed: {source}", path.display())]
	Metadata {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("csv record could not be decoded: {0}")]
	Csv(#[from] csv::Error),
}

impl Error {
	pub fn io(path: &Path, source: std::io::Error) -> Error {
		Error::Io {
			path: path.to_path_buf(),
			source,
		}
	}
}
