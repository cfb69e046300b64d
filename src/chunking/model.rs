use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// Written next to the bucket tree when ingestion closes, read back by the
// downstream passes that rebuild containers from bucket files.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct IngestMetadata {
	pub coarse_level: u8,
	pub point_count: u64,
	pub bucket_count: u64,
	pub min: [f64; 3],
	pub max: [f64; 3],
}

pub fn read_ingest_metadata(path: &Path) -> Result<IngestMetadata> {
	let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
	serde_json::from_str(&contents).map_err(|e| Error::Metadata {
		path: path.to_path_buf(),
		source: e,
	})
}
