use crate::codec::{decode_point, POINT_RECORD_BYTES};
use crate::error::{Error, Result};
use crate::model::point::PointRecord;
use crate::tiling::TileAddress;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Bucket {
	pub tile: TileAddress,
	pub file: PathBuf,
}

// Strict 32-byte strides from offset 0 to end of file. A length that is not a
// multiple of the record size signals upstream corruption and aborts the run.
pub fn read_bucket_file(path: &Path) -> Result<Vec<PointRecord>> {
	let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
	if bytes.len() % POINT_RECORD_BYTES != 0 {
		return Err(Error::CorruptBucket {
			path: path.to_path_buf(),
			len: bytes.len() as u64,
		});
	}

	Ok(bytes
		.chunks_exact(POINT_RECORD_BYTES)
		.map(decode_point)
		.collect())
}

// Rediscovers every bucket under `root/<level>/<x>/<y>/bucket.bin`, recovering
// each tile address from its path. Non-numeric entries are skipped the same
// way stray files in a chunk directory are.
pub fn walk_buckets(root: &Path) -> Result<Vec<Bucket>> {
	let mut buckets = Vec::new();

	for level_entry in list_dir(root)? {
		let level: u8 = match parse_component(&level_entry) {
			Some(level) => level,
			None => continue,
		};
		for x_entry in list_dir(&level_entry)? {
			let x: u32 = match parse_component(&x_entry) {
				Some(x) => x,
				None => continue,
			};
			for y_entry in list_dir(&x_entry)? {
				let y: u32 = match parse_component(&y_entry) {
					Some(y) => y,
					None => continue,
				};
				let file = y_entry.join("bucket.bin");
				if file.is_file() {
					buckets.push(Bucket {
						tile: TileAddress { level, x, y },
						file,
					});
				}
			}
		}
	}

	Ok(buckets)
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>> {
	let mut entries = Vec::new();
	for entry in fs::read_dir(path).map_err(|e| Error::io(path, e))? {
		let entry = entry.map_err(|e| Error::io(path, e))?;
		if entry.path().is_dir() {
			entries.push(entry.path());
		}
	}
	entries.sort();
	Ok(entries)
}

fn parse_component<T: std::str::FromStr>(path: &Path) -> Option<T> {
	path.file_name()?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::encode_point;

	fn temp_root(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("gaia-reader-{}-{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn test_truncated_file_is_a_fatal_integrity_error() {
		let root = temp_root("corrupt");
		let file = root.join("bucket.bin");
		fs::write(&file, vec![0u8; 33]).unwrap();

		match read_bucket_file(&file) {
			Err(Error::CorruptBucket { len, .. }) => assert_eq!(len, 33),
			other => panic!("expected CorruptBucket, got {:?}", other.map(|p| p.len())),
		}
	}

	#[test]
	fn test_walk_recovers_tile_addresses() {
		let root = temp_root("walk");
		let point = PointRecord {
			x: 1.0,
			y: 2.0,
			z: 3.0,
			r: 0,
			g: 0,
			b: 0,
			a: 255,
			intensity: 0,
			classification: 0,
		};

		for (x, y) in [(17u32, 40u32), (18, 41)] {
			let dir = root.join("12").join(x.to_string()).join(y.to_string());
			fs::create_dir_all(&dir).unwrap();
			fs::write(dir.join("bucket.bin"), encode_point(&point)).unwrap();
		}
		// A stray non-numeric directory is ignored.
		fs::create_dir_all(root.join("12").join("notes")).unwrap();

		let mut buckets = walk_buckets(&root).unwrap();
		buckets.sort_by_key(|b| (b.tile.x, b.tile.y));
		assert_eq!(buckets.len(), 2);
		assert_eq!(buckets[0].tile, TileAddress { level: 12, x: 17, y: 40 });
		assert_eq!(buckets[1].tile, TileAddress { level: 12, x: 18, y: 41 });
	}
}
