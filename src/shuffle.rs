use crate::chunking::reader::{read_bucket_file, walk_buckets};
use crate::codec::{encode_point, POINT_RECORD_BYTES};
use crate::error::{Error, Result};
use log::info;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

// Randomizing rewrite of every bucket file so downstream LOD sampling can take
// any prefix as an unbiased subset. Buckets share no state once ingestion has
// closed, so the pass runs one task per file.
pub fn shuffle_buckets(root: &Path) -> Result<u64> {
	let buckets = walk_buckets(root)?;
	let counts: Result<Vec<u64>> = buckets
		.par_iter()
		.map(|bucket| shuffle_file(&bucket.file))
		.collect();
	let total = counts?.iter().sum();
	info!("shuffled {} points across {} buckets", total, buckets.len());
	Ok(total)
}

fn shuffle_file(path: &Path) -> Result<u64> {
	let mut points = read_bucket_file(path)?;
	points.shuffle(&mut rand::thread_rng());

	let mut bytes = Vec::with_capacity(points.len() * POINT_RECORD_BYTES);
	for point in &points {
		bytes.extend_from_slice(&encode_point(point));
	}
	fs::write(path, &bytes).map_err(|e| Error::io(path, e))?;
	Ok(points.len() as u64)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::point::PointRecord;
	use std::path::PathBuf;

	fn temp_root(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("gaia-shuffle-{}-{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn test_shuffle_preserves_the_record_multiset() {
		let root = temp_root("multiset");
		let dir = root.join("12").join("3").join("4");
		fs::create_dir_all(&dir).unwrap();
		let file = dir.join("bucket.bin");

		let points: Vec<PointRecord> = (0u16..997)
			.map(|i| PointRecord {
				x: i as f64,
				y: -(i as f64),
				z: 0.5,
				r: 0,
				g: 0,
				b: 0,
				a: 255,
				intensity: i,
				classification: 0,
			})
			.collect();
		let mut bytes = Vec::new();
		for point in &points {
			bytes.extend_from_slice(&encode_point(point));
		}
		fs::write(&file, &bytes).unwrap();
		let len_before = fs::metadata(&file).unwrap().len();

		let shuffled = shuffle_buckets(&root).unwrap();
		assert_eq!(shuffled, 997);
		assert_eq!(fs::metadata(&file).unwrap().len(), len_before);

		let mut tags: Vec<u16> = read_bucket_file(&file)
			.unwrap()
			.iter()
			.map(|p| p.intensity)
			.collect();
		tags.sort_unstable();
		let expected: Vec<u16> = (0..997).collect();
		assert_eq!(tags, expected);
	}
}
