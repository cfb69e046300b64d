use crate::chunking::model::IngestMetadata;
use crate::chunking::pool::FileHandlePool;
use crate::codec::encode_point;
use crate::error::{Error, Result};
use crate::model::bounds::BoundingBox;
use crate::model::options::TilerOptions;
use crate::model::point::PointRecord;
use crate::tiling::GeographicTilingScheme;
use log::{debug, info};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

// Single-writer ingestion front end: tiles each point at the coarse level,
// buffers its encoding per bucket and flushes full buffers through the handle
// pool. The per-bucket buffers are not synchronized; callers on multiple
// threads must serialize access to one writer.
pub struct BucketWriter {
	scheme: GeographicTilingScheme,
	pool: FileHandlePool,
	root: PathBuf,
	coarse_level: u8,
	buffer_capacity: usize,
	buffers: HashMap<u32, Vec<u8>>,
	bounds: BoundingBox,
	point_count: u64,
}

impl BucketWriter {
	pub fn new(root: &Path, options: &TilerOptions) -> BucketWriter {
		BucketWriter {
			scheme: GeographicTilingScheme::global(),
			pool: FileHandlePool::new(root, options.coarse_level, options.max_open_files),
			root: root.to_path_buf(),
			coarse_level: options.coarse_level,
			buffer_capacity: options.write_buffer_capacity,
			buffers: HashMap::new(),
			bounds: BoundingBox::empty(),
			point_count: 0,
		}
	}

	pub fn add_point(&mut self, point: &PointRecord) -> Result<()> {
		self.bounds.expand(point);
		self.point_count += 1;

		let tile = self.scheme.position_to_tile(self.coarse_level, point.y, point.x);
		let bucket = tile.to_bucket_id();

		let capacity = self.buffer_capacity;
		let buffer = self
			.buffers
			.entry(bucket)
			.or_insert_with(|| Vec::with_capacity(capacity));
		buffer.extend_from_slice(&encode_point(point));

		if buffer.len() >= capacity {
			self.flush_bucket(bucket)?;
		}

		Ok(())
	}

	pub fn point_count(&self) -> u64 {
		self.point_count
	}

	pub fn bucket_count(&self) -> u64 {
		self.buffers.len() as u64
	}

	// Flushes every non-empty buffer, closes the pool and records the run in
	// `<root>/metadata.json` for the downstream passes.
	pub fn close(mut self) -> Result<IngestMetadata> {
		let buckets: Vec<u32> = self.buffers.keys().copied().collect();
		for bucket in buckets {
			self.flush_bucket(bucket)?;
		}
		self.pool.close()?;

		let (min, max) = if self.point_count == 0 {
			([0.0; 3], [0.0; 3])
		} else {
			(self.bounds.min.to_array(), self.bounds.max.to_array())
		};
		let metadata = IngestMetadata {
			coarse_level: self.coarse_level,
			point_count: self.point_count,
			bucket_count: self.buffers.len() as u64,
			min,
			max,
		};

		let path = self.root.join("metadata.json");
		let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
		serde_json::to_writer(file, &metadata).map_err(|e| Error::Metadata {
			path,
			source: e,
		})?;

		info!(
			"ingested {} points into {} buckets at level {}",
			metadata.point_count, metadata.bucket_count, metadata.coarse_level
		);
		Ok(metadata)
	}

	fn flush_bucket(&mut self, bucket: u32) -> Result<()> {
		let bytes = match self.buffers.get_mut(&bucket) {
			Some(buffer) if !buffer.is_empty() => std::mem::take(buffer),
			_ => return Ok(()),
		};

		debug!("flushing {} bytes to bucket {:#010x}", bytes.len(), bucket);
		self.pool.append(bucket, &bytes)?;

		// Hand the allocation back for the next fill.
		let mut bytes = bytes;
		bytes.clear();
		self.buffers.insert(bucket, bytes);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chunking::model::read_ingest_metadata;
	use crate::chunking::reader::{read_bucket_file, walk_buckets};
	use crate::codec::POINT_RECORD_BYTES;
	use std::fs;

	fn temp_root(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("gaia-writer-{}-{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	fn point_at(lon: f64, lat: f64, tag: u16) -> PointRecord {
		PointRecord {
			x: lon,
			y: lat,
			z: 42.0,
			r: 128,
			g: 128,
			b: 128,
			a: 255,
			intensity: tag,
			classification: 2,
		}
	}

	#[test]
	fn test_two_tiles_one_open_file() {
		let root = temp_root("two-tiles");
		let options = TilerOptions {
			coarse_level: 12,
			max_open_files: 1,
			// Tiny buffer so every point hits the pool and exercises eviction.
			write_buffer_capacity: POINT_RECORD_BYTES,
			..TilerOptions::default()
		};

		let mut writer = BucketWriter::new(&root, &options);
		// Ten points alternating between two far-apart tiles.
		for i in 0u16..10 {
			let lon = if i % 2 == 0 { -45.3 } else { 45.3 };
			writer.add_point(&point_at(lon, 10.1, i)).unwrap();
		}
		let metadata = writer.close().unwrap();
		assert_eq!(metadata.point_count, 10);
		assert_eq!(metadata.bucket_count, 2);

		let buckets = walk_buckets(&root).unwrap();
		assert_eq!(buckets.len(), 2);

		let scheme = GeographicTilingScheme::global();
		for bucket in &buckets {
			let len = fs::metadata(&bucket.file).unwrap().len();
			let points = read_bucket_file(&bucket.file).unwrap();
			assert_eq!(points.len() as u64 * POINT_RECORD_BYTES as u64, len);
			assert_eq!(points.len(), 5);
			// Every record landed in the bucket its position tiles to, in
			// arrival order.
			let mut last_tag = None;
			for point in &points {
				assert_eq!(scheme.position_to_tile(12, point.y, point.x), bucket.tile);
				if let Some(last) = last_tag {
					assert!(point.intensity > last);
				}
				last_tag = Some(point.intensity);
			}
		}
	}

	#[test]
	fn test_metadata_round_trip() {
		let root = temp_root("metadata");
		let options = TilerOptions {
			coarse_level: 10,
			..TilerOptions::default()
		};

		let mut writer = BucketWriter::new(&root, &options);
		writer.add_point(&point_at(127.0, 37.0, 1)).unwrap();
		writer.add_point(&point_at(127.1, 37.1, 2)).unwrap();
		let written = writer.close().unwrap();

		let restored = read_ingest_metadata(&root.join("metadata.json")).unwrap();
		assert_eq!(restored, written);
		assert_eq!(restored.coarse_level, 10);
		assert_eq!(restored.point_count, 2);
		assert_eq!(restored.min, [127.0, 37.0, 42.0]);
		assert_eq!(restored.max, [127.1, 37.1, 42.0]);
	}

	#[test]
	fn test_empty_run_still_writes_metadata() {
		let root = temp_root("empty");
		let writer = BucketWriter::new(&root, &TilerOptions::default());
		let metadata = writer.close().unwrap();
		assert_eq!(metadata.point_count, 0);
		assert_eq!(metadata.bucket_count, 0);
		assert!(root.join("metadata.json").is_file());
	}
}
