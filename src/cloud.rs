use crate::chunking::reader::read_bucket_file;
use crate::codec::{decode_point, encode_point, POINT_RECORD_BYTES};
use crate::error::{Error, Result};
use crate::model::bounds::{find_bounds, BoundingBox};
use crate::model::point::PointRecord;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

// A container holds its points in memory or in a minimized spill file, never
// both. The enum keeps that invariant in the type instead of in convention.
pub enum PointStorage {
	Resident(Vec<PointRecord>),
	Spilled(PathBuf),
}

pub struct GaiaPointCloud {
	pub code: String,
	pub parent_code: Option<String>,
	storage: PointStorage,
	point_count: u64,
	pub bounds: BoundingBox,
	pub children: Vec<GaiaPointCloud>,
	// Set by streaming producers to mark a node that accepts no more points.
	pub limit_point_count: Option<u64>,
}

impl GaiaPointCloud {
	pub fn new(code: &str, bounds: BoundingBox) -> GaiaPointCloud {
		GaiaPointCloud {
			code: code.to_string(),
			parent_code: None,
			storage: PointStorage::Resident(Vec::new()),
			point_count: 0,
			bounds,
			children: Vec::new(),
			limit_point_count: None,
		}
	}

	pub fn from_points(code: &str, points: Vec<PointRecord>) -> GaiaPointCloud {
		let bounds = find_bounds(&points);
		let point_count = points.len() as u64;
		GaiaPointCloud {
			code: code.to_string(),
			parent_code: None,
			storage: PointStorage::Resident(points),
			point_count,
			bounds,
			children: Vec::new(),
			limit_point_count: None,
		}
	}

	// References an on-disk bucket without loading it; the container starts
	// minimized and a later maximize pulls the records in.
	pub fn from_bucket_file(code: &str, path: &Path) -> Result<GaiaPointCloud> {
		let len = fs::metadata(path).map_err(|e| Error::io(path, e))?.len();
		if len % POINT_RECORD_BYTES as u64 != 0 {
			return Err(Error::CorruptBucket {
				path: path.to_path_buf(),
				len,
			});
		}

		Ok(GaiaPointCloud {
			code: code.to_string(),
			parent_code: None,
			storage: PointStorage::Spilled(path.to_path_buf()),
			point_count: len / POINT_RECORD_BYTES as u64,
			bounds: BoundingBox::empty(),
			children: Vec::new(),
			limit_point_count: None,
		})
	}

	pub fn point_count(&self) -> u64 {
		self.point_count
	}

	pub fn is_minimized(&self) -> bool {
		matches!(self.storage, PointStorage::Spilled(_))
	}

	pub fn is_full(&self) -> bool {
		match self.limit_point_count {
			Some(limit) => self.point_count >= limit,
			None => false,
		}
	}

	pub fn points(&self) -> &[PointRecord] {
		match &self.storage {
			PointStorage::Resident(points) => points,
			PointStorage::Spilled(_) => &[],
		}
	}

	pub fn into_points(self) -> Vec<PointRecord> {
		match self.storage {
			PointStorage::Resident(points) => points,
			PointStorage::Spilled(path) => {
				panic!("into_points on a cloud minimized to {}", path.display())
			}
		}
	}

	pub fn add_point(&mut self, point: PointRecord) {
		match &mut self.storage {
			PointStorage::Resident(points) => {
				self.bounds.expand(&point);
				points.push(point);
				self.point_count += 1;
			}
			PointStorage::Spilled(path) => {
				panic!("add_point on a cloud minimized to {}", path.display())
			}
		}
	}

	// Spills every resident point to `path` in list order and releases the
	// in-memory list. A no-op when already minimized.
	pub fn minimize(&mut self, path: &Path) -> Result<()> {
		let points = match &mut self.storage {
			PointStorage::Resident(points) => std::mem::take(points),
			PointStorage::Spilled(_) => return Ok(()),
		};

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
		}
		let file = File::create(path).map_err(|e| Error::io(path, e))?;
		let mut writer = BufWriter::new(file);
		for point in &points {
			writer
				.write_all(&encode_point(point))
				.map_err(|e| Error::io(path, e))?;
		}
		writer.flush().map_err(|e| Error::io(path, e))?;

		self.point_count = points.len() as u64;
		self.storage = PointStorage::Spilled(path.to_path_buf());
		Ok(())
	}

	// Reloads the spill file in file order, optionally deleting it. A no-op
	// when already resident.
	pub fn maximize(&mut self, delete_afterward: bool) -> Result<()> {
		let path = match &self.storage {
			PointStorage::Spilled(path) => path.clone(),
			PointStorage::Resident(_) => return Ok(()),
		};

		let points = read_bucket_file(&path)?;
		if delete_afterward {
			fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
		}

		self.point_count = points.len() as u64;
		if self.bounds.is_empty() {
			self.bounds = find_bounds(&points);
		}
		self.storage = PointStorage::Resident(points);
		Ok(())
	}

	// Streams a window of the spill file into a new detached container:
	// up to chunk_size / 32 points starting at byte `offset`, clipped to end
	// of file. The receiver is left untouched.
	pub fn read_chunk(&self, chunk_size: u64, offset: u64) -> Result<GaiaPointCloud> {
		let path = match &self.storage {
			PointStorage::Spilled(path) => path,
			PointStorage::Resident(_) => panic!("read_chunk on a resident cloud"),
		};
		assert!(
			offset % POINT_RECORD_BYTES as u64 == 0,
			"chunk offset {} is not record aligned",
			offset
		);

		let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
		let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
		if len % POINT_RECORD_BYTES as u64 != 0 {
			return Err(Error::CorruptBucket {
				path: path.clone(),
				len,
			});
		}

		let start = offset.min(len);
		let mut want = chunk_size.min(len - start);
		want -= want % POINT_RECORD_BYTES as u64;

		file.seek(SeekFrom::Start(start))
			.map_err(|e| Error::io(path, e))?;
		let mut bytes = vec![0u8; want as usize];
		file.read_exact(&mut bytes).map_err(|e| Error::io(path, e))?;

		let points: Vec<PointRecord> = bytes
			.chunks_exact(POINT_RECORD_BYTES)
			.map(decode_point)
			.collect();
		let mut chunk = GaiaPointCloud::from_points(&self.code, points);
		chunk.parent_code = self.parent_code.clone();
		Ok(chunk)
	}

	// Moves every resident point into exactly one of 8 octant children and
	// returns the non-empty ones, each with its geometric sub-box and a code
	// extending the parent's. The parent's list is left empty.
	pub fn distribute_oct(&mut self) -> Vec<GaiaPointCloud> {
		let points = match &mut self.storage {
			PointStorage::Resident(points) => std::mem::take(points),
			PointStorage::Spilled(path) => {
				panic!("distribute_oct on a cloud minimized to {}", path.display())
			}
		};
		self.point_count = 0;

		let mut octants: Vec<Vec<PointRecord>> = (0..8).map(|_| Vec::new()).collect();
		for point in points {
			octants[self.bounds.octant_index(&point)].push(point);
		}

		let mut children = Vec::new();
		for (index, bucket) in octants.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			let count = bucket.len() as u64;
			children.push(GaiaPointCloud {
				code: format!("{}{}", self.code, index),
				parent_code: Some(self.code.clone()),
				storage: PointStorage::Resident(bucket),
				point_count: count,
				bounds: self.bounds.child_octant(index),
				children: Vec::new(),
				limit_point_count: None,
			});
		}
		children
	}

	// Re-aggregates an octant back upward: points append to this container
	// and the bounding boxes union.
	pub fn combine(&mut self, other: GaiaPointCloud) {
		let other_points = match other.storage {
			PointStorage::Resident(points) => points,
			PointStorage::Spilled(path) => {
				panic!("combine with a cloud minimized to {}", path.display())
			}
		};
		match &mut self.storage {
			PointStorage::Resident(points) => {
				self.point_count += other_points.len() as u64;
				points.extend(other_points);
			}
			PointStorage::Spilled(path) => {
				panic!("combine on a cloud minimized to {}", path.display())
			}
		}
		self.bounds.union(&other.bounds);
	}
}
