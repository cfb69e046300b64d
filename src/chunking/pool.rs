use crate::error::{Error, Result};
use crate::tiling::TileAddress;
use log::debug;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct Handle {
	path: PathBuf,
	stream: Option<BufWriter<File>>,
	last_used: u64,
}

struct PoolState {
	handles: HashMap<u32, Handle>,
	clock: u64,
}

// Bounds the number of simultaneously open output descriptors no matter how
// many distinct buckets a run touches. Every mutation happens under one lock,
// so concurrent writer threads never see two open streams for one bucket.
pub struct FileHandlePool {
	root: PathBuf,
	coarse_level: u8,
	max_open_files: usize,
	state: Mutex<PoolState>,
}

impl FileHandlePool {
	pub fn new(root: &Path, coarse_level: u8, max_open_files: usize) -> FileHandlePool {
		assert!(max_open_files > 0, "pool needs at least one open file");
		FileHandlePool {
			root: root.to_path_buf(),
			coarse_level,
			max_open_files,
			state: Mutex::new(PoolState {
				handles: HashMap::new(),
				clock: 0,
			}),
		}
	}

	pub fn bucket_path(&self, bucket: u32) -> PathBuf {
		let tile = TileAddress::from_bucket_id(bucket, self.coarse_level);
		self.root
			.join(tile.level.to_string())
			.join(tile.x.to_string())
			.join(tile.y.to_string())
			.join("bucket.bin")
	}

	// Appends through the bucket's pooled handle, opening it on first use and
	// evicting the least-recently-used open handle when the pool is full.
	// Files open in append mode, so an evicted bucket picks up where it left
	// off when it is written to again.
	pub fn append(&self, bucket: u32, bytes: &[u8]) -> Result<()> {
		let mut guard = self.state.lock().unwrap();
		let state = &mut *guard;
		state.clock += 1;
		let stamp = state.clock;

		let needs_open = state
			.handles
			.get(&bucket)
			.map_or(true, |handle| handle.stream.is_none());
		if needs_open {
			Self::evict_lru(state, self.max_open_files)?;
		}

		let path = self.bucket_path(bucket);
		let handle = state.handles.entry(bucket).or_insert_with(|| Handle {
			path: path.clone(),
			stream: None,
			last_used: stamp,
		});
		handle.last_used = stamp;

		if handle.stream.is_none() {
			if let Some(parent) = handle.path.parent() {
				fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
			}
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(&handle.path)
				.map_err(|e| Error::io(&path, e))?;
			handle.stream = Some(BufWriter::new(file));
		}

		if let Some(stream) = handle.stream.as_mut() {
			stream.write_all(bytes).map_err(|e| Error::io(&path, e))?;
		}

		Ok(())
	}

	pub fn open_streams(&self) -> usize {
		let guard = self.state.lock().unwrap();
		guard
			.handles
			.values()
			.filter(|handle| handle.stream.is_some())
			.count()
	}

	// Flushes and closes everything, returning the pool to its empty state.
	// Every handle is attempted; the first error surfaces afterwards so one
	// failing close does not strand the rest.
	pub fn close(&self) -> Result<()> {
		let mut guard = self.state.lock().unwrap();
		let mut first_error = None;

		for handle in guard.handles.values_mut() {
			if let Some(mut stream) = handle.stream.take() {
				if let Err(e) = stream.flush() {
					if first_error.is_none() {
						first_error = Some(Error::io(&handle.path, e));
					}
				}
			}
		}

		guard.handles.clear();
		guard.clock = 0;

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	fn evict_lru(state: &mut PoolState, max_open_files: usize) -> Result<()> {
		let open = state
			.handles
			.values()
			.filter(|handle| handle.stream.is_some())
			.count();
		if open < max_open_files {
			return Ok(());
		}

		let victim = state
			.handles
			.iter()
			.filter(|(_, handle)| handle.stream.is_some())
			.min_by_key(|(_, handle)| handle.last_used)
			.map(|(id, _)| *id);

		if let Some(id) = victim {
			if let Some(handle) = state.handles.get_mut(&id) {
				debug!("evicting handle for bucket {:#010x}", id);
				if let Some(mut stream) = handle.stream.take() {
					stream.flush().map_err(|e| Error::io(&handle.path, e))?;
				}
			}
		}

		Ok(())
	}
}
