pub mod chunking;
pub mod cloud;
pub mod codec;
pub mod csv_reader;
pub mod error;
pub mod model;
pub mod octree;
pub mod shuffle;
pub mod tiling;

use crate::chunking::reader::walk_buckets;
use crate::chunking::writer::BucketWriter;
use crate::cloud::GaiaPointCloud;
use crate::error::{Error, Result};
use crate::model::options::TilerOptions;
use crate::octree::PointCloudOctree;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::Path;
use std::process;
use std::time::Duration;

fn main() {
	let args: Vec<String> = std::env::args().collect();
	if args.len() < 3 {
		eprintln!("usage: {} <points.csv> <output-dir> [coarse-level]", args[0]);
		process::exit(1);
	}

	let mut options = TilerOptions::default();
	if let Some(level) = args.get(3) {
		options.coarse_level = level.parse().unwrap_or(options.coarse_level);
	}

	if let Err(e) = run(Path::new(&args[1]), Path::new(&args[2]), &options) {
		eprintln!("ingestion failed: {}", e);
		process::exit(1);
	}
}

fn run(input: &Path, output: &Path, options: &TilerOptions) -> Result<()> {
	let file = File::open(input).map_err(|e| Error::io(input, e))?;

	let spinner = ProgressBar::new_spinner();
	spinner.enable_steady_tick(Duration::from_millis(120));
	spinner.set_message("bucketing points");

	let mut writer = BucketWriter::new(output, options);
	csv_reader::ingest_csv(file, &mut writer)?;
	let metadata = writer.close()?;
	spinner.finish_with_message(format!(
		"bucketed {} points into {} buckets at level {}",
		metadata.point_count, metadata.bucket_count, metadata.coarse_level
	));

	let shuffled = shuffle::shuffle_buckets(output)?;
	println!("shuffle pass rewrote {} points", shuffled);

	// Rebuild each bucket as a container and partition it, reporting what the
	// downstream tile builder will see.
	let buckets = walk_buckets(output)?;
	let bar = ProgressBar::new(buckets.len() as u64);
	if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
		bar.set_style(style);
	}
	bar.set_message("partitioning buckets");

	let mut total_leaves = 0usize;
	let mut deepest = 0u8;
	for bucket in &buckets {
		let mut cloud = GaiaPointCloud::from_bucket_file("r", &bucket.file)?;
		cloud.maximize(false)?;
		let bounds = cloud.bounds.clone();
		let tree = PointCloudOctree::build(cloud.into_points(), bounds, options);
		total_leaves += tree.leaves().count();
		deepest = deepest.max(tree.max_depth());
		bar.inc(1);
	}
	bar.finish_with_message(format!(
		"{} octree leaves, max depth {}",
		total_leaves, deepest
	));

	Ok(())
}
