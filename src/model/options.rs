// Explicit per-pipeline configuration. Nothing in the engine reads process
// globals, so two pipelines with different settings can share one process.
#[derive(Clone, Debug)]
pub struct TilerOptions {
	// Quadtree depth used for bucket addressing during ingestion. One level
	// per run; the packed bucket id does not carry it.
	pub coarse_level: u8,
	pub max_open_files: usize,
	pub write_buffer_capacity: usize,
	pub limit_depth: u8,
	pub limit_box_size: f64,
	pub min_vertex_count: usize,
}

impl Default for TilerOptions {
	fn default() -> TilerOptions {
		TilerOptions {
			coarse_level: 12,
			max_open_files: 512,
			write_buffer_capacity: 4 * 1024 * 1024,
			limit_depth: 10,
			limit_box_size: 25.0,
			min_vertex_count: 100,
		}
	}
}
