// Quadtree addressing over a fixed geographic extent. The scheme is pure and
// stateless past construction; bucket addressing packs one tile address at the
// run's coarse level into a u32.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileAddress {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileAddress {
	// x in the low 16 bits, y in the high 16. The level is implicit; a single
	// coarse level holds for the whole run, so it is not encoded.
	pub fn to_bucket_id(&self) -> u32 {
		assert!(
			self.x < (1 << 16) && self.y < (1 << 16),
			"tile ({}, {}) at level {} exceeds the 16-bit bucket packing range; the coarse level is misconfigured",
			self.x,
			self.y,
			self.level
		);
		(self.y << 16) | self.x
	}

	pub fn from_bucket_id(id: u32, level: u8) -> TileAddress {
		TileAddress {
			level,
			x: id & 0xffff,
			y: id >> 16,
		}
	}
}

#[derive(Clone, Debug)]
pub struct GeographicExtent {
	pub min_lon: f64,
	pub min_lat: f64,
	pub max_lon: f64,
	pub max_lat: f64,
}

impl GeographicExtent {
	pub fn full() -> GeographicExtent {
		GeographicExtent {
			min_lon: -180.0,
			min_lat: -90.0,
			max_lon: 180.0,
			max_lat: 90.0,
		}
	}
}

#[derive(Clone, Debug)]
pub struct GeographicTilingScheme {
	extent: GeographicExtent,
}

impl GeographicTilingScheme {
	pub fn new(extent: GeographicExtent) -> GeographicTilingScheme {
		GeographicTilingScheme { extent }
	}

	pub fn global() -> GeographicTilingScheme {
		GeographicTilingScheme::new(GeographicExtent::full())
	}

	// The grid at `level` is 2^level x 2^level cells over the extent, y
	// growing northward. The floor puts a position exactly on an interior
	// cell boundary into the higher-indexed cell; the extent's max edge
	// clamps into the last cell.
	pub fn position_to_tile(&self, level: u8, latitude: f64, longitude: f64) -> TileAddress {
		assert!(level < 31, "tiling level {} out of range", level);
		let tiles = (1u32 << level) as f64;

		let fx = (longitude - self.extent.min_lon) / (self.extent.max_lon - self.extent.min_lon);
		let fy = (latitude - self.extent.min_lat) / (self.extent.max_lat - self.extent.min_lat);

		let x = (fx * tiles).floor().clamp(0.0, tiles - 1.0) as u32;
		let y = (fy * tiles).floor().clamp(0.0, tiles - 1.0) as u32;

		TileAddress { level, x, y }
	}
}
