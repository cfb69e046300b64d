// One ingested sample. Position is longitude/latitude/ellipsoidal height in
// degrees/meters until a later pipeline stage swaps it for ECEF meters; this
// layer never interprets the coordinates beyond bucketing.
#[derive(Clone, Debug, PartialEq)]
pub struct PointRecord {
	pub x: f64,
	pub y: f64,
	pub z: f64,
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: u8,
	pub intensity: u16,
	pub classification: i16,
}
