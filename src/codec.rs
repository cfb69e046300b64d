use crate::model::point::PointRecord;
use byteorder::{BigEndian, ByteOrder};

// Fixed on-disk record: x,y,z as f64, r,g,b,a as u8, intensity as u16,
// classification as i16. Big-endian on every field so writer and reader agree
// regardless of host platform. No validation happens here; NaN and
// out-of-range coordinates pass through untouched.
pub const POINT_RECORD_BYTES: usize = 32;

pub fn encode_point(point: &PointRecord) -> [u8; POINT_RECORD_BYTES] {
	let mut buf = [0u8; POINT_RECORD_BYTES];
	BigEndian::write_f64(&mut buf[0..8], point.x);
	BigEndian::write_f64(&mut buf[8..16], point.y);
	BigEndian::write_f64(&mut buf[16..24], point.z);
	buf[24] = point.r;
	buf[25] = point.g;
	buf[26] = point.b;
	buf[27] = point.a;
	BigEndian::write_u16(&mut buf[28..30], point.intensity);
	BigEndian::write_i16(&mut buf[30..32], point.classification);
	buf
}

pub fn decode_point(buf: &[u8]) -> PointRecord {
	PointRecord {
		x: BigEndian::read_f64(&buf[0..8]),
		y: BigEndian::read_f64(&buf[8..16]),
		z: BigEndian::read_f64(&buf[16..24]),
		r: buf[24],
		g: buf[25],
		b: buf[26],
		a: buf[27],
		intensity: BigEndian::read_u16(&buf[28..30]),
		classification: BigEndian::read_i16(&buf[30..32]),
	}
}
