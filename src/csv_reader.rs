use crate::chunking::writer::BucketWriter;
use crate::error::Result;
use crate::model::point::PointRecord;
use csv::Reader;
use serde::Deserialize;
use std::io::Read;

// Rows are already georeferenced: lon/lat in degrees, height in meters.
// Attribute columns are optional and default to an opaque white sample.
#[derive(Debug, Deserialize)]
struct CsvPoint {
	lon: f64,
	lat: f64,
	height: f64,
	#[serde(default = "full_channel")]
	r: u8,
	#[serde(default = "full_channel")]
	g: u8,
	#[serde(default = "full_channel")]
	b: u8,
	#[serde(default = "full_channel")]
	a: u8,
	#[serde(default)]
	intensity: u16,
	#[serde(default)]
	classification: i16,
}

fn full_channel() -> u8 {
	255
}

// Streams rows straight into the writer, one record at a time; the dataset is
// never materialized.
pub fn ingest_csv<R: Read>(input: R, writer: &mut BucketWriter) -> Result<u64> {
	let mut rdr = Reader::from_reader(input);
	let mut count = 0u64;
	for result in rdr.deserialize() {
		let record: CsvPoint = result?;
		writer.add_point(&PointRecord {
			x: record.lon,
			y: record.lat,
			z: record.height,
			r: record.r,
			g: record.g,
			b: record.b,
			a: record.a,
			intensity: record.intensity,
			classification: record.classification,
		})?;
		count += 1;
	}
	Ok(count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chunking::reader::walk_buckets;
	use crate::model::options::TilerOptions;
	use std::fs;
	use std::path::PathBuf;

	fn temp_root(name: &str) -> PathBuf {
		let dir = std::env::temp_dir().join(format!("gaia-csv-{}-{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		fs::create_dir_all(&dir).unwrap();
		dir
	}

	#[test]
	fn test_ingest_csv_with_attributes() {
		let csv = "\
lon,lat,height,r,g,b,a,intensity,classification
127.385,36.472,53.2,10,20,30,255,4096,2
127.386,36.473,54.1,11,21,31,255,4097,2
-45.0,10.0,1.0,0,0,0,255,1,0
";
		let root = temp_root("attrs");
		let mut writer = BucketWriter::new(&root, &TilerOptions::default());
		let count = ingest_csv(csv.as_bytes(), &mut writer).unwrap();
		let metadata = writer.close().unwrap();

		assert_eq!(count, 3);
		assert_eq!(metadata.point_count, 3);
		// Two far-apart sites, two buckets.
		assert_eq!(walk_buckets(&root).unwrap().len(), 2);
	}

	#[test]
	fn test_missing_attribute_columns_default() {
		let csv = "\
lon,lat,height
127.385,36.472,53.2
";
		let root = temp_root("defaults");
		let mut writer = BucketWriter::new(&root, &TilerOptions::default());
		let count = ingest_csv(csv.as_bytes(), &mut writer).unwrap();
		writer.close().unwrap();
		assert_eq!(count, 1);
	}

	#[test]
	fn test_malformed_row_is_an_error() {
		let csv = "\
lon,lat,height
not-a-number,36.472,53.2
";
		let root = temp_root("malformed");
		let mut writer = BucketWriter::new(&root, &TilerOptions::default());
		assert!(ingest_csv(csv.as_bytes(), &mut writer).is_err());
	}
}
