use crate::model::point::PointRecord;
use crate::model::vector3::Vector3;
use ord_subset::OrdSubsetIterExt;

#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
	pub min: Vector3,
	pub max: Vector3,
}

impl BoundingBox {
	pub fn new(min: Vector3, max: Vector3) -> BoundingBox {
		BoundingBox { min, max }
	}

	pub fn empty() -> BoundingBox {
		BoundingBox {
			min: Vector3::infinity(),
			max: Vector3::infinity() * -1.0,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.min.x > self.max.x
	}

	pub fn size(&self) -> Vector3 {
		&self.max - &self.min
	}

	pub fn center(&self) -> Vector3 {
		self.min.clone() + self.size() * 0.5
	}

	pub fn longest_side(&self) -> f64 {
		let size = self.size();
		[size.x, size.y, size.z]
			.iter()
			.cloned()
			.fold(f64::NEG_INFINITY, f64::max)
	}

	pub fn expand(&mut self, point: &PointRecord) {
		let position = Vector3::new(point.x, point.y, point.z);
		self.min = self.min.component_min(&position);
		self.max = self.max.component_max(&position);
	}

	pub fn union(&mut self, other: &BoundingBox) {
		self.min = self.min.component_min(&other.min);
		self.max = self.max.component_max(&other.max);
	}

	pub fn contains(&self, point: &PointRecord) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	// Octant index bit layout: bit 2 = x, bit 1 = y, bit 0 = z. A point
	// exactly on a midpoint stays on the low-index side.
	pub fn octant_index(&self, point: &PointRecord) -> usize {
		let center = self.center();
		let high_x = point.x > center.x;
		let high_y = point.y > center.y;
		let high_z = point.z > center.z;
		((high_x as usize) << 2) | ((high_y as usize) << 1) | (high_z as usize)
	}

	pub fn child_octant(&self, index: usize) -> BoundingBox {
		let center = self.center();
		let mut bbox = BoundingBox::empty();

		if (index & 0b100) == 0 {
			bbox.min.x = self.min.x;
			bbox.max.x = center.x;
		} else {
			bbox.min.x = center.x;
			bbox.max.x = self.max.x;
		}

		if (index & 0b010) == 0 {
			bbox.min.y = self.min.y;
			bbox.max.y = center.y;
		} else {
			bbox.min.y = center.y;
			bbox.max.y = self.max.y;
		}

		if (index & 0b001) == 0 {
			bbox.min.z = self.min.z;
			bbox.max.z = center.z;
		} else {
			bbox.min.z = center.z;
			bbox.max.z = self.max.z;
		}

		bbox
	}
}

pub fn find_bounds(points: &[PointRecord]) -> BoundingBox {
	if points.is_empty() {
		return BoundingBox::empty();
	}

	let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
	let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
	let zs: Vec<f64> = points.iter().map(|p| p.z).collect();

	BoundingBox::new(
		Vector3::new(
			*xs.iter().ord_subset_min().unwrap(),
			*ys.iter().ord_subset_min().unwrap(),
			*zs.iter().ord_subset_min().unwrap(),
		),
		Vector3::new(
			*xs.iter().ord_subset_max().unwrap(),
			*ys.iter().ord_subset_max().unwrap(),
			*zs.iter().ord_subset_max().unwrap(),
		),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn point_at(x: f64, y: f64, z: f64) -> PointRecord {
		PointRecord {
			x,
			y,
			z,
			r: 0,
			g: 0,
			b: 0,
			a: 255,
			intensity: 0,
			classification: 0,
		}
	}

	#[test]
	fn test_expand_and_find_bounds_agree() {
		let points = vec![
			point_at(-1.0, 4.0, 2.0),
			point_at(3.0, -2.0, 7.0),
			point_at(0.5, 0.5, 0.5),
		];

		let mut expanded = BoundingBox::empty();
		for p in &points {
			expanded.expand(p);
		}

		assert_eq!(expanded, find_bounds(&points));
		assert_eq!(expanded.min, Vector3::new(-1.0, -2.0, 0.5));
		assert_eq!(expanded.max, Vector3::new(3.0, 4.0, 7.0));
	}

	#[test]
	fn test_octant_index_ties_go_low() {
		let bbox = BoundingBox::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 2.0, 2.0));
		// Exactly on every midpoint: all axes stay low.
		assert_eq!(bbox.octant_index(&point_at(1.0, 1.0, 1.0)), 0);
		assert_eq!(bbox.octant_index(&point_at(1.5, 1.0, 1.0)), 0b100);
		assert_eq!(bbox.octant_index(&point_at(0.5, 1.5, 1.5)), 0b011);
	}

	#[test]
	fn test_child_octant_partitions_parent() {
		let bbox = BoundingBox::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(8.0, 8.0, 8.0));
		for index in 0..8 {
			let child = bbox.child_octant(index);
			assert!(child.min.x >= bbox.min.x && child.max.x <= bbox.max.x);
			assert!(child.min.y >= bbox.min.y && child.max.y <= bbox.max.y);
			assert!(child.min.z >= bbox.min.z && child.max.z <= bbox.max.z);
			assert_eq!(child.longest_side(), 4.0);
		}
	}

	#[test]
	fn test_union_is_monotone() {
		let mut a = BoundingBox::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
		let b = BoundingBox::new(Vector3::new(-1.0, 0.5, 0.5), Vector3::new(0.5, 2.0, 0.75));
		let before = a.clone();
		a.union(&b);
		assert!(a.contains(&point_at(before.min.x, before.min.y, before.min.z)));
		assert!(a.contains(&point_at(b.max.x, b.max.y, b.max.z)));
		assert_eq!(a.min, Vector3::new(-1.0, 0.0, 0.0));
		assert_eq!(a.max, Vector3::new(1.0, 2.0, 1.0));
	}
}
