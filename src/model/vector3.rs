use std::ops;

#[derive(Clone, Debug, PartialEq)]
pub struct Vector3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Vector3 {
	pub fn new(x: f64, y: f64, z: f64) -> Vector3 {
		Vector3 { x, y, z }
	}

	pub fn infinity() -> Vector3 {
		Vector3 {
			x: f64::INFINITY,
			y: f64::INFINITY,
			z: f64::INFINITY,
		}
	}

	pub fn component_min(&self, other: &Vector3) -> Vector3 {
		Vector3 {
			x: self.x.min(other.x),
			y: self.y.min(other.y),
			z: self.z.min(other.z),
		}
	}

	pub fn component_max(&self, other: &Vector3) -> Vector3 {
		Vector3 {
			x: self.x.max(other.x),
			y: self.y.max(other.y),
			z: self.z.max(other.z),
		}
	}

	pub fn to_array(&self) -> [f64; 3] {
		[self.x, self.y, self.z]
	}
}

impl ops::Sub<&Vector3> for &Vector3 {
	type Output = Vector3;

	fn sub(self, rhs: &Vector3) -> Vector3 {
		Vector3 {
			x: self.x - rhs.x,
			y: self.y - rhs.y,
			z: self.z - rhs.z,
		}
	}
}

impl ops::Add<Vector3> for Vector3 {
	type Output = Vector3;

	fn add(self, rhs: Vector3) -> Vector3 {
		Vector3 {
			x: self.x + rhs.x,
			y: self.y + rhs.y,
			z: self.z + rhs.z,
		}
	}
}

impl ops::Mul<f64> for Vector3 {
	type Output = Vector3;

	fn mul(self, scalar: f64) -> Vector3 {
		Vector3 {
			x: self.x * scalar,
			y: self.y * scalar,
			z: self.z * scalar,
		}
	}
}
