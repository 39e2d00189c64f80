//! Axis-aligned bounding box with double precision for build-time volumes.

use glam::DVec3;

use crate::constants::octant_bits;

/// Double-precision axis-aligned bounding box.
///
/// Defines the volume handed to a sample producer for one octree node.
/// Immutable once created; subdivision produces new boxes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DAabb3 {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl DAabb3 {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a cube from its minimum corner and edge length.
	pub fn cube(min: DVec3, edge: f64) -> Self {
		Self::new(min, min + DVec3::splat(edge))
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// True when all three extents are equal (within a relative epsilon)
	/// and positive.
	pub fn is_cube(&self) -> bool {
		let size = self.size();
		let edge = size.max_element();
		edge > 0.0 && (edge - size.min_element()).abs() <= edge * 1e-9
	}

	/// Bounds of one of the eight half-size octants.
	///
	/// Octant bits: X (bit 0), Y (bit 1), Z (bit 2).
	pub fn octant(&self, octant: u8) -> Self {
		let half = self.size() * 0.5;
		let [x, y, z] = octant_bits(octant);
		let min = self.min + DVec3::new(x as f64, y as f64, z as f64) * half;
		Self::new(min, min + half)
	}
}
