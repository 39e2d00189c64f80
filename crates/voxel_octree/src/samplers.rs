//! Simple deterministic producers for testing and debugging.
//!
//! Both samplers walk the centers of the finest voxels inside the bounds
//! they are asked about, so a node's sample count is its occupied voxel
//! count (capped by `max_samples_per_node`). They are easy to verify by
//! eye in a rendered frame and need no external data.

use glam::DVec3;

use crate::build::{SampleSink, Worker};
use crate::error::ProducerError;
use crate::octree::DAabb3;
use crate::types::{Rgba, Sample};

/// Centers of the `voxel_size` grid cells inside `bounds`, x fastest.
pub fn voxel_centers(bounds: &DAabb3, voxel_size: f64) -> impl Iterator<Item = DVec3> {
  let min = bounds.min;
  let cells = (bounds.size() / voxel_size).round().max(DVec3::ONE);
  let (nx, ny, nz) = (cells.x as u64, cells.y as u64, cells.z as u64);

  (0..nz).flat_map(move |z| {
    (0..ny).flat_map(move |y| {
      (0..nx).map(move |x| min + (DVec3::new(x as f64, y as f64, z as f64) + 0.5) * voxel_size)
    })
  })
}

/// Every voxel occupied with one constant color: a uniformly dense cube.
#[derive(Clone, Debug)]
pub struct SolidWorker {
  /// Edge length of one finest voxel.
  pub voxel_size: f64,
  pub color: Rgba,
  /// Stop after this many samples per node (`None` = every voxel).
  pub max_samples_per_node: Option<usize>,
}

impl SolidWorker {
  pub fn new(voxel_size: f64, color: Rgba) -> Self {
    Self {
      voxel_size,
      color,
      max_samples_per_node: None,
    }
  }

  pub fn with_max_samples(mut self, max: usize) -> Self {
    self.max_samples_per_node = Some(max);
    self
  }
}

impl Worker for SolidWorker {
  fn sample(&mut self, bounds: &DAabb3, sink: &SampleSink) -> Result<(), ProducerError> {
    let limit = self.max_samples_per_node.unwrap_or(usize::MAX);
    for position in voxel_centers(bounds, self.voxel_size).take(limit) {
      sink.send(Sample::new(position, self.color))?;
    }
    Ok(())
  }
}

/// Voxels whose center lies inside a sphere.
///
/// Color encodes the normalized position inside the sphere's bounding box
/// (`r = x`, `g = y`, `b = z`), so octants are distinguishable on screen.
#[derive(Clone, Debug)]
pub struct SphereWorker {
  pub center: DVec3,
  pub radius: f64,
  /// Edge length of one finest voxel.
  pub voxel_size: f64,
  /// Stop after this many samples per node (`None` = every voxel).
  pub max_samples_per_node: Option<usize>,
}

impl SphereWorker {
  pub fn new(center: DVec3, radius: f64, voxel_size: f64) -> Self {
    Self {
      center,
      radius,
      voxel_size,
      max_samples_per_node: None,
    }
  }

  pub fn with_max_samples(mut self, max: usize) -> Self {
    self.max_samples_per_node = Some(max);
    self
  }

  /// Closest-point test between the sphere and `bounds`.
  fn touches(&self, bounds: &DAabb3) -> bool {
    let closest = self.center.clamp(bounds.min, bounds.max);
    closest.distance_squared(self.center) <= self.radius * self.radius
  }

  fn color_at(&self, position: DVec3) -> Rgba {
    let unit = ((position - self.center) / (2.0 * self.radius) + 0.5).clamp(DVec3::ZERO, DVec3::ONE);
    Rgba::new(unit.x as f32, unit.y as f32, unit.z as f32, 1.0)
  }
}

impl Worker for SphereWorker {
  fn sample(&mut self, bounds: &DAabb3, sink: &SampleSink) -> Result<(), ProducerError> {
    if !self.touches(bounds) {
      return Ok(());
    }

    let r2 = self.radius * self.radius;
    let limit = self.max_samples_per_node.unwrap_or(usize::MAX);
    let inside = voxel_centers(bounds, self.voxel_size)
      .filter(|p| p.distance_squared(self.center) <= r2)
      .take(limit);

    for position in inside {
      sink.send(Sample::new(position, self.color_at(position)))?;
    }
    Ok(())
  }
}
