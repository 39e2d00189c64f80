//! BuildConfig - world bounds, subdivision factor and output format for a
//! build.

use glam::DVec3;

use super::bounds::DAabb3;
use crate::codec::OctreeFormat;
use crate::constants::MAX_VOXELS_PER_AXIS;
use crate::error::BuildError;

/// Configuration bundle for `build`.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
  /// World-space volume covered by the root node. Must be a cube.
  pub bounds: DAabb3,

  /// Voxels per axis at the root. Power of two; leaves have 1.
  pub voxels_per_axis: u32,

  /// Node record format written to the output.
  pub format: OctreeFormat,
}

impl BuildConfig {
  pub fn new(bounds: DAabb3, voxels_per_axis: u32, format: OctreeFormat) -> Self {
    Self {
      bounds,
      voxels_per_axis,
      format,
    }
  }

  /// Total volume the root retires: `vpa³`.
  #[inline]
  pub fn total_volume(&self) -> u64 {
    let vpa = self.voxels_per_axis as u64;
    vpa * vpa * vpa
  }

  /// Depth of the deepest possible level below the root.
  #[inline]
  pub fn max_depth(&self) -> u32 {
    self.voxels_per_axis.trailing_zeros()
  }

  /// Edge length of one finest voxel in world units.
  #[inline]
  pub fn voxel_size(&self) -> f64 {
    self.bounds.size().x / self.voxels_per_axis as f64
  }

  /// Reject configurations the volume accounting cannot handle.
  pub fn validate(&self) -> Result<(), BuildError> {
    let vpa = self.voxels_per_axis;
    if vpa == 0 || !vpa.is_power_of_two() {
      return Err(BuildError::InvalidConfig(format!(
        "voxels_per_axis must be a power of two, got {}",
        vpa
      )));
    }
    if vpa > MAX_VOXELS_PER_AXIS {
      return Err(BuildError::InvalidConfig(format!(
        "voxels_per_axis must be at most {}, got {}",
        MAX_VOXELS_PER_AXIS, vpa
      )));
    }
    if !self.bounds.is_cube() {
      return Err(BuildError::InvalidConfig(format!(
        "bounds must be a non-empty cube, got size {:?}",
        self.bounds.size()
      )));
    }
    Ok(())
  }
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      bounds: DAabb3::cube(DVec3::ZERO, 1.0),
      voxels_per_axis: 64,
      format: OctreeFormat::Rgba8,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
