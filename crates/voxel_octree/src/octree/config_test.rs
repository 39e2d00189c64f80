use super::*;

#[test]
fn test_default_is_valid() {
  let config = BuildConfig::default();
  assert!(config.validate().is_ok());
  assert_eq!(config.total_volume(), 64 * 64 * 64);
  assert_eq!(config.max_depth(), 6);
}

#[test]
fn test_voxel_size() {
  let config = BuildConfig::new(DAabb3::cube(DVec3::ZERO, 32.0), 8, OctreeFormat::Rgba8);
  assert_eq!(config.voxel_size(), 4.0);
}

#[test]
fn test_rejects_non_power_of_two() {
  let config = BuildConfig {
    voxels_per_axis: 12,
    ..BuildConfig::default()
  };
  assert!(matches!(config.validate(), Err(BuildError::InvalidConfig(_))));
}

#[test]
fn test_rejects_zero_voxels() {
  let config = BuildConfig {
    voxels_per_axis: 0,
    ..BuildConfig::default()
  };
  assert!(config.validate().is_err());
}

#[test]
fn test_rejects_oversized_voxels_per_axis() {
  let config = BuildConfig {
    voxels_per_axis: MAX_VOXELS_PER_AXIS * 2,
    ..BuildConfig::default()
  };
  assert!(config.validate().is_err());
}

#[test]
fn test_rejects_non_cubic_bounds() {
  let config = BuildConfig {
    bounds: DAabb3::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0)),
    ..BuildConfig::default()
  };
  assert!(config.validate().is_err());
}

/// One voxel per axis is a single-leaf world.
#[test]
fn test_single_voxel_world() {
  let config = BuildConfig {
    voxels_per_axis: 1,
    ..BuildConfig::default()
  };
  assert!(config.validate().is_ok());
  assert_eq!(config.total_volume(), 1);
  assert_eq!(config.max_depth(), 0);
}
