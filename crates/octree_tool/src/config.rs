//! Build description parsing.

use anyhow::{Context, Result};
use glam::DVec3;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use voxel_octree::{BuildConfig, DAabb3, OctreeFormat, Rgba, SolidWorker, SphereWorker, Worker};

/// Root configuration for one octree build.
#[derive(Debug, Deserialize)]
pub struct Config {
	/// Output file, relative to the config file.
	pub output: PathBuf,
	/// World-space cube covered by the root node.
	#[serde(default)]
	pub bounds: BoundsConfig,
	/// Voxels per axis at the root (power of two).
	pub voxels_per_axis: u32,
	/// Node record format.
	#[serde(default)]
	pub format: OctreeFormat,
	/// Worker pairs (default: available parallelism).
	pub workers: Option<usize>,
	/// Cap on samples each producer emits per node.
	pub max_samples_per_node: Option<usize>,
	/// What to voxelize.
	pub shape: ShapeConfig,
}

/// Root cube: minimum corner and edge length.
#[derive(Debug, Deserialize)]
pub struct BoundsConfig {
	pub min: [f64; 3],
	pub edge: f64,
}

impl Default for BoundsConfig {
	fn default() -> Self {
		Self {
			min: [0.0; 3],
			edge: 1.0,
		}
	}
}

/// Producer selection.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeConfig {
	/// Every voxel filled with one color.
	Solid {
		#[serde(default = "default_color")]
		color: [f32; 4],
	},
	/// Voxels inside a sphere, colored by position.
	Sphere { center: [f64; 3], radius: f64 },
}

fn default_color() -> [f32; 4] {
	[1.0, 1.0, 1.0, 1.0]
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		let config: Config =
			toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;

		if config.workers == Some(0) {
			anyhow::bail!("workers must be at least 1");
		}
		if let ShapeConfig::Sphere { radius, .. } = config.shape {
			if radius <= 0.0 {
				anyhow::bail!("sphere radius must be positive, got {}", radius);
			}
		}

		Ok(config)
	}

	pub fn build_config(&self) -> BuildConfig {
		BuildConfig::new(
			DAabb3::cube(DVec3::from_array(self.bounds.min), self.bounds.edge),
			self.voxels_per_axis,
			self.format,
		)
	}

	pub fn worker_count(&self) -> usize {
		self.workers.unwrap_or_else(|| {
			std::thread::available_parallelism()
				.map(|n| n.get())
				.unwrap_or(4)
		})
	}

	/// One producer per worker slot.
	pub fn workers(&self, build: &BuildConfig) -> Vec<Box<dyn Worker>> {
		let voxel_size = build.voxel_size();
		(0..self.worker_count())
			.map(|_| -> Box<dyn Worker> {
				match &self.shape {
					ShapeConfig::Solid { color } => {
						let [r, g, b, a] = *color;
						let mut worker = SolidWorker::new(voxel_size, Rgba::new(r, g, b, a));
						worker.max_samples_per_node = self.max_samples_per_node;
						Box::new(worker)
					}
					ShapeConfig::Sphere { center, radius } => {
						let mut worker =
							SphereWorker::new(DVec3::from_array(*center), *radius, voxel_size);
						worker.max_samples_per_node = self.max_samples_per_node;
						Box::new(worker)
					}
				}
			})
			.collect()
	}
}
