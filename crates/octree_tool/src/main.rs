//! Sparse voxel octree tool.
//!
//! Subcommands:
//! - build: voxelize a shape described in a TOML file into an octree file
//! - info: print header and structure statistics of an octree file
//! - render: raytrace an octree file into a PNG
//!
//! Set `RUST_LOG=debug` for per-frame and per-build events.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use voxel_octree::constants::NO_CHILD;
use voxel_octree::{build, Camera, FlatOctree, Raytracer, RenderConfig};

use config::Config;

/// Build, inspect and render sparse voxel octrees.
#[derive(Parser, Debug)]
#[command(name = "octree")]
#[command(about = "Build, inspect and render sparse voxel octree files")]
struct Args {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Build an octree from a TOML description.
	Build {
		/// Path to configuration TOML file.
		#[arg(short, long)]
		config: PathBuf,

		/// Output file (default: `output` from the config, relative to it).
		#[arg(short, long)]
		output: Option<PathBuf>,
	},
	/// Print header and structure of an octree file.
	Info {
		/// Octree file.
		tree: PathBuf,
	},
	/// Render an octree file to PNG.
	Render(RenderArgs),
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
	/// Octree file.
	tree: PathBuf,

	/// Output PNG.
	#[arg(short, long, default_value = "frame.png")]
	output: PathBuf,

	#[arg(long, default_value_t = 640)]
	width: u32,

	#[arg(long, default_value_t = 360)]
	height: u32,

	/// Horizontal field of view in degrees.
	#[arg(long, default_value_t = 45.0)]
	fov: f32,

	/// Eye position as x,y,z.
	#[arg(long, allow_hyphen_values = true, value_parser = parse_vec3, default_value = "0.5,0.5,-2")]
	position: Vec3,

	/// Look-at point as x,y,z.
	#[arg(long, allow_hyphen_values = true, value_parser = parse_vec3, default_value = "0.5,0.5,0.5")]
	look_at: Vec3,

	/// Up vector as x,y,z.
	#[arg(long, allow_hyphen_values = true, value_parser = parse_vec3, default_value = "0,1,0")]
	up: Vec3,

	/// World-space minimum corner of the root node as x,y,z.
	#[arg(long, allow_hyphen_values = true, value_parser = parse_vec3, default_value = "0,0,0")]
	tree_position: Vec3,

	/// World-space edge length of the root node.
	#[arg(long, default_value_t = 1.0)]
	tree_scale: f32,

	/// Alternate sub-pixel sample positions between frames.
	#[arg(long)]
	jitter: bool,

	/// Frames to trace; the last one is written.
	#[arg(long, default_value_t = 1)]
	frames: u32,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
	let parts: Vec<f32> = s
		.split(',')
		.map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{}': {}", p, e)))
		.collect::<Result<_, _>>()?;
	match parts.as_slice() {
		[x, y, z] => Ok(Vec3::new(*x, *y, *z)),
		_ => Err(format!("expected x,y,z, got '{}'", s)),
	}
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	match Args::parse().command {
		Command::Build { config, output } => run_build(&config, output),
		Command::Info { tree } => run_info(&tree),
		Command::Render(args) => run_render(&args),
	}
}

fn run_build(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
	println!("Loading config from: {}", config_path.display());
	let config = Config::load(config_path)?;

	let output = output.unwrap_or_else(|| {
		config_path
			.parent()
			.unwrap_or(Path::new("."))
			.join(&config.output)
	});

	let build_config = config.build_config();
	let workers = config.workers(&build_config);
	println!(
		"Building {}³ voxels with {} workers",
		build_config.voxels_per_axis,
		workers.len()
	);

	let file = File::create(&output)
		.with_context(|| format!("Failed to create output: {}", output.display()))?;
	let mut writer = BufWriter::new(file);

	let started = Instant::now();
	let stats = build(workers, &build_config, &mut writer).context("Octree build failed")?;
	log::info!("build took {:?}", started.elapsed());

	println!(
		"  nodes: {}  leaves: {}  pruned: {}",
		stats.nodes_written, stats.leaves, stats.nodes_pruned
	);
	println!("\nDone! Output written to: {}", output.display());
	Ok(())
}

fn run_info(path: &Path) -> Result<()> {
	let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
	let (header, tree) = FlatOctree::load_with_header(&mut BufReader::new(file))
		.with_context(|| format!("Failed to load octree: {}", path.display()))?;

	let leaves = tree.nodes().iter().filter(|n| n.is_leaf()).count();
	println!("{}", path.display());
	println!("  format: {:?}", header.format);
	println!("  nodes:  {}", header.node_count);
	println!("  leaves: {}", leaves);
	println!("  depth:  {}", tree_depth(&tree));
	Ok(())
}

/// Levels below the root, following recorded child indices.
fn tree_depth(tree: &FlatOctree) -> u32 {
	if tree.is_empty() {
		return 0;
	}
	let mut depth = 0;
	let mut stack = vec![(0u32, 0u32)];
	while let Some((index, level)) = stack.pop() {
		depth = depth.max(level);
		if let Some(node) = tree.nodes().get(index as usize) {
			for &child in node.children.iter().filter(|&&c| c != NO_CHILD) {
				stack.push((child, level + 1));
			}
		}
	}
	depth
}

fn run_render(args: &RenderArgs) -> Result<()> {
	let tree = FlatOctree::load_file(&args.tree)
		.with_context(|| format!("Failed to load octree: {}", args.tree.display()))?;

	let config = RenderConfig {
		field_of_view: args.fov.to_radians(),
		tree_scale: args.tree_scale,
		tree_position: args.tree_position,
		jitter: args.jitter,
		width: args.width,
		height: args.height,
	};
	let mut tracer = Raytracer::new(config, Arc::new(tree));
	let camera = Camera::new(args.position, args.look_at, args.up);

	let started = Instant::now();
	for _ in 0..args.frames.max(1) {
		tracer.trace(&camera);
	}
	let index = tracer.wait();
	log::info!(
		"{} frame(s) in {:?}",
		tracer.frame(),
		started.elapsed()
	);

	let bytes = tracer.image(index).to_rgba_bytes();
	let image = image::RgbaImage::from_raw(args.width, args.height, bytes)
		.context("Frame buffer size does not match image size")?;
	image
		.save(&args.output)
		.with_context(|| format!("Failed to write: {}", args.output.display()))?;

	println!("Wrote {}", args.output.display());
	Ok(())
}
