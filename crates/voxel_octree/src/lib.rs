//! voxel_octree - concurrent sparse octree builder and raytracer
//!
//! Builds a sparse color octree from pluggable sample producers on a fixed
//! worker pool, persists it as fixed-size node records, and renders the
//! loaded tree with a double-buffered, row-parallel raytracer.
//!
//! # Features
//!
//! - **Concurrent builder**: N producer/consumer worker pairs over a shared
//!   node scheduler, with lock-free completion detection by volume
//! - **Pruning**: nodes without samples are never written
//! - **Record format**: seekable writer with child-slot backpatching; the
//!   root is always record 0
//! - **Raytracer**: slab-test traversal of the flat tree, optional temporal
//!   jitter, one rayon task per row
//!
//! # Example
//!
//! ```ignore
//! use std::io::Cursor;
//! use voxel_octree::{build, BuildConfig, FlatOctree, SolidWorker, Rgba};
//!
//! let config = BuildConfig::default();
//! let workers = (0..4)
//!   .map(|_| SolidWorker::new(config.voxel_size(), Rgba::WHITE))
//!   .collect();
//!
//! let mut out = Cursor::new(Vec::new());
//! let stats = build(workers, &config, &mut out)?;
//!
//! out.set_position(0);
//! let tree = FlatOctree::load(&mut out)?;
//! assert_eq!(tree.len() as u64, stats.nodes_written);
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use error::{BuildError, CodecError, ProducerError, SessionError};
pub use types::{Rgba, Rgba8, Sample};

// Spatial nodes, arena and build configuration
pub mod octree;
pub use octree::{BuildConfig, DAabb3, NodeId, SpatialNode};

// Node record format
pub mod codec;
pub use codec::{OctreeFormat, OctreeHeader, RecordWriter};

// Concurrent builder
pub mod build;
pub use build::{build, BuildStats, SampleSink, Worker};

// Row task group for the raytracer
pub mod threading;
pub use threading::TaskGroup;

// Loader and raytracer
pub mod trace;
pub use trace::{Camera, FlatNode, FlatOctree, Raytracer, RenderConfig};

// Render-session messages
pub mod session;
pub use session::{RenderSession, SetupMessage, UpdateMessage};

// Reference producers
pub mod samplers;
pub use samplers::{SolidWorker, SphereWorker};
