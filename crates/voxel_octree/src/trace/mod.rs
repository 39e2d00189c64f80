//! Raytrace engine over the persisted octree.
//!
//! - [`FlatOctree`] - pointerless tree loaded from the record format
//! - [`intersect_tree`] - recursive slab-test traversal, nearest hit wins
//! - [`ViewBasis`] - pinhole camera increments per pixel
//! - [`Raytracer`] - double-buffered frames, one rayon task per row

pub mod camera;
pub mod frame;
pub mod intersect;
pub mod octree;
pub mod raytracer;

pub use camera::{Camera, ViewBasis};
pub use frame::FrameBuffer;
pub use intersect::{intersect_box, intersect_tree, Ray};
pub use octree::{FlatNode, FlatOctree};
pub use raytracer::{RenderConfig, Raytracer};
