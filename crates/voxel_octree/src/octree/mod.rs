//! Build-time octree data structures.
//!
//! # Volume Convention
//!
//! The root covers `vpa³` voxels; each level halves `vpa`, so a leaf at the
//! finest level covers exactly one voxel. A node's volume contribution is
//! `vpa³` at its own level, and splitting into 8 children conserves it:
//!
//! ```text
//! 8 × (vpa / 2)³ = vpa³
//! ```
//!
//! # Module Structure
//!
//! - [`bounds`]: `DAabb3` - double-precision box with octant subdivision
//! - [`node`]: `SpatialNode` - value type handed between scheduler and workers
//! - [`arena`]: `NodeArena` - index-based parent/child linkage
//! - [`config`]: `BuildConfig` - bounds, voxels per axis, output format

pub mod arena;
pub mod bounds;
pub mod config;
pub mod node;

// Re-exports
pub use arena::NodeArena;
pub use bounds::DAabb3;
pub use config::BuildConfig;
pub use node::{NodeId, ParentLink, SpatialNode};
