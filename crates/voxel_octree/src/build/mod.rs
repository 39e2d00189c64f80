//! Concurrent octree builder.
//!
//! # Per-node algorithm
//!
//! 1. Take a node from the [`NodeScheduler`]; exit when it is closed.
//! 2. Hand the node's bounds to the paired [`Worker`] over a bounded sample
//!    channel and count samples as they arrive.
//! 3. Producer error: retire the node's volume, record the error, move on.
//! 4. No samples: prune (clear the parent's slot), retire the volume.
//! 5. Otherwise serialize; a leaf retires its volume, a branch defers it to
//!    the eight children it just submitted.
//!
//! The worker whose retirement lands exactly on the root volume shuts the
//! scheduler down.

pub mod builder;
pub mod scheduler;
pub mod serialize;
pub mod volume;
pub mod worker;

pub use builder::{build, BuildStats};
pub use scheduler::NodeScheduler;
pub use serialize::serialize_node;
pub use volume::VolumeTracker;
pub use worker::{SampleSink, Worker};
