//! SpatialNode - build-time octree node owned by exactly one worker.
//!
//! A node is created by the scheduler (root) or by its parent during
//! serialization (children), travels through the scheduler queue by value,
//! and is dropped once it has been serialized or pruned.

use glam::DVec4;

use super::bounds::DAabb3;
use crate::types::{Rgba, Sample};

/// Index of a node in the build arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Back-reference from a child to the slot it occupies in its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParentLink {
  /// Arena index of the parent.
  pub node: NodeId,
  /// Record index of the parent in the output file.
  pub record: u32,
  /// Slot (octant) this child occupies in the parent, 0..8.
  pub slot: u8,
}

/// Build-time octree node.
#[derive(Clone, Debug)]
pub struct SpatialNode {
  pub id: NodeId,
  pub bounds: DAabb3,
  /// Linear subdivision factor at this node's level.
  pub voxels_per_axis: u32,
  /// Samples received from the producer so far.
  pub num_samples: u64,
  /// `None` for the root.
  pub parent: Option<ParentLink>,
  color_sum: DVec4,
}

impl SpatialNode {
  /// Create the root node covering the whole build volume.
  pub fn root(id: NodeId, bounds: DAabb3, voxels_per_axis: u32) -> Self {
    Self {
      id,
      bounds,
      voxels_per_axis,
      num_samples: 0,
      parent: None,
      color_sum: DVec4::ZERO,
    }
  }

  /// Create the child occupying `octant`, at half this node's scale.
  ///
  /// `record` is this node's already-assigned record index in the output.
  pub fn child(&self, id: NodeId, octant: u8, record: u32) -> Self {
    debug_assert!(octant < 8, "octant out of range");
    debug_assert!(self.voxels_per_axis > 1, "cannot subdivide a unit node");
    Self {
      id,
      bounds: self.bounds.octant(octant),
      voxels_per_axis: self.voxels_per_axis / 2,
      num_samples: 0,
      parent: Some(ParentLink {
        node: self.id,
        record,
        slot: octant,
      }),
      color_sum: DVec4::ZERO,
    }
  }

  /// Accumulate one sample.
  #[inline]
  pub fn add_sample(&mut self, sample: &Sample) {
    self.num_samples += 1;
    self.color_sum += sample.color.to_vec4().as_dvec4();
  }

  /// Volume this node retires when it becomes terminal: `vpa³`.
  #[inline]
  pub fn volume(&self) -> u64 {
    let vpa = self.voxels_per_axis as u64;
    vpa * vpa * vpa
  }

  /// Mean color of all samples, transparent when empty.
  pub fn color(&self) -> Rgba {
    if self.num_samples == 0 {
      return Rgba::TRANSPARENT;
    }
    Rgba::from_vec4((self.color_sum / self.num_samples as f64).as_vec4())
  }

  /// True when the node holds samples and can still be split.
  #[inline]
  pub fn should_subdivide(&self) -> bool {
    self.num_samples > 0 && self.voxels_per_axis > 1
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
