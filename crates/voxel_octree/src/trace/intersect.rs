//! Ray traversal of the flat octree.
//!
//! ```text
//!   intersect_tree(node)
//!     box miss within `length`  ──► (length, CLEAR)      no improvement
//!     no children               ──► (box_dist, color)    leaf hit
//!     otherwise                 ──► nearest child result, strict `<`
//! ```
//!
//! `length` is the best distance found so far. It only ever shrinks while
//! walking the tree, so a subtree behind an earlier hit is culled by the
//! box test alone.

use glam::Vec3;

use crate::constants::{CHILD_OFFSETS, NO_CHILD};
use crate::types::Rgba8;

use super::octree::FlatNode;

/// Half-line from `origin` along unit `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
  pub origin: Vec3,
  pub direction: Vec3,
}

impl Ray {
  pub fn new(origin: Vec3, direction: Vec3) -> Self {
    Self { origin, direction }
  }

  /// Ray from `origin` through `target`.
  pub fn toward(origin: Vec3, target: Vec3) -> Self {
    Self::new(origin, (target - origin).normalize_or_zero())
  }
}

/// Slab test of `ray` against the box `[min, max]`.
///
/// Returns the entry distance (clamped to the ray origin) when the ray
/// crosses the box nearer than `length`, otherwise `length` unchanged.
/// Axis-parallel rays rely on IEEE infinities from the division.
#[inline]
pub fn intersect_box(ray: &Ray, length: f32, min: Vec3, max: Vec3) -> f32 {
  let t0 = (min - ray.origin) / ray.direction;
  let t1 = (max - ray.origin) / ray.direction;

  let far = t0.max(t1).min_element();
  let near = t0.min(t1);
  let start = near.x.max(0.0).max(near.y.max(near.z));

  let dist = far.min(start);
  if far > start && dist < length {
    dist
  } else {
    length
  }
}

/// Nearest hit below `index` for the node box at `position` with edge
/// `scale`. Missing or out-of-range indices read as empty space.
pub fn intersect_tree(
  nodes: &[FlatNode],
  ray: &Ray,
  position: Vec3,
  scale: f32,
  mut length: f32,
  index: u32,
) -> (f32, Rgba8) {
  let Some(node) = nodes.get(index as usize) else {
    return (length, Rgba8::CLEAR);
  };

  let box_dist = intersect_box(ray, length, position, position + Vec3::splat(scale));
  if box_dist == length {
    return (length, Rgba8::CLEAR);
  }

  let child_scale = scale * 0.5;
  let mut color = Rgba8::CLEAR;
  let mut occupied = 0;

  for (slot, &child) in node.children.iter().enumerate() {
    if child == NO_CHILD {
      continue;
    }
    occupied += 1;

    let offset = Vec3::from_array(CHILD_OFFSETS[slot]) * child_scale;
    let (dist, hit) = intersect_tree(nodes, ray, position + offset, child_scale, length, child);
    if dist < length {
      length = dist;
      color = hit;
    }
  }

  if occupied == 0 {
    return (box_dist, node.color);
  }
  (length, color)
}

#[cfg(test)]
#[path = "intersect_test.rs"]
mod intersect_test;
