//! Double-buffered, row-parallel raytracer.
//!
//! ```text
//!   trace(camera)          frame n                   frame n+1
//!     wait() ───────► rows ──► images[n % 2]   rows ──► images[(n+1) % 2]
//!                     (one rayon task per row, at most one frame in flight)
//! ```
//!
//! With jitter enabled the frame is traced at twice the buffer resolution
//! on both axes, but only every other logical row and column is computed;
//! the parity of the computed sub-grid alternates with the buffer index, so
//! successive frames sample interleaved sub-pixel positions.

use std::sync::Arc;

use glam::Vec3;

use super::camera::{Camera, ViewBasis};
use super::frame::FrameBuffer;
use super::intersect::Ray;
use super::octree::FlatOctree;
use crate::threading::TaskGroup;

/// Placement of the tree and output geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
  /// Full horizontal field of view, radians.
  pub field_of_view: f32,
  /// World-space edge length of the root node.
  pub tree_scale: f32,
  /// World-space minimum corner of the root node.
  pub tree_position: Vec3,
  /// Alternate sub-pixel sample positions between frames.
  pub jitter: bool,
  /// Frame buffer width in pixels.
  pub width: u32,
  /// Frame buffer height in pixels.
  pub height: u32,
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      field_of_view: 45f32.to_radians(),
      tree_scale: 1.0,
      tree_position: Vec3::ZERO,
      jitter: false,
      width: 320,
      height: 240,
    }
  }
}

pub struct Raytracer {
  config: RenderConfig,
  tree: Arc<FlatOctree>,
  images: [Arc<FrameBuffer>; 2],
  frame: u64,
  index: usize,
  rows: TaskGroup,
}

impl Raytracer {
  pub fn new(config: RenderConfig, tree: Arc<FlatOctree>) -> Self {
    let images = [
      Arc::new(FrameBuffer::new(config.width, config.height)),
      Arc::new(FrameBuffer::new(config.width, config.height)),
    ];
    Self {
      config,
      tree,
      images,
      frame: 0,
      index: 0,
      rows: TaskGroup::new(),
    }
  }

  pub fn config(&self) -> &RenderConfig {
    &self.config
  }

  pub fn tree(&self) -> &Arc<FlatOctree> {
    &self.tree
  }

  /// Frames dispatched so far.
  pub fn frame(&self) -> u64 {
    self.frame
  }

  /// Buffer `index` (0 or 1). Only stable for the index returned by
  /// [`Raytracer::wait`].
  pub fn image(&self, index: usize) -> &FrameBuffer {
    &self.images[index & 1]
  }

  /// Dispatch one frame for `camera`.
  ///
  /// Blocks until the previous frame's rows are done, then returns as soon
  /// as the new rows are queued.
  #[tracing::instrument(skip_all, name = "raytrace::frame", fields(frame = self.frame))]
  pub fn trace(&mut self, camera: &Camera) {
    self.rows.wait();

    self.index = (self.frame % 2) as usize;
    self.frame += 1;

    let step = if self.config.jitter { 2 } else { 1 };
    let offset = if self.config.jitter { self.index as u32 } else { 0 };
    let width = self.config.width * step;
    let height = self.config.height * step;
    let basis = ViewBasis::new(camera, self.config.field_of_view, width, height);

    let job = RowJob {
      tree: Arc::clone(&self.tree),
      image: Arc::clone(&self.images[self.index]),
      basis,
      eye: camera.position,
      position: self.config.tree_position,
      scale: self.config.tree_scale,
      width,
      height,
      step,
      offset,
    };
    let job = Arc::new(job);

    let mut rows = 0usize;
    for h in (offset..height).step_by(step as usize) {
      let job = Arc::clone(&job);
      self.rows.spawn(move || job.trace_row(h));
      rows += 1;
    }
    tracing::debug!(buffer = self.index, rows, "frame dispatched");
  }

  /// Block until the current frame is complete; returns the buffer index
  /// that now holds it.
  pub fn wait(&self) -> usize {
    self.rows.wait();
    self.index
  }

  /// Trace one frame and wait for it.
  pub fn render(&mut self, camera: &Camera) -> &FrameBuffer {
    self.trace(camera);
    let index = self.wait();
    self.image(index)
  }
}

impl Drop for Raytracer {
  fn drop(&mut self) {
    self.rows.wait();
  }
}

impl std::fmt::Debug for Raytracer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Raytracer")
      .field("config", &self.config)
      .field("nodes", &self.tree.len())
      .field("frame", &self.frame)
      .field("index", &self.index)
      .finish()
  }
}

/// Everything a row task needs, shared by all rows of one frame.
struct RowJob {
  tree: Arc<FlatOctree>,
  image: Arc<FrameBuffer>,
  basis: ViewBasis,
  eye: Vec3,
  position: Vec3,
  scale: f32,
  /// Logical (possibly doubled) resolution.
  width: u32,
  height: u32,
  step: u32,
  offset: u32,
}

impl RowJob {
  /// Trace logical row `h` (counted upward) into its buffer row.
  fn trace_row(&self, h: u32) {
    let y = (self.height - 1 - h) / self.step;
    self.image.with_row(y, |row| {
      for w in (self.offset..self.width).step_by(self.step as usize) {
        let target = self.basis.point(w, h);
        let ray = Ray::toward(self.eye, target);
        let (_, color) = self.tree.intersect(&ray, self.position, self.scale, f32::MAX);
        if let Some(px) = row.get_mut((w / self.step) as usize) {
          *px = color;
        }
      }
    });
  }
}

#[cfg(test)]
#[path = "raytracer_test.rs"]
mod raytracer_test;
