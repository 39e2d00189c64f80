//! Pinhole camera and per-pixel view-plane basis.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Eye position, look-at target and up hint, all in world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
  pub position: Vec3,
  pub look_at: Vec3,
  pub up: Vec3,
}

impl Camera {
  pub fn new(position: Vec3, look_at: Vec3, up: Vec3) -> Self {
    Self {
      position,
      look_at,
      up,
    }
  }
}

impl Default for Camera {
  fn default() -> Self {
    Self::new(Vec3::new(0.0, 0.0, -2.0), Vec3::ZERO, Vec3::Y)
  }
}

/// World-space step per pixel along x and y, and the view plane's
/// bottom-left corner. Pixel `(w, h)` lies at
/// `bottom_left + x_inc * w + y_inc * h`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBasis {
  pub x_inc: Vec3,
  pub y_inc: Vec3,
  pub bottom_left: Vec3,
}

impl ViewBasis {
  /// Build the basis for an image of `width` x `height` pixels.
  ///
  /// The view plane passes through `look_at`; `field_of_view` is the full
  /// horizontal angle in radians.
  pub fn new(camera: &Camera, field_of_view: f32, width: u32, height: u32) -> Self {
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;

    let view = camera.look_at - camera.position;
    let u = view.cross(camera.up);
    let v = u.cross(view);
    let u = u.normalize_or_zero();
    let v = v.normalize_or_zero();

    let half_width = (field_of_view * 0.5).tan();
    let half_height = half_width * height / width;

    let bottom_left = camera.look_at - v * half_height - u * half_width;

    Self {
      x_inc: u * (2.0 * half_width) / width,
      y_inc: v * (2.0 * half_height) / height,
      bottom_left,
    }
  }

  /// View-plane point for pixel coordinates `(w, h)`, `h` counted upward.
  #[inline]
  pub fn point(&self, w: u32, h: u32) -> Vec3 {
    self.bottom_left + self.x_inc * w as f32 + self.y_inc * h as f32
  }
}
