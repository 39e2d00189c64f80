//! Core value types shared by the builder, the codec and the raytracer.

use glam::{DVec3, Vec4};

/// Floating-point RGBA color, channels nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}

impl Rgba {
  pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
  pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

  pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
    Self { r, g, b, a }
  }

  #[inline]
  pub fn to_vec4(self) -> Vec4 {
    Vec4::new(self.r, self.g, self.b, self.a)
  }

  #[inline]
  pub fn from_vec4(v: Vec4) -> Self {
    Self::new(v.x, v.y, v.z, v.w)
  }

  /// Quantize to 8 bits per channel, rounding to nearest.
  #[inline]
  pub fn to_rgba8(self) -> Rgba8 {
    Rgba8([
      quantize(self.r),
      quantize(self.g),
      quantize(self.b),
      quantize(self.a),
    ])
  }
}

#[inline]
fn quantize(channel: f32) -> u8 {
  (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// 8-bit RGBA color as stored in frame buffers and flat octree nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba8(pub [u8; 4]);

impl Rgba8 {
  /// Background color for rays that hit nothing.
  pub const CLEAR: Self = Self([0, 0, 0, 0]);

  #[inline]
  pub fn to_rgba(self) -> Rgba {
    let [r, g, b, a] = self.0;
    Rgba::new(
      r as f32 / 255.0,
      g as f32 / 255.0,
      b as f32 / 255.0,
      a as f32 / 255.0,
    )
  }
}

impl From<Rgba> for Rgba8 {
  fn from(color: Rgba) -> Self {
    color.to_rgba8()
  }
}

/// A single measurement emitted by a producer for a node's volume.
///
/// Samples are consumed by the builder and never persisted individually;
/// only their count and mean color survive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
  /// World-space sample position.
  pub position: DVec3,
  /// Sampled color.
  pub color: Rgba,
}

impl Sample {
  pub fn new(position: DVec3, color: Rgba) -> Self {
    Self { position, color }
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
