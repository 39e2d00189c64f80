//! Row-locked RGBA8 frame buffer.
//!
//! Each row sits behind its own mutex so concurrent row tasks never
//! contend; row 0 is the top of the image.

use std::sync::{Mutex, PoisonError};

use crate::types::Rgba8;

pub struct FrameBuffer {
  width: u32,
  height: u32,
  rows: Box<[Mutex<Box<[Rgba8]>>]>,
}

impl FrameBuffer {
  /// Allocate a cleared buffer.
  pub fn new(width: u32, height: u32) -> Self {
    let rows = (0..height)
      .map(|_| Mutex::new(vec![Rgba8::CLEAR; width as usize].into_boxed_slice()))
      .collect();
    Self {
      width,
      height,
      rows,
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// Run `f` with exclusive access to row `y`. Out-of-range rows are
  /// ignored.
  pub fn with_row<F: FnOnce(&mut [Rgba8])>(&self, y: u32, f: F) {
    if let Some(row) = self.rows.get(y as usize) {
      let mut row = row.lock().unwrap_or_else(PoisonError::into_inner);
      f(&mut row);
    }
  }

  pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
    let row = self.rows.get(y as usize)?;
    let row = row.lock().unwrap_or_else(PoisonError::into_inner);
    row.get(x as usize).copied()
  }

  /// Reset every pixel to `color`.
  pub fn fill(&self, color: Rgba8) {
    for y in 0..self.height {
      self.with_row(y, |row| row.fill(color));
    }
  }

  /// Tightly packed RGBA8 bytes, top row first.
  pub fn to_rgba_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(self.width as usize * self.height as usize * 4);
    for row in self.rows.iter() {
      let row = row.lock().unwrap_or_else(PoisonError::into_inner);
      bytes.extend(row.iter().flat_map(|px| px.0));
    }
    bytes
  }
}

impl std::fmt::Debug for FrameBuffer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FrameBuffer")
      .field("width", &self.width)
      .field("height", &self.height)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rows_are_top_first() {
    let frame = FrameBuffer::new(2, 2);
    frame.with_row(0, |row| row[1] = Rgba8([1, 2, 3, 4]));

    assert_eq!(frame.pixel(1, 0), Some(Rgba8([1, 2, 3, 4])));
    assert_eq!(frame.pixel(2, 0), None);
    assert_eq!(frame.to_rgba_bytes()[4..8], [1, 2, 3, 4]);
    assert_eq!(frame.to_rgba_bytes().len(), 16);
  }

  #[test]
  fn test_out_of_range_row_ignored() {
    let frame = FrameBuffer::new(1, 1);
    frame.with_row(5, |row| row.fill(Rgba8([9; 4])));
    assert_eq!(frame.pixel(0, 0), Some(Rgba8::CLEAR));
  }
}
