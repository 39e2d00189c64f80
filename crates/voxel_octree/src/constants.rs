//! Layout constants for the persisted octree and the build pipeline.
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          OCTREE FILE LAYOUT                          │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  offset 0    [magic "VOXO"][version u16][format u16][node count u64] │
//! │  offset 16   record 0 (root)                                         │
//! │  offset 16+R record 1                                                │
//! │  ...                                                                 │
//! │                                                                      │
//! │  record:     [color: 4×u8 | 4×f32][child 0..8: u32 little-endian]    │
//! │                                                                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are appended in completion order, not spatial order. The root
//! is always written first, so a child index of `0` can never point at a
//! real child and doubles as the "absent" marker.
//!
//! # Child Octants
//!
//! ```text
//!       6──────7        bit 0: +X
//!      /│     /│        bit 1: +Y
//!     4─┼────5 │        bit 2: +Z
//!     │ 2────┼─3
//!     │/     │/
//!     0──────1
//! ```

/// Magic bytes at the start of every octree file.
pub const MAGIC: [u8; 4] = *b"VOXO";

/// Current file format version.
pub const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_LEN: u64 = 16;

/// Number of child slots per node.
pub const CHILD_COUNT: usize = 8;

/// Bytes used by the child index table of one record.
pub const CHILD_TABLE_LEN: u64 = (CHILD_COUNT * 4) as u64;

/// Child index meaning "no child".
pub const NO_CHILD: u32 = 0;

/// Capacity of the per-node sample channel between producer and consumer.
pub const SAMPLE_CHANNEL_CAPACITY: usize = 10;

/// Largest supported voxels-per-axis (keeps `vpa³` inside a `u64`).
pub const MAX_VOXELS_PER_AXIS: u32 = 1 << 20;

/// Unit corner offsets for each octant, indexed by child slot.
pub const CHILD_OFFSETS: [[f32; 3]; CHILD_COUNT] = [
  [0.0, 0.0, 0.0],
  [1.0, 0.0, 0.0],
  [0.0, 1.0, 0.0],
  [1.0, 1.0, 0.0],
  [0.0, 0.0, 1.0],
  [1.0, 0.0, 1.0],
  [0.0, 1.0, 1.0],
  [1.0, 1.0, 1.0],
];

/// Decompose an octant index into per-axis offsets (0 or 1).
#[inline]
pub fn octant_bits(octant: u8) -> [u32; 3] {
  [
    (octant & 1) as u32,
    ((octant >> 1) & 1) as u32,
    ((octant >> 2) & 1) as u32,
  ]
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
