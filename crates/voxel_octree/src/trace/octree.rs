//! FlatOctree - pointerless, index-addressed octree for rendering.
//!
//! Loaded once, immutable afterwards, and shared read-only across every
//! row task of every frame. Child references are record indices; `0` is
//! the root's own index and therefore means "no child".

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use glam::Vec3;

use super::intersect::{intersect_tree, Ray};
use crate::codec::{decode_header, decode_node, OctreeHeader};
use crate::constants::{CHILD_COUNT, NO_CHILD};
use crate::error::CodecError;
use crate::types::Rgba8;

/// Records reserved up front; the rest grows as records actually decode.
const MAX_PREALLOCATED_NODES: usize = 1 << 16;

/// Render-time node: quantized color plus child record indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlatNode {
  pub color: Rgba8,
  pub children: [u32; CHILD_COUNT],
}

impl FlatNode {
  pub fn new(color: Rgba8, children: [u32; CHILD_COUNT]) -> Self {
    Self { color, children }
  }

  pub fn leaf(color: Rgba8) -> Self {
    Self::new(color, [NO_CHILD; CHILD_COUNT])
  }

  #[inline]
  pub fn child_count(&self) -> usize {
    self.children.iter().filter(|&&c| c != NO_CHILD).count()
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.iter().all(|&c| c == NO_CHILD)
  }
}

/// Flat octree, root at index 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatOctree {
  nodes: Vec<FlatNode>,
}

impl FlatOctree {
  /// Wrap nodes, checking every child index is in range and written
  /// after its parent, which also rules out cycles.
  pub fn new(nodes: Vec<FlatNode>) -> Result<Self, CodecError> {
    let count = nodes.len() as u64;
    for (index, node) in nodes.iter().enumerate() {
      let index = index as u32;
      for &child in node.children.iter().filter(|&&c| c != NO_CHILD) {
        if child as u64 >= count {
          return Err(CodecError::ChildOutOfRange {
            node: index,
            child,
            count,
          });
        }
        if child <= index {
          return Err(CodecError::ChildBeforeParent { node: index, child });
        }
      }
    }
    Ok(Self { nodes })
  }

  /// Read a header, then exactly `node_count` records. Any decode error
  /// aborts the whole load.
  pub fn load<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
    Self::load_with_header(reader).map(|(_, tree)| tree)
  }

  /// [`FlatOctree::load`], also returning the decoded header.
  #[tracing::instrument(skip_all, name = "octree::load")]
  pub fn load_with_header<R: Read>(reader: &mut R) -> Result<(OctreeHeader, Self), CodecError> {
    let header = decode_header(reader)?;
    if header.node_count > u32::MAX as u64 {
      return Err(CodecError::TooManyNodes);
    }
    let count = usize::try_from(header.node_count).map_err(|_| CodecError::TooManyNodes)?;

    // The count is untrusted until the records are actually there.
    let mut nodes = Vec::with_capacity(count.min(MAX_PREALLOCATED_NODES));
    for _ in 0..count {
      let record = decode_node(reader, header.format)?;
      nodes.push(FlatNode::new(record.color.to_rgba8(), record.children));
    }

    let tree = Self::new(nodes)?;
    tracing::info!(nodes = tree.len(), format = ?header.format, "octree loaded");
    Ok((header, tree))
  }

  /// Load from a file path.
  pub fn load_file(path: impl AsRef<Path>) -> Result<Self, CodecError> {
    let mut reader = BufReader::new(File::open(path)?);
    Self::load(&mut reader)
  }

  pub fn nodes(&self) -> &[FlatNode] {
    &self.nodes
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Nearest hit of `ray` against the tree placed at `position` with edge
  /// length `scale`. Returns `(max_length, CLEAR)` on a miss.
  pub fn intersect(&self, ray: &Ray, position: Vec3, scale: f32, max_length: f32) -> (f32, Rgba8) {
    if self.nodes.is_empty() {
      return (max_length, Rgba8::CLEAR);
    }
    intersect_tree(&self.nodes, ray, position, scale, max_length, 0)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;
  use crate::codec::{encode_header, encode_node, OctreeFormat, OctreeHeader};
  use crate::types::Rgba;

  fn encode(nodes: &[(Rgba, [u32; CHILD_COUNT])], declared: u64) -> Vec<u8> {
    let mut bytes = Vec::new();
    encode_header(
      &mut bytes,
      &OctreeHeader {
        node_count: declared,
        format: OctreeFormat::Rgba8,
      },
    )
    .unwrap();
    for (color, children) in nodes {
      encode_node(&mut bytes, OctreeFormat::Rgba8, *color, children).unwrap();
    }
    bytes
  }

  #[test]
  fn test_load_two_level_tree() {
    let bytes = encode(
      &[
        (Rgba::WHITE, [0, 0, 0, 0, 0, 0, 0, 1]),
        (Rgba::new(1.0, 0.0, 0.0, 1.0), [0; CHILD_COUNT]),
      ],
      2,
    );
    let tree = FlatOctree::load(&mut Cursor::new(bytes)).unwrap();

    assert_eq!(tree.len(), 2);
    assert_eq!(tree.nodes()[0].child_count(), 1);
    assert!(tree.nodes()[1].is_leaf());
    assert_eq!(tree.nodes()[1].color, Rgba8([255, 0, 0, 255]));
  }

  #[test]
  fn test_child_out_of_range_rejected() {
    let bytes = encode(&[(Rgba::WHITE, [5, 0, 0, 0, 0, 0, 0, 0])], 1);
    let err = FlatOctree::load(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(
      err,
      CodecError::ChildOutOfRange {
        node: 0,
        child: 5,
        count: 1
      }
    ));
  }

  /// Fewer records than the header declares aborts the load.
  #[test]
  fn test_truncated_file_rejected() {
    let bytes = encode(&[(Rgba::WHITE, [0; CHILD_COUNT])], 3);
    let err = FlatOctree::load(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
  }

  /// A header claiming far more records than follow fails cleanly
  /// instead of reserving memory for all of them.
  #[test]
  fn test_huge_declared_count_without_records() {
    let mut bytes = Vec::new();
    encode_header(
      &mut bytes,
      &OctreeHeader {
        node_count: u32::MAX as u64,
        format: OctreeFormat::RgbaF32,
      },
    )
    .unwrap();

    let err = FlatOctree::load(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
  }

  #[test]
  fn test_count_beyond_u32_rejected() {
    let mut bytes = Vec::new();
    encode_header(
      &mut bytes,
      &OctreeHeader {
        node_count: u32::MAX as u64 + 1,
        format: OctreeFormat::Rgba8,
      },
    )
    .unwrap();

    let err = FlatOctree::load(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, CodecError::TooManyNodes));
  }

  /// A node pointing at itself or an earlier record cannot come from the
  /// writer and would hide geometry at render time.
  #[test]
  fn test_self_reference_rejected() {
    let bytes = encode(
      &[
        (Rgba::WHITE, [1, 0, 0, 0, 0, 0, 0, 0]),
        (Rgba::WHITE, [1; CHILD_COUNT]),
      ],
      2,
    );
    let err = FlatOctree::load(&mut Cursor::new(bytes)).unwrap_err();
    assert!(matches!(
      err,
      CodecError::ChildBeforeParent { node: 1, child: 1 }
    ));
  }

  #[test]
  fn test_back_reference_rejected() {
    let nodes = vec![
      FlatNode::new(Rgba8::CLEAR, [1, 2, 0, 0, 0, 0, 0, 0]),
      FlatNode::leaf(Rgba8::CLEAR),
      FlatNode::new(Rgba8::CLEAR, [0, 0, 0, 1, 0, 0, 0, 0]),
    ];
    assert!(matches!(
      FlatOctree::new(nodes),
      Err(CodecError::ChildBeforeParent { node: 2, child: 1 })
    ));
  }

  #[test]
  fn test_load_with_header_reports_format() {
    let mut bytes = Vec::new();
    encode_header(
      &mut bytes,
      &OctreeHeader {
        node_count: 1,
        format: OctreeFormat::RgbaF32,
      },
    )
    .unwrap();
    encode_node(&mut bytes, OctreeFormat::RgbaF32, Rgba::WHITE, &[0; CHILD_COUNT]).unwrap();

    let (header, tree) = FlatOctree::load_with_header(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(header.format, OctreeFormat::RgbaF32);
    assert_eq!(header.node_count, 1);
    assert_eq!(tree.len(), 1);
  }

  #[test]
  fn test_empty_tree_misses_everything() {
    let tree = FlatOctree::default();
    let ray = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::Z);
    assert_eq!(
      tree.intersect(&ray, Vec3::ZERO, 1.0, f32::MAX),
      (f32::MAX, Rgba8::CLEAR)
    );
  }
}
