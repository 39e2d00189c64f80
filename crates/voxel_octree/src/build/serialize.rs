//! Node serialization and child spawning.

use std::io::{Seek, Write};
use std::sync::{Mutex, PoisonError};

use super::scheduler::NodeScheduler;
use crate::codec::RecordWriter;
use crate::error::CodecError;
use crate::octree::{NodeArena, SpatialNode};

/// Write `node` and, if it warrants subdivision, submit its eight children.
///
/// The record is appended and linked into the parent's child slot under a
/// single writer lock. Returns `true` when children were spawned; their
/// volume is then retired by their own completion, not by this node.
pub fn serialize_node<W: Write + Seek>(
  node: &SpatialNode,
  writer: &Mutex<RecordWriter<W>>,
  arena: &NodeArena,
  scheduler: &NodeScheduler,
) -> Result<bool, CodecError> {
  let record = {
    let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
    let record = writer.append(node.color())?;
    if let Some(link) = node.parent {
      writer.link_child(link.record, link.slot, record)?;
    }
    record
  };

  if !node.should_subdivide() {
    return Ok(false);
  }

  let ids = arena.spawn_children(node.id);
  for (octant, id) in ids.into_iter().enumerate() {
    scheduler.submit(node.child(id, octant as u8, record));
  }
  Ok(true)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use glam::DVec3;

  use super::*;
  use crate::codec::{decode_header, decode_node, OctreeFormat};
  use crate::octree::DAabb3;
  use crate::types::{Rgba, Sample};

  fn setup() -> (Mutex<RecordWriter<Cursor<Vec<u8>>>>, NodeArena, NodeScheduler) {
    let writer = RecordWriter::new(Cursor::new(Vec::new()), OctreeFormat::Rgba8).unwrap();
    (Mutex::new(writer), NodeArena::new(), NodeScheduler::new())
  }

  #[test]
  fn test_branch_spawns_eight_children() {
    let (writer, arena, scheduler) = setup();
    let mut root = SpatialNode::root(arena.insert_root(), DAabb3::cube(DVec3::ZERO, 2.0), 2);
    root.add_sample(&Sample::new(DVec3::ONE, Rgba::WHITE));

    let has_children = serialize_node(&root, &writer, &arena, &scheduler).unwrap();

    assert!(has_children);
    assert_eq!(scheduler.pending(), 8);
    assert_eq!(arena.children(root.id).len(), 8);

    let mut slots = Vec::new();
    while scheduler.pending() > 0 {
      let child = scheduler.take().unwrap();
      assert_eq!(child.voxels_per_axis, 1);
      let link = child.parent.unwrap();
      assert_eq!(link.record, 0);
      assert_eq!(child.bounds, root.bounds.octant(link.slot));
      slots.push(link.slot);
    }
    slots.sort_unstable();
    assert_eq!(slots, (0u8..8).collect::<Vec<_>>());
  }

  #[test]
  fn test_leaf_links_into_parent_record() {
    let (writer, arena, scheduler) = setup();
    let mut root = SpatialNode::root(arena.insert_root(), DAabb3::cube(DVec3::ZERO, 2.0), 2);
    root.add_sample(&Sample::new(DVec3::ONE, Rgba::WHITE));
    serialize_node(&root, &writer, &arena, &scheduler).unwrap();

    // Serialize only the child in slot 3.
    let mut child = std::iter::from_fn(|| scheduler.take())
      .find(|c| c.parent.map(|l| l.slot) == Some(3))
      .unwrap();
    child.add_sample(&Sample::new(DVec3::ONE, Rgba::WHITE));
    let has_children = serialize_node(&child, &writer, &arena, &scheduler).unwrap();
    assert!(!has_children);

    let bytes = writer.into_inner().unwrap().finish().unwrap().into_inner();
    let mut reader = Cursor::new(bytes);
    let header = decode_header(&mut reader).unwrap();
    assert_eq!(header.node_count, 2);
    let root_record = decode_node(&mut reader, header.format).unwrap();
    assert_eq!(root_record.children, [0, 0, 0, 1, 0, 0, 0, 0]);
  }
}
