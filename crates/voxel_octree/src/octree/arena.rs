//! NodeArena - index-based parent/child bookkeeping for the build tree.
//!
//! Nodes themselves travel by value through the scheduler; the arena only
//! keeps the linkage. A child refers to its parent by arena index plus slot
//! number, so pruning is "clear `children[slot]` of the parent" with no
//! back-pointers involved.

use std::sync::{Mutex, PoisonError};

use smallvec::SmallVec;

use super::node::{NodeId, ParentLink};
use crate::constants::CHILD_COUNT;

#[derive(Clone, Debug, Default)]
struct ArenaSlot {
  children: [Option<NodeId>; CHILD_COUNT],
  live: bool,
}

#[derive(Debug, Default)]
struct ArenaState {
  slots: Vec<ArenaSlot>,
  live: usize,
}

/// Shared build-tree linkage.
///
/// At the end of a successful build no node is live, and every written
/// non-root node occupies exactly one parent slot.
#[derive(Debug, Default)]
pub struct NodeArena {
  state: Mutex<ArenaState>,
}

impl ArenaState {
  fn kill(&mut self, id: NodeId) {
    if let Some(slot) = self.slots.get_mut(id.0 as usize) {
      if slot.live {
        slot.live = false;
        self.live -= 1;
      }
    }
  }
}

impl NodeArena {
  pub fn new() -> Self {
    Self::default()
  }

  fn with_state<R>(&self, f: impl FnOnce(&mut ArenaState) -> R) -> R {
    let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut state)
  }

  /// Register the root node.
  pub fn insert_root(&self) -> NodeId {
    self.with_state(|state| {
      let id = NodeId(state.slots.len() as u32);
      state.slots.push(ArenaSlot {
        live: true,
        ..ArenaSlot::default()
      });
      state.live += 1;
      id
    })
  }

  /// Register eight children for `parent`, filling every child slot.
  pub fn spawn_children(&self, parent: NodeId) -> [NodeId; CHILD_COUNT] {
    self.with_state(|state| {
      let base = state.slots.len() as u32;
      let ids: [NodeId; CHILD_COUNT] = std::array::from_fn(|i| NodeId(base + i as u32));
      state.slots.extend((0..CHILD_COUNT).map(|_| ArenaSlot {
        live: true,
        ..ArenaSlot::default()
      }));
      state.live += CHILD_COUNT;
      if let Some(slot) = state.slots.get_mut(parent.0 as usize) {
        slot.children = ids.map(Some);
      }
      ids
    })
  }

  /// Detach a pruned node from its parent and drop it from the live set.
  pub fn prune(&self, id: NodeId, link: Option<ParentLink>) {
    self.with_state(|state| {
      if let Some(link) = link {
        if let Some(parent) = state.slots.get_mut(link.node.0 as usize) {
          parent.children[link.slot as usize] = None;
        }
      }
      state.kill(id);
    })
  }

  /// Drop a serialized node from the live set; its child slots stay.
  pub fn retire(&self, id: NodeId) {
    self.with_state(|state| state.kill(id))
  }

  /// Occupied child slots of `id` as `(slot, child)` pairs.
  pub fn children(&self, id: NodeId) -> SmallVec<[(u8, NodeId); CHILD_COUNT]> {
    self.with_state(|state| {
      state
        .slots
        .get(id.0 as usize)
        .map(|slot| {
          slot
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| child.map(|c| (i as u8, c)))
            .collect()
        })
        .unwrap_or_default()
    })
  }

  /// Nodes created but not yet serialized or pruned.
  pub fn live_count(&self) -> usize {
    self.with_state(|state| state.live)
  }

  /// Child slots still pointing at a node, across the whole tree.
  pub fn linked_count(&self) -> usize {
    self.with_state(|state| {
      state
        .slots
        .iter()
        .map(|slot| slot.children.iter().flatten().count())
        .sum()
    })
  }

  /// Total nodes ever registered.
  pub fn len(&self) -> usize {
    self.with_state(|state| state.slots.len())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_spawn_fills_all_slots() {
    let arena = NodeArena::new();
    let root = arena.insert_root();
    let ids = arena.spawn_children(root);

    assert_eq!(arena.len(), 9);
    assert_eq!(arena.live_count(), 9);
    let children = arena.children(root);
    assert_eq!(children.len(), 8);
    for (slot, child) in children {
      assert_eq!(ids[slot as usize], child);
    }
  }

  #[test]
  fn test_prune_clears_parent_slot() {
    let arena = NodeArena::new();
    let root = arena.insert_root();
    let ids = arena.spawn_children(root);

    arena.prune(
      ids[5],
      Some(ParentLink {
        node: root,
        record: 0,
        slot: 5,
      }),
    );

    let children = arena.children(root);
    assert_eq!(children.len(), 7);
    assert!(children.iter().all(|&(slot, _)| slot != 5));
    assert_eq!(arena.live_count(), 8);
    assert_eq!(arena.linked_count(), 7);
  }

  /// Retiring twice does not double count.
  #[test]
  fn test_retire_is_idempotent() {
    let arena = NodeArena::new();
    let root = arena.insert_root();
    arena.retire(root);
    arena.retire(root);
    assert_eq!(arena.live_count(), 0);
  }

  #[test]
  fn test_retire_keeps_linkage() {
    let arena = NodeArena::new();
    let root = arena.insert_root();
    arena.spawn_children(root);
    arena.retire(root);

    assert_eq!(arena.children(root).len(), 8);
    assert_eq!(arena.live_count(), 8);
  }

  #[test]
  fn test_prune_root_has_no_parent() {
    let arena = NodeArena::new();
    let root = arena.insert_root();
    arena.prune(root, None);
    assert_eq!(arena.live_count(), 0);
  }
}
