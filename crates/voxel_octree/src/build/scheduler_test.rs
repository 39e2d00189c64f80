use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glam::DVec3;

use super::*;
use crate::octree::{DAabb3, NodeId};

fn node(id: u32) -> SpatialNode {
  SpatialNode::root(NodeId(id), DAabb3::cube(DVec3::ZERO, 1.0), 2)
}

#[test]
fn test_take_returns_submitted_nodes_in_order() {
  let scheduler = NodeScheduler::new();
  assert!(scheduler.submit(node(1)));
  assert!(scheduler.submit(node(2)));
  assert_eq!(scheduler.pending(), 2);

  assert_eq!(scheduler.take().map(|n| n.id), Some(NodeId(1)));
  assert_eq!(scheduler.take().map(|n| n.id), Some(NodeId(2)));
  assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_take_after_shutdown_on_empty_queue_is_closed() {
  let scheduler = NodeScheduler::new();
  scheduler.shutdown();
  assert!(scheduler.is_shut_down());
  assert!(scheduler.take().is_none());
  assert!(scheduler.take().is_none());
}

/// Queued nodes are still drained after shutdown.
#[test]
fn test_shutdown_drains_queue_first() {
  let scheduler = NodeScheduler::new();
  scheduler.submit(node(1));
  scheduler.submit(node(2));
  scheduler.shutdown();

  let mut drained = Vec::new();
  while let Some(n) = scheduler.take() {
    drained.push(n.id);
  }
  assert_eq!(drained, vec![NodeId(1), NodeId(2)]);
}

/// Redundant shutdown requests never block or fault.
#[test]
fn test_shutdown_is_idempotent() {
  let scheduler = NodeScheduler::new();
  scheduler.shutdown();
  scheduler.shutdown();
  scheduler.shutdown();
  assert!(!scheduler.submit(node(1)));
}

/// A blocked taker wakes on shutdown.
#[test]
fn test_shutdown_wakes_blocked_takers() {
  let scheduler = Arc::new(NodeScheduler::new());

  let takers: Vec<_> = (0..4)
    .map(|_| {
      let scheduler = Arc::clone(&scheduler);
      thread::spawn(move || scheduler.take().is_none())
    })
    .collect();

  thread::sleep(Duration::from_millis(20));
  scheduler.shutdown();

  for taker in takers {
    assert!(taker.join().unwrap(), "Taker should observe closure");
  }
}

/// Concurrent submitters and takers lose no nodes.
#[test]
fn test_concurrent_submit_and_take() {
  let scheduler = Arc::new(NodeScheduler::new());

  let producers: Vec<_> = (0..4u32)
    .map(|p| {
      let scheduler = Arc::clone(&scheduler);
      thread::spawn(move || {
        for i in 0..100 {
          scheduler.submit(node(p * 1000 + i));
        }
      })
    })
    .collect();
  for producer in producers {
    producer.join().unwrap();
  }

  let mut taken = 0;
  while scheduler.pending() > 0 {
    assert!(scheduler.take().is_some());
    taken += 1;
  }
  assert_eq!(taken, 400);
}
