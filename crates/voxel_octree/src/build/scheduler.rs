//! NodeScheduler - work queue shared by all build workers.
//!
//! Seeded with the root, fed with children as workers discover branch
//! nodes, drained by `take`. Submission never blocks: every worker may
//! push eight children at once while the others are also submitting.
//!
//! Shutdown is "close a channel, once": the only sender of a signal channel
//! is dropped under a mutex. Any number of completion detectors may call
//! [`NodeScheduler::shutdown`]; only the first has an effect and none of
//! them block.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{select, unbounded, Receiver, Sender};

use crate::octree::SpatialNode;

pub struct NodeScheduler {
  queue_tx: Sender<SpatialNode>,
  queue_rx: Receiver<SpatialNode>,
  shutdown_tx: Mutex<Option<Sender<()>>>,
  shutdown_rx: Receiver<()>,
}

impl Default for NodeScheduler {
  fn default() -> Self {
    Self::new()
  }
}

impl NodeScheduler {
  pub fn new() -> Self {
    let (queue_tx, queue_rx) = unbounded();
    let (shutdown_tx, shutdown_rx) = unbounded();
    Self {
      queue_tx,
      queue_rx,
      shutdown_tx: Mutex::new(Some(shutdown_tx)),
      shutdown_rx,
    }
  }

  /// Queue a node for processing.
  ///
  /// Returns `false` when the scheduler has already been shut down; the
  /// node is still queued but only drained by takers that are still running.
  pub fn submit(&self, node: SpatialNode) -> bool {
    // Both ends live in `self`, so the send cannot fail.
    let _ = self.queue_tx.send(node);
    !self.is_shut_down()
  }

  /// Block until a node is available or the scheduler is shut down.
  ///
  /// After shutdown, remaining queued nodes are still handed out; `None`
  /// is returned once the queue is empty.
  pub fn take(&self) -> Option<SpatialNode> {
    select! {
      recv(self.queue_rx) -> node => node.ok(),
      recv(self.shutdown_rx) -> _ => self.queue_rx.try_recv().ok(),
    }
  }

  /// Request shutdown. Idempotent and non-blocking.
  pub fn shutdown(&self) {
    let sender = self
      .shutdown_tx
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if sender.is_some() {
      tracing::debug!("node scheduler shut down");
    }
  }

  pub fn is_shut_down(&self) -> bool {
    self
      .shutdown_tx
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .is_none()
  }

  /// Nodes queued but not yet taken.
  pub fn pending(&self) -> usize {
    self.queue_rx.len()
  }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
