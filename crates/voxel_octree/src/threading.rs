//! Counted task group on rayon's pool.
//!
//! `spawn` queues fire-and-forget work with `rayon::spawn`; `wait` blocks
//! until every task spawned so far has finished. The count is decremented
//! by a drop guard when the task's closure ends.
//!
//! # Usage
//!
//! ```ignore
//! let rows = TaskGroup::new();
//! for y in 0..height {
//!   rows.spawn(move || trace_row(y));
//! }
//! rows.wait();
//! ```

use std::sync::{Arc, Condvar, Mutex, PoisonError};

#[derive(Default)]
struct GroupState {
  pending: Mutex<usize>,
  done: Condvar,
}

impl GroupState {
  fn finish_one(&self) {
    let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
    *pending = pending.saturating_sub(1);
    if *pending == 0 {
      self.done.notify_all();
    }
  }
}

/// Decrements the group's count when the task ends, normally or not.
struct Completion(Arc<GroupState>);

impl Drop for Completion {
  fn drop(&mut self) {
    self.0.finish_one();
  }
}

/// Wait group for tasks spawned on rayon's global pool.
#[derive(Clone, Default)]
pub struct TaskGroup {
  state: Arc<GroupState>,
}

impl TaskGroup {
  pub fn new() -> Self {
    Self::default()
  }

  /// Spawn `work` on rayon's pool (non-blocking).
  pub fn spawn<F>(&self, work: F)
  where
    F: FnOnce() + Send + 'static,
  {
    {
      let mut pending = self.state.pending.lock().unwrap_or_else(PoisonError::into_inner);
      *pending += 1;
    }

    let completion = Completion(Arc::clone(&self.state));
    rayon::spawn(move || {
      let _completion = completion;
      work();
    });
  }

  /// Block until no spawned task is outstanding.
  pub fn wait(&self) {
    let pending = self.state.pending.lock().unwrap_or_else(PoisonError::into_inner);
    let _pending = self
      .state
      .done
      .wait_while(pending, |pending| *pending > 0)
      .unwrap_or_else(PoisonError::into_inner);
  }

  /// Tasks queued or running.
  pub fn pending(&self) -> usize {
    *self.state.pending.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Get the number of worker threads in rayon's pool.
  pub fn num_threads(&self) -> usize {
    rayon::current_num_threads()
  }
}

impl std::fmt::Debug for TaskGroup {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TaskGroup")
      .field("pending", &self.pending())
      .finish()
  }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  #[test]
  fn test_wait_sees_all_tasks() {
    let group = TaskGroup::new();
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..64 {
      let counter = Arc::clone(&counter);
      group.spawn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
      });
    }
    group.wait();

    assert_eq!(counter.load(Ordering::SeqCst), 64);
    assert_eq!(group.pending(), 0);
  }

  #[test]
  fn test_wait_on_idle_group_returns() {
    let group = TaskGroup::new();
    group.wait();
    group.wait();
    assert!(group.num_threads() >= 1);
  }

  /// A group is reused frame after frame.
  #[test]
  fn test_group_reused_across_rounds() {
    let group = TaskGroup::new();
    let counter = Arc::new(AtomicUsize::new(0));

    for round in 1..=3 {
      for _ in 0..8 {
        let counter = Arc::clone(&counter);
        group.spawn(move || {
          counter.fetch_add(1, Ordering::SeqCst);
        });
      }
      group.wait();
      assert_eq!(counter.load(Ordering::SeqCst), round * 8);
    }
  }
}
