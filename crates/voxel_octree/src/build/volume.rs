//! Lock-free completion detection by volume accounting.
//!
//! Every terminal node (leaf, pruned, or failed) retires `vpa³` at its own
//! level. Subdivision conserves volume, so the accumulator reaches the root
//! volume exactly when the last terminal node retires.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct VolumeTracker {
  traversed: AtomicU64,
  total: u64,
}

impl VolumeTracker {
  pub fn new(total: u64) -> Self {
    Self {
      traversed: AtomicU64::new(0),
      total,
    }
  }

  /// Retire `volume`. Returns `true` for exactly one caller: the one whose
  /// update lands on the total.
  #[inline]
  pub fn retire(&self, volume: u64) -> bool {
    let after = self.traversed.fetch_add(volume, Ordering::AcqRel) + volume;
    debug_assert!(after <= self.total, "retired more volume than exists");
    after == self.total
  }

  pub fn traversed(&self) -> u64 {
    self.traversed.load(Ordering::Acquire)
  }

  pub fn total(&self) -> u64 {
    self.total
  }

  pub fn is_complete(&self) -> bool {
    self.traversed() == self.total
  }
}
