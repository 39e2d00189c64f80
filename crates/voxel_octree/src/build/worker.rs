//! Worker capability - the pluggable sample producer.
//!
//! A worker is handed one node's bounds at a time and pushes samples into a
//! bounded [`SampleSink`]. Returning from [`Worker::sample`] closes the sink;
//! returning an error aborts only that node.

use crossbeam_channel::Sender;

use crate::error::ProducerError;
use crate::octree::DAabb3;
use crate::types::Sample;

/// Bounded sample sink for one node.
///
/// `send` blocks while the consumer is behind (capacity
/// [`SAMPLE_CHANNEL_CAPACITY`](crate::constants::SAMPLE_CHANNEL_CAPACITY)).
#[derive(Debug)]
pub struct SampleSink {
  tx: Sender<Sample>,
}

impl SampleSink {
  pub(crate) fn new(tx: Sender<Sample>) -> Self {
    Self { tx }
  }

  /// Push a sample, blocking on backpressure.
  ///
  /// Fails with [`ProducerError::SinkClosed`] if the consumer went away.
  pub fn send(&self, sample: Sample) -> Result<(), ProducerError> {
    self.tx.send(sample).map_err(|_| ProducerError::SinkClosed)
  }
}

/// Sample producer for build-time nodes.
///
/// Each build worker task owns one `Worker` for the whole build.
pub trait Worker: Send {
  /// Emit samples for everything inside `bounds`.
  fn sample(&mut self, bounds: &DAabb3, sink: &SampleSink) -> Result<(), ProducerError>;
}

/// Blanket impl for boxed trait objects.
impl Worker for Box<dyn Worker> {
  fn sample(&mut self, bounds: &DAabb3, sink: &SampleSink) -> Result<(), ProducerError> {
    (**self).sample(bounds, sink)
  }
}
