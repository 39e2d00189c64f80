//! Octree builder - fixed worker pool over the node scheduler.
//!
//! ```text
//!            ┌──────────────┐ take  ┌──────────┐ SampleJob ┌──────────┐
//!   root ──► │ NodeScheduler├──────►│ consumer ├──────────►│ producer │
//!            └──────▲───────┘       │  (task)  │◄──────────┤ (Worker) │
//!                   │               └────┬─────┘ samples   └──────────┘
//!                   │ 8 children         │        (bounded, 10)
//!                   └────────────────────┤
//!                                        ▼
//!                              Mutex<RecordWriter>
//! ```
//!
//! Each of the N worker slots is a consumer/producer thread pair. The
//! consumer owns the node for its whole processing lifetime, so the only
//! shared mutable state is the scheduler, the writer mutex, the arena and
//! the atomic volume accumulator.

use std::io::{Seek, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};

use super::scheduler::NodeScheduler;
use super::serialize::serialize_node;
use super::volume::VolumeTracker;
use super::worker::{SampleSink, Worker};
use crate::codec::RecordWriter;
use crate::constants::SAMPLE_CHANNEL_CAPACITY;
use crate::error::{BuildError, ProducerError};
use crate::octree::{BuildConfig, DAabb3, NodeArena, SpatialNode};

/// Summary of a successful build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
  /// Records written to the output.
  pub nodes_written: u64,
  /// Nodes dropped because their producer emitted no samples.
  pub nodes_pruned: u64,
  /// Written nodes without children.
  pub leaves: u64,
  /// Nodes whose producer failed.
  pub producer_failures: u64,
  /// Volume retired by terminal nodes; equals the root volume.
  pub volume_traversed: u64,
  /// Nodes ever scheduled: written, pruned or failed, each exactly once.
  pub nodes_scheduled: u64,
}

#[derive(Debug, Default)]
struct BuildCounters {
  pruned: AtomicU64,
  leaves: AtomicU64,
  producer_failures: AtomicU64,
}

struct SampleJob {
  bounds: DAabb3,
  sink: SampleSink,
}

type ProducerResult = Result<(), ProducerError>;

struct BuildShared<S: Write + Seek> {
  scheduler: NodeScheduler,
  arena: NodeArena,
  volume: VolumeTracker,
  writer: Mutex<RecordWriter<S>>,
  first_error: OnceLock<BuildError>,
  counters: BuildCounters,
}

impl<S: Write + Seek> BuildShared<S> {
  /// Retire a terminal node; the caller that completes the volume shuts
  /// the scheduler down.
  fn retire(&self, node: &SpatialNode) {
    if self.volume.retire(node.volume()) {
      self.scheduler.shutdown();
    }
  }

  /// Keep the first error seen across the pool.
  fn record_error(&self, err: BuildError) {
    let _ = self.first_error.set(err);
  }
}

/// Build an octree from `workers` into `output`.
///
/// One worker task runs per entry in `workers`. Returns the first error any
/// task encountered, after every task has exited. On error the output holds
/// a zero node count and must be treated as unusable.
#[tracing::instrument(
  skip_all,
  name = "octree::build",
  fields(workers = workers.len(), voxels_per_axis = config.voxels_per_axis)
)]
pub fn build<W, S>(
  workers: Vec<W>,
  config: &BuildConfig,
  output: &mut S,
) -> Result<BuildStats, BuildError>
where
  W: Worker,
  S: Write + Seek + Send,
{
  if workers.is_empty() {
    return Err(BuildError::NoWorkers);
  }
  config.validate()?;

  let shared = BuildShared {
    scheduler: NodeScheduler::new(),
    arena: NodeArena::new(),
    volume: VolumeTracker::new(config.total_volume()),
    writer: Mutex::new(RecordWriter::new(output, config.format)?),
    first_error: OnceLock::new(),
    counters: BuildCounters::default(),
  };

  let root = shared.arena.insert_root();
  shared
    .scheduler
    .submit(SpatialNode::root(root, config.bounds, config.voxels_per_axis));

  thread::scope(|scope| {
    for (index, worker) in workers.into_iter().enumerate() {
      let (job_tx, job_rx) = bounded::<SampleJob>(1);
      let (result_tx, result_rx) = bounded::<ProducerResult>(1);
      let shared = &shared;

      scope.spawn(move || run_producer(worker, job_rx, result_tx));
      scope.spawn(move || run_consumer(index, shared, job_tx, result_rx));
    }
  });

  let BuildShared {
    arena,
    volume,
    writer,
    first_error,
    counters,
    ..
  } = shared;

  if let Some(err) = first_error.into_inner() {
    tracing::error!(error = %err, "octree build failed");
    return Err(err);
  }

  let writer = writer.into_inner().unwrap_or_else(PoisonError::into_inner);
  let stats = BuildStats {
    nodes_written: writer.len() as u64,
    nodes_pruned: counters.pruned.into_inner(),
    leaves: counters.leaves.into_inner(),
    producer_failures: counters.producer_failures.into_inner(),
    volume_traversed: volume.traversed(),
    nodes_scheduled: arena.len() as u64,
  };
  writer.finish()?;

  let live = arena.live_count();
  let linked = arena.linked_count() as u64;
  debug_assert!(volume.is_complete(), "build finished without retiring all volume");
  debug_assert_eq!(live, 0, "build finished with unprocessed nodes");
  debug_assert_eq!(
    linked,
    stats.nodes_written.saturating_sub(1),
    "parent slots disagree with written records"
  );
  tracing::info!(
    nodes = stats.nodes_written,
    leaves = stats.leaves,
    pruned = stats.nodes_pruned,
    scheduled = stats.nodes_scheduled,
    live,
    linked,
    "octree build complete"
  );
  Ok(stats)
}

/// Producer half of a worker slot: samples one node per job.
fn run_producer<W: Worker>(
  mut worker: W,
  jobs: Receiver<SampleJob>,
  results: Sender<ProducerResult>,
) {
  for SampleJob { bounds, sink } in jobs {
    let result = worker.sample(&bounds, &sink);
    // Closing the sink ends the consumer's drain loop.
    drop(sink);
    if results.send(result).is_err() {
      break;
    }
  }
}

/// Consumer half of a worker slot: owns nodes from take to retire.
fn run_consumer<S: Write + Seek>(
  index: usize,
  shared: &BuildShared<S>,
  jobs: Sender<SampleJob>,
  results: Receiver<ProducerResult>,
) {
  let _span = tracing::debug_span!("build_worker", worker = index).entered();

  while let Some(mut node) = shared.scheduler.take() {
    let (sample_tx, sample_rx) = bounded(SAMPLE_CHANNEL_CAPACITY);
    let job = SampleJob {
      bounds: node.bounds,
      sink: SampleSink::new(sample_tx),
    };

    let outcome = match jobs.send(job) {
      Ok(()) => {
        for sample in sample_rx.iter() {
          node.add_sample(&sample);
        }
        results.recv().unwrap_or(Err(ProducerError::Disconnected))
      }
      Err(_) => Err(ProducerError::Disconnected),
    };

    if let Err(err) = outcome {
      tracing::warn!(node = node.id.0, error = %err, "producer failed, skipping node");
      shared
        .counters
        .producer_failures
        .fetch_add(1, Ordering::Relaxed);
      shared.arena.prune(node.id, node.parent);
      shared.record_error(err.into());
      shared.retire(&node);
      continue;
    }

    if node.num_samples == 0 {
      tracing::trace!(node = node.id.0, vpa = node.voxels_per_axis, "pruned empty node");
      shared.counters.pruned.fetch_add(1, Ordering::Relaxed);
      shared.arena.prune(node.id, node.parent);
      shared.retire(&node);
      continue;
    }

    match serialize_node(&node, &shared.writer, &shared.arena, &shared.scheduler) {
      Ok(true) => {
        tracing::trace!(node = node.id.0, samples = node.num_samples, "branch node");
        shared.arena.retire(node.id);
      }
      Ok(false) => {
        tracing::trace!(node = node.id.0, samples = node.num_samples, "leaf node");
        shared.counters.leaves.fetch_add(1, Ordering::Relaxed);
        shared.arena.retire(node.id);
        shared.retire(&node);
      }
      Err(err) => {
        tracing::error!(node = node.id.0, error = %err, "failed to serialize node");
        shared.record_error(err.into());
        shared.retire(&node);
        // Volume below this node will never be retired; stop the pool.
        shared.scheduler.shutdown();
        return;
      }
    }
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
