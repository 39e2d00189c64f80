//! Error taxonomy for building, persisting and loading octrees.

use thiserror::Error;

/// A sample producer failed for one node.
///
/// Contained to that node: its volume is still retired so the build can
/// finish, but `build` reports the failure once every worker has exited.
#[derive(Debug, Error)]
pub enum ProducerError {
  #[error("producer failed: {0}")]
  Failed(String),
  #[error("sample sink closed before the producer finished")]
  SinkClosed,
  #[error("producer exited without reporting a result")]
  Disconnected,
}

/// Encoding, decoding or I/O failure in the octree format.
#[derive(Debug, Error)]
pub enum CodecError {
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
  #[error("not an octree file (bad magic {0:?})")]
  BadMagic([u8; 4]),
  #[error("unsupported octree format version {0}")]
  UnsupportedVersion(u16),
  #[error("unknown octree node format id {0}")]
  UnknownFormat(u16),
  #[error("node {node} references child {child} but the tree has {count} nodes")]
  ChildOutOfRange { node: u32, child: u32, count: u64 },
  #[error("node {node} references child {child}, which is not written after it")]
  ChildBeforeParent { node: u32, child: u32 },
  #[error("octree exceeds the maximum addressable node count")]
  TooManyNodes,
}

/// Terminal error of a `build` call.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("build requires at least one worker")]
  NoWorkers,
  #[error("invalid build configuration: {0}")]
  InvalidConfig(String),
  #[error(transparent)]
  Producer(#[from] ProducerError),
  #[error(transparent)]
  Codec(#[from] CodecError),
}

/// Failure to open or drive a render session.
#[derive(Debug, Error)]
pub enum SessionError {
  #[error("malformed session message: {0}")]
  Json(#[from] serde_json::Error),
  #[error("invalid session setup: {0}")]
  InvalidSetup(String),
  #[error(transparent)]
  Codec(#[from] CodecError),
}
