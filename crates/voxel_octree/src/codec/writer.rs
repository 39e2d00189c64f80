//! RecordWriter - seekable sink for node records.
//!
//! Records are appended in whatever order workers finish. A parent is
//! always written before its children exist, so its child slots start out
//! as `0` and each child backpatches its own slot once it has a record
//! index. Pruned children never patch, leaving the slot absent on disk.
//! The header is rewritten with the final node count on [`finish`].
//!
//! [`finish`]: RecordWriter::finish

use std::io::{Seek, SeekFrom, Write};

use super::{encode_header, encode_node, OctreeFormat, OctreeHeader};
use crate::constants::{CHILD_COUNT, NO_CHILD};
use crate::error::CodecError;
use crate::types::Rgba;

/// Seekable octree record writer. Not synchronized; share behind a mutex.
#[derive(Debug)]
pub struct RecordWriter<W: Write + Seek> {
  inner: W,
  format: OctreeFormat,
  records: u32,
}

impl<W: Write + Seek> RecordWriter<W> {
  /// Write a placeholder header (zero nodes) and start appending after it.
  pub fn new(mut inner: W, format: OctreeFormat) -> Result<Self, CodecError> {
    inner.seek(SeekFrom::Start(0))?;
    encode_header(
      &mut inner,
      &OctreeHeader {
        node_count: 0,
        format,
      },
    )?;
    Ok(Self {
      inner,
      format,
      records: 0,
    })
  }

  pub fn format(&self) -> OctreeFormat {
    self.format
  }

  /// Records written so far.
  pub fn len(&self) -> u32 {
    self.records
  }

  pub fn is_empty(&self) -> bool {
    self.records == 0
  }

  /// Append a node with every child slot absent; returns its record index.
  pub fn append(&mut self, color: Rgba) -> Result<u32, CodecError> {
    let index = self.records;
    let next = index.checked_add(1).ok_or(CodecError::TooManyNodes)?;

    self
      .inner
      .seek(SeekFrom::Start(self.format.record_offset(index)))?;
    encode_node(&mut self.inner, self.format, color, &[NO_CHILD; CHILD_COUNT])?;

    self.records = next;
    Ok(index)
  }

  /// Point `parent`'s child slot at record `child`.
  pub fn link_child(&mut self, parent: u32, slot: u8, child: u32) -> Result<(), CodecError> {
    debug_assert!((slot as usize) < CHILD_COUNT, "child slot out of range");
    debug_assert!(parent < self.records && child < self.records);

    let offset = self.format.record_offset(parent) + self.format.color_len() + slot as u64 * 4;
    self.inner.seek(SeekFrom::Start(offset))?;
    self.inner.write_all(&child.to_le_bytes())?;
    Ok(())
  }

  /// Rewrite the header with the final node count and hand back the sink.
  pub fn finish(mut self) -> Result<W, CodecError> {
    self.inner.seek(SeekFrom::Start(0))?;
    encode_header(
      &mut self.inner,
      &OctreeHeader {
        node_count: self.records as u64,
        format: self.format,
      },
    )?;
    let end = self.format.record_offset(self.records);
    self.inner.seek(SeekFrom::Start(end))?;
    self.inner.flush()?;
    Ok(self.inner)
  }
}
