//! Octree file codec: header and fixed-size node records.
//!
//! The builder writes through [`RecordWriter`]; the loader reads with
//! [`decode_header`] followed by exactly `node_count` calls to
//! [`decode_node`]. See [`crate::constants`] for the byte layout.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::constants::{CHILD_COUNT, CHILD_TABLE_LEN, FORMAT_VERSION, HEADER_LEN, MAGIC};
use crate::error::CodecError;
use crate::types::Rgba;

pub mod writer;

pub use writer::RecordWriter;

/// Color encoding of node records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OctreeFormat {
  /// 4 × u8 color (lossy to 8 bits per channel).
  #[default]
  Rgba8,
  /// 4 × f32 color.
  RgbaF32,
}

impl OctreeFormat {
  /// Identifier stored in the header.
  pub fn id(self) -> u16 {
    match self {
      OctreeFormat::Rgba8 => 0,
      OctreeFormat::RgbaF32 => 1,
    }
  }

  pub fn from_id(id: u16) -> Result<Self, CodecError> {
    match id {
      0 => Ok(OctreeFormat::Rgba8),
      1 => Ok(OctreeFormat::RgbaF32),
      other => Err(CodecError::UnknownFormat(other)),
    }
  }

  /// Bytes used by the color part of a record.
  #[inline]
  pub fn color_len(self) -> u64 {
    match self {
      OctreeFormat::Rgba8 => 4,
      OctreeFormat::RgbaF32 => 16,
    }
  }

  /// Bytes per node record.
  #[inline]
  pub fn record_len(self) -> u64 {
    self.color_len() + CHILD_TABLE_LEN
  }

  /// Byte offset of record `index` from the start of the file.
  #[inline]
  pub fn record_offset(self, index: u32) -> u64 {
    HEADER_LEN + index as u64 * self.record_len()
  }
}

/// File header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OctreeHeader {
  pub node_count: u64,
  pub format: OctreeFormat,
}

/// One decoded node record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeRecord {
  pub color: Rgba,
  /// Record indices of the children, `0` = absent.
  pub children: [u32; CHILD_COUNT],
}

pub fn encode_header<W: Write>(writer: &mut W, header: &OctreeHeader) -> Result<(), CodecError> {
  let mut buf = [0u8; HEADER_LEN as usize];
  buf[0..4].copy_from_slice(&MAGIC);
  buf[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
  buf[6..8].copy_from_slice(&header.format.id().to_le_bytes());
  buf[8..16].copy_from_slice(&header.node_count.to_le_bytes());
  writer.write_all(&buf)?;
  Ok(())
}

pub fn decode_header<R: Read>(reader: &mut R) -> Result<OctreeHeader, CodecError> {
  let mut buf = [0u8; HEADER_LEN as usize];
  reader.read_exact(&mut buf)?;

  let magic = [buf[0], buf[1], buf[2], buf[3]];
  if magic != MAGIC {
    return Err(CodecError::BadMagic(magic));
  }
  let version = u16::from_le_bytes([buf[4], buf[5]]);
  if version != FORMAT_VERSION {
    return Err(CodecError::UnsupportedVersion(version));
  }
  let format = OctreeFormat::from_id(u16::from_le_bytes([buf[6], buf[7]]))?;
  let mut count = [0u8; 8];
  count.copy_from_slice(&buf[8..16]);

  Ok(OctreeHeader {
    node_count: u64::from_le_bytes(count),
    format,
  })
}

/// Encode the color part of a record.
pub fn encode_color<W: Write>(
  writer: &mut W,
  format: OctreeFormat,
  color: Rgba,
) -> Result<(), CodecError> {
  match format {
    OctreeFormat::Rgba8 => writer.write_all(&color.to_rgba8().0)?,
    OctreeFormat::RgbaF32 => {
      let mut buf = [0u8; 16];
      for (chunk, channel) in buf
        .chunks_exact_mut(4)
        .zip([color.r, color.g, color.b, color.a])
      {
        chunk.copy_from_slice(&channel.to_le_bytes());
      }
      writer.write_all(&buf)?;
    }
  }
  Ok(())
}

/// Encode a full node record.
pub fn encode_node<W: Write>(
  writer: &mut W,
  format: OctreeFormat,
  color: Rgba,
  children: &[u32; CHILD_COUNT],
) -> Result<(), CodecError> {
  encode_color(writer, format, color)?;
  let mut buf = [0u8; CHILD_TABLE_LEN as usize];
  for (chunk, child) in buf.chunks_exact_mut(4).zip(children) {
    chunk.copy_from_slice(&child.to_le_bytes());
  }
  writer.write_all(&buf)?;
  Ok(())
}

pub fn decode_node<R: Read>(reader: &mut R, format: OctreeFormat) -> Result<NodeRecord, CodecError> {
  let color = match format {
    OctreeFormat::Rgba8 => {
      let mut buf = [0u8; 4];
      reader.read_exact(&mut buf)?;
      crate::types::Rgba8(buf).to_rgba()
    }
    OctreeFormat::RgbaF32 => {
      let mut buf = [0u8; 16];
      reader.read_exact(&mut buf)?;
      let mut channels = [0f32; 4];
      for (channel, chunk) in channels.iter_mut().zip(buf.chunks_exact(4)) {
        *channel = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
      }
      Rgba::new(channels[0], channels[1], channels[2], channels[3])
    }
  };

  let mut buf = [0u8; CHILD_TABLE_LEN as usize];
  reader.read_exact(&mut buf)?;
  let mut children = [0u32; CHILD_COUNT];
  for (child, chunk) in children.iter_mut().zip(buf.chunks_exact(4)) {
    *child = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
  }

  Ok(NodeRecord { color, children })
}
