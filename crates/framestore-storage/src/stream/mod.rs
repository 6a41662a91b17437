//! Block Stream Layout
//!
//! Every column payload on disk is a *block stream*:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Block index: one 16-byte entry per block                 │
//! │   - offset    (u64, absolute file position of the block) │
//! │   - comp_size (u32, compressed byte length)              │
//! │   - algo_id   (u16, byte-compressor algorithm)           │
//! │   - flags     (u16, reserved)                            │
//! ├──────────────────────────────────────────────────────────┤
//! │ Block 0 (compressed)                                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ Block 1 (compressed)                                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ ...                                                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The writer reserves the index region by seeking past it, streams the
//! blocks, then patches the index exactly once. The reader uses the index
//! to seek straight to the blocks covering a requested element range;
//! nothing else is read, which is what makes partial column scans cheap.
//!
//! All offsets are absolute, so a stream is valid at any position in the
//! file and the sink's position on entry is arbitrary.

mod reader;
mod writer;

pub(crate) use reader::{read_exact_at, read_range};
pub(crate) use writer::write_blocks;

use std::io::{Seek, SeekFrom, Write};

use bytes::{Buf, BufMut, BytesMut};
use framestore_core::{CompressAlgo, Error, Result};

/// Size of one block index entry on disk.
pub(crate) const INDEX_ENTRY_SIZE: usize = 16;

/// One entry of a column's block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockIndexEntry {
    /// Absolute file offset of the compressed block.
    pub offset: u64,
    /// Compressed byte length.
    pub comp_size: u32,
    /// Byte-compressor algorithm id actually used for this block.
    pub algo_id: u16,
    /// Reserved.
    pub flags: u16,
}

impl BlockIndexEntry {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u64_le(self.offset);
        buf.put_u32_le(self.comp_size);
        buf.put_u16_le(self.algo_id);
        buf.put_u16_le(self.flags);
    }

    fn decode(cursor: &mut &[u8]) -> Self {
        Self {
            offset: cursor.get_u64_le(),
            comp_size: cursor.get_u32_le(),
            algo_id: cursor.get_u16_le(),
            flags: cursor.get_u16_le(),
        }
    }
}

/// Reserves a block index region on creation and patches it on `finish`.
///
/// Used by the fixed-width streamer and by the character codec, which
/// produces variable-size block payloads but shares the index layout.
pub(crate) struct BlockIndexWriter {
    index_pos: u64,
    n_blocks: usize,
    entries: Vec<BlockIndexEntry>,
}

impl BlockIndexWriter {
    /// Record the current sink position and seek past the index region.
    pub fn reserve<S: Write + Seek>(sink: &mut S, n_blocks: usize) -> Result<Self> {
        let index_pos = sink.stream_position()?;
        sink.seek(SeekFrom::Current((n_blocks * INDEX_ENTRY_SIZE) as i64))?;
        Ok(Self {
            index_pos,
            n_blocks,
            entries: Vec::with_capacity(n_blocks),
        })
    }

    pub fn record(&mut self, offset: u64, comp_size: u32, algo: CompressAlgo) {
        self.entries.push(BlockIndexEntry {
            offset,
            comp_size,
            algo_id: algo.id(),
            flags: 0,
        });
    }

    /// Patch the reserved region and restore the sink position.
    pub fn finish<S: Write + Seek>(self, sink: &mut S) -> Result<()> {
        debug_assert_eq!(self.entries.len(), self.n_blocks);
        let end_pos = sink.stream_position()?;
        sink.seek(SeekFrom::Start(self.index_pos))?;
        let mut buf = BytesMut::with_capacity(self.entries.len() * INDEX_ENTRY_SIZE);
        for entry in &self.entries {
            entry.encode(&mut buf);
        }
        sink.write_all(&buf)?;
        sink.seek(SeekFrom::Start(end_pos))?;
        Ok(())
    }
}

/// Read and validate a column's block index.
///
/// Offsets must be strictly increasing and the first block must start
/// after the index region itself; anything else is a corrupt file.
pub(crate) fn read_block_index<R: std::io::Read + Seek>(
    source: &mut R,
    col_offset: u64,
    n_blocks: usize,
) -> Result<Vec<BlockIndexEntry>> {
    let mut raw = vec![0u8; n_blocks * INDEX_ENTRY_SIZE];
    read_exact_at(source, col_offset, &mut raw)?;

    let mut cursor = raw.as_slice();
    let mut entries = Vec::with_capacity(n_blocks);
    for _ in 0..n_blocks {
        entries.push(BlockIndexEntry::decode(&mut cursor));
    }

    let blocks_start = col_offset + (n_blocks * INDEX_ENTRY_SIZE) as u64;
    for (i, entry) in entries.iter().enumerate() {
        if entry.comp_size == 0 {
            return Err(Error::CorruptBlockIndex(format!(
                "block {} has zero compressed size",
                i
            )));
        }
        if i == 0 {
            if entry.offset < blocks_start {
                return Err(Error::CorruptBlockIndex(
                    "first block overlaps the index region".to_string(),
                ));
            }
        } else if entry.offset <= entries[i - 1].offset {
            return Err(Error::CorruptBlockIndex(format!(
                "block offsets not strictly increasing at block {}",
                i
            )));
        }
    }

    Ok(entries)
}
