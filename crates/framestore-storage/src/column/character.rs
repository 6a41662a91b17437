//! Character Column Codec
//!
//! Strings are variable-width, so character blocks carry their own nested
//! layout inside each compressed block payload:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ heap_len      (u32)                                   │
//! │ reserved      (u32)                                   │
//! │ end_offsets   (u32 per string, cumulative heap end;   │
//! │                high bit set = missing value)          │
//! │ heap          (UTF-8 bytes, all strings concatenated) │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! A missing value records the previous cumulative end with the flag bit
//! set, so the offsets stay monotone and an empty string stays distinct
//! from a missing one. The payload is routed through the plan as opaque
//! bytes; because its size varies, decode uses the self-describing forms
//! (size-prepended LZ4, zstd frames, identity).
//!
//! The column-names table of every file is written by this codec at
//! compression 0, which keeps header parsing free of any other machinery.

use std::io::{Read, Seek, Write};

use bytes::BufMut;
use framestore_core::{plan_for, ColumnType, CompressAlgo, Error, Result};

use crate::compression;
use crate::stream::{read_block_index, read_exact_at, BlockIndexWriter};

/// Strings per compression block.
pub(crate) const BLOCK_ELEMENTS: usize = 2048;

/// Per-block payload header: heap length + reserved word.
const BLOCK_HEADER_SIZE: usize = 8;

/// High bit of an end offset marks a missing value.
const MISSING_FLAG: u32 = 0x8000_0000;

/// Write `n_values` strings supplied by `value`, which returns `None` for
/// a missing element.
pub(crate) fn write<'a, S, F>(sink: &mut S, n_values: usize, level: u8, value: F) -> Result<()>
where
    S: Write + Seek,
    F: Fn(usize) -> Option<&'a str>,
{
    let plan = plan_for(ColumnType::Character, level);
    let n_blocks = n_values.div_ceil(BLOCK_ELEMENTS);
    let mut index = BlockIndexWriter::reserve(sink, n_blocks)?;

    let mut offsets: Vec<u8> = Vec::new();
    let mut heap: Vec<u8> = Vec::new();
    let mut payload: Vec<u8> = Vec::new();

    for block in 0..n_blocks {
        let start = block * BLOCK_ELEMENTS;
        let end = (start + BLOCK_ELEMENTS).min(n_values);

        offsets.clear();
        heap.clear();
        let mut cumulative: u32 = 0;
        for i in start..end {
            match value(i) {
                Some(s) => {
                    heap.extend_from_slice(s.as_bytes());
                    cumulative += s.len() as u32;
                    offsets.put_u32_le(cumulative);
                }
                None => {
                    offsets.put_u32_le(cumulative | MISSING_FLAG);
                }
            }
        }

        payload.clear();
        payload.put_u32_le(heap.len() as u32);
        payload.put_u32_le(0);
        payload.extend_from_slice(&offsets);
        payload.extend_from_slice(&heap);

        let stage = plan.stage_for_block(block as u64);
        let compressed = compression::compress(&payload, stage)?;
        let offset = sink.stream_position()?;
        sink.write_all(&compressed)?;
        index.record(offset, compressed.len() as u32, stage.algo);
    }

    index.finish(sink)
}

/// Read strings `[first_row, first_row + n_rows)`.
pub(crate) fn read<R: Read + Seek>(
    source: &mut R,
    col_offset: u64,
    first_row: usize,
    n_rows: usize,
    total_rows: usize,
) -> Result<Vec<Option<String>>> {
    if n_rows == 0 {
        return Ok(Vec::new());
    }

    let n_blocks = total_rows.div_ceil(BLOCK_ELEMENTS);
    let entries = read_block_index(source, col_offset, n_blocks)?;

    let first_block = first_row / BLOCK_ELEMENTS;
    let last_block = (first_row + n_rows - 1) / BLOCK_ELEMENTS;

    let mut out = Vec::with_capacity(n_rows);
    let mut comp: Vec<u8> = Vec::new();

    for block in first_block..=last_block {
        let entry = &entries[block];
        let algo = CompressAlgo::try_from(entry.algo_id)?;

        comp.resize(entry.comp_size as usize, 0);
        read_exact_at(source, entry.offset, &mut comp)?;
        let payload = compression::decompress_vec(&comp, algo)?;

        let block_start = block * BLOCK_ELEMENTS;
        let count = BLOCK_ELEMENTS.min(total_rows - block_start);
        let offsets_end = BLOCK_HEADER_SIZE + 4 * count;
        if payload.len() < offsets_end {
            return Err(Error::CorruptColumn(
                "character block shorter than its offset table".to_string(),
            ));
        }
        let heap_len =
            u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
        if payload.len() != offsets_end + heap_len {
            return Err(Error::CorruptColumn(format!(
                "character block is {} bytes, header declares {}",
                payload.len(),
                offsets_end + heap_len
            )));
        }
        let offsets = &payload[BLOCK_HEADER_SIZE..offsets_end];
        let heap = &payload[offsets_end..];

        let end_offset_at = |i: usize| -> u32 {
            u32::from_le_bytes([
                offsets[4 * i],
                offsets[4 * i + 1],
                offsets[4 * i + 2],
                offsets[4 * i + 3],
            ])
        };

        let from = first_row.max(block_start) - block_start;
        let to = (first_row + n_rows).min(block_start + count) - block_start;
        for i in from..to {
            let end_raw = end_offset_at(i);
            let start = if i == 0 {
                0
            } else {
                (end_offset_at(i - 1) & !MISSING_FLAG) as usize
            };
            if end_raw & MISSING_FLAG != 0 {
                out.push(None);
                continue;
            }
            let end = end_raw as usize;
            let bytes = heap.get(start..end).ok_or_else(|| {
                Error::CorruptColumn("character offsets point outside the heap".to_string())
            })?;
            let s = std::str::from_utf8(bytes)
                .map_err(|_| Error::CorruptColumn("character heap is not UTF-8".to_string()))?;
            out.push(Some(s.to_string()));
        }
    }

    Ok(out)
}
