//! Block Stream Reader
//!
//! Random access into a column's block stream: given the column offset, the
//! element range `[first_elem, first_elem + n_elems)` and the column's
//! block geometry, decompress only the blocks intersecting the range.
//!
//! ## Seek Math
//!
//! The block count follows from the column's total element count and its
//! fixed per-block element count, so the index can be read without any
//! per-column header. The head and tail blocks of a range are usually
//! partial and go through a scratch buffer (allocated once per call,
//! reused across blocks); fully-covered interior blocks decompress straight
//! into the caller's destination with no intermediate copy.
//!
//! ## Validation
//!
//! The index is validated before any block is touched: strictly increasing
//! offsets, non-zero compressed sizes, first block beyond the index region.
//! Decode failures surface as `Decompression`/`UnknownCodec`; a file that
//! ends early surfaces as `ShortRead`.

use std::io::{Read, Seek, SeekFrom};

use framestore_core::{CompressAlgo, Error, Result};
use tracing::trace;

use super::read_block_index;
use crate::compression;

/// Seek to `offset` and fill `buf` completely.
pub(crate) fn read_exact_at<R: Read + Seek>(
    source: &mut R,
    offset: u64,
    buf: &mut [u8],
) -> Result<()> {
    source.seek(SeekFrom::Start(offset))?;
    source.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ShortRead
        } else {
            Error::Io(e)
        }
    })
}

/// Read elements `[first_elem, first_elem + n_elems)` of a block stream
/// into `dst`.
///
/// `dst` must hold exactly `n_elems * element_size` bytes; the caller has
/// already validated the range against `total_elems`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn read_range<R: Read + Seek>(
    source: &mut R,
    dst: &mut [u8],
    col_offset: u64,
    first_elem: usize,
    n_elems: usize,
    total_elems: usize,
    element_size: usize,
    block_elements: usize,
) -> Result<()> {
    debug_assert_eq!(dst.len(), n_elems * element_size);
    debug_assert!(first_elem + n_elems <= total_elems);

    if n_elems == 0 {
        return Ok(());
    }

    let n_blocks = total_elems.div_ceil(block_elements);
    let entries = read_block_index(source, col_offset, n_blocks)?;

    let first_block = first_elem / block_elements;
    let last_block = (first_elem + n_elems - 1) / block_elements;
    trace!(
        first_block,
        last_block,
        n_blocks,
        "reading element range"
    );

    let mut scratch = vec![0u8; block_elements * element_size];
    let mut comp: Vec<u8> = Vec::new();

    for block in first_block..=last_block {
        let entry = &entries[block];
        let algo = CompressAlgo::try_from(entry.algo_id)?;

        comp.resize(entry.comp_size as usize, 0);
        read_exact_at(source, entry.offset, &mut comp)?;

        let block_start = block * block_elements;
        let block_count = block_elements.min(total_elems - block_start);
        let raw_len = block_count * element_size;

        // intersection of the block with the requested range, in elements
        let sel_start = first_elem.max(block_start);
        let sel_end = (first_elem + n_elems).min(block_start + block_count);
        let dst_off = (sel_start - first_elem) * element_size;

        if sel_start == block_start && sel_end == block_start + block_count {
            compression::decompress_into(&comp, algo, &mut dst[dst_off..dst_off + raw_len])?;
        } else {
            compression::decompress_into(&comp, algo, &mut scratch[..raw_len])?;
            let from = (sel_start - block_start) * element_size;
            let to = (sel_end - block_start) * element_size;
            dst[dst_off..dst_off + (to - from)].copy_from_slice(&scratch[from..to]);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::write_blocks;
    use framestore_core::{CompressAlgo, CompressionPlan, Stage};
    use std::io::Cursor;

    const BLOCK: usize = 64;

    fn write_stream(values: &[u32], plan: CompressionPlan) -> Cursor<Vec<u8>> {
        let mut src = Vec::with_capacity(values.len() * 4);
        for v in values {
            src.extend_from_slice(&v.to_le_bytes());
        }
        let mut sink = Cursor::new(Vec::new());
        write_blocks(&mut sink, &src, values.len(), 4, BLOCK, plan).unwrap();
        sink
    }

    fn read_values(
        source: &mut Cursor<Vec<u8>>,
        first: usize,
        n: usize,
        total: usize,
    ) -> Vec<u32> {
        let mut dst = vec![0u8; n * 4];
        read_range(source, &mut dst, 0, first, n, total, 4, BLOCK).unwrap();
        dst.chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn lz4_plan() -> CompressionPlan {
        CompressionPlan::Single(Stage::new(CompressAlgo::Lz4, 100))
    }

    // ---------------------------------------------------------------
    // Full and partial range round-trips
    // ---------------------------------------------------------------

    #[test]
    fn test_full_range_roundtrip() {
        let values: Vec<u32> = (0..500).map(|i| i * 3).collect();
        let mut source = write_stream(&values, lz4_plan());
        assert_eq!(read_values(&mut source, 0, 500, 500), values);
    }

    #[test]
    fn test_head_and_tail_partial_blocks() {
        let values: Vec<u32> = (0..300).collect();
        let mut source = write_stream(&values, lz4_plan());

        // range starts mid-block and ends mid-block
        let got = read_values(&mut source, 10, 150, 300);
        assert_eq!(got, &values[10..160]);
    }

    #[test]
    fn test_range_within_single_block() {
        let values: Vec<u32> = (0..300).collect();
        let mut source = write_stream(&values, lz4_plan());

        let got = read_values(&mut source, 70, 20, 300);
        assert_eq!(got, &values[70..90]);
    }

    #[test]
    fn test_range_on_exact_block_boundaries() {
        let values: Vec<u32> = (0..BLOCK as u32 * 4).collect();
        let mut source = write_stream(&values, lz4_plan());

        let got = read_values(&mut source, BLOCK, BLOCK * 2, BLOCK * 4);
        assert_eq!(got, &values[BLOCK..BLOCK * 3]);
    }

    #[test]
    fn test_short_tail_block() {
        // 2 full blocks plus a 5-element tail
        let total = BLOCK * 2 + 5;
        let values: Vec<u32> = (0..total as u32).collect();
        let mut source = write_stream(&values, lz4_plan());

        let got = read_values(&mut source, BLOCK * 2 - 2, 7, total);
        assert_eq!(got, &values[BLOCK * 2 - 2..BLOCK * 2 + 5]);
    }

    #[test]
    fn test_single_element_reads() {
        let values: Vec<u32> = (0..200).map(|i| i ^ 0xAA).collect();
        let mut source = write_stream(&values, lz4_plan());

        for first in [0usize, 1, BLOCK - 1, BLOCK, 199] {
            let got = read_values(&mut source, first, 1, 200);
            assert_eq!(got, &values[first..first + 1], "first={}", first);
        }
    }

    #[test]
    fn test_composite_stream_roundtrip() {
        let plan = CompressionPlan::Composite {
            primary: Stage::new(CompressAlgo::Identity, 0),
            secondary: Stage::new(CompressAlgo::Zstd, 65),
            mix: 40,
        };
        let values: Vec<u32> = (0..1000).map(|i| i % 17).collect();
        let mut source = write_stream(&values, plan);
        assert_eq!(read_values(&mut source, 0, 1000, 1000), values);
        assert_eq!(read_values(&mut source, 333, 334, 1000), &values[333..667]);
    }

    // ---------------------------------------------------------------
    // Error paths
    // ---------------------------------------------------------------

    #[test]
    fn test_non_monotonic_index_rejected() {
        let values: Vec<u32> = (0..200).collect();
        let mut source = write_stream(&values, CompressionPlan::Identity);

        // swap the offsets of blocks 0 and 1 in place
        let data = source.get_mut();
        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        a.copy_from_slice(&data[0..8]);
        b.copy_from_slice(&data[16..24]);
        data[0..8].copy_from_slice(&b);
        data[16..24].copy_from_slice(&a);

        let mut dst = vec![0u8; 200 * 4];
        let err = read_range(&mut source, &mut dst, 0, 0, 200, 200, 4, BLOCK).unwrap_err();
        assert!(matches!(err, Error::CorruptBlockIndex(_)));
    }

    #[test]
    fn test_unknown_algo_id_rejected() {
        let values: Vec<u32> = (0..10).collect();
        let mut source = write_stream(&values, CompressionPlan::Identity);

        // overwrite block 0's algo id with garbage
        source.get_mut()[12] = 0xFF;

        let mut dst = vec![0u8; 10 * 4];
        let err = read_range(&mut source, &mut dst, 0, 0, 10, 10, 4, BLOCK).unwrap_err();
        assert!(matches!(err, Error::UnknownCodec(_)));
    }

    #[test]
    fn test_truncated_stream_is_short_read() {
        let values: Vec<u32> = (0..200).collect();
        let source = write_stream(&values, CompressionPlan::Identity);

        let full = source.into_inner();
        let mut truncated = Cursor::new(full[..full.len() - 10].to_vec());

        let mut dst = vec![0u8; 200 * 4];
        let err = read_range(&mut truncated, &mut dst, 0, 0, 200, 200, 4, BLOCK).unwrap_err();
        assert!(matches!(err, Error::ShortRead));
    }

    #[test]
    fn test_corrupt_block_payload_rejected() {
        let values: Vec<u32> = (0..500).collect();
        let mut source = write_stream(&values, lz4_plan());

        // stomp on the middle of the first block payload
        let index_len = 500usize.div_ceil(BLOCK) * 16;
        let data = source.get_mut();
        for byte in &mut data[index_len + 8..index_len + 16] {
            *byte = 0xFF;
        }

        let mut dst = vec![0u8; 500 * 4];
        let err = read_range(&mut source, &mut dst, 0, 0, 500, 500, 4, BLOCK).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }
}
