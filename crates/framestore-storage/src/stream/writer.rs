//! Block Stream Writer
//!
//! Streams a column's raw bytes into the on-disk block layout described in
//! the module docs: reserve the index region, compress and append each
//! block through the column's [`CompressionPlan`], then patch the index.
//!
//! ## What Happens On Write
//!
//! 1. Reserve `ceil(element_count / block_elements)` index entries by
//!    seeking past them
//! 2. Slice the source into blocks of `block_elements` elements (the final
//!    block may be short)
//! 3. Route each block through the plan's arm for that block number and
//!    append the compressed bytes, recording the absolute offset, the
//!    compressed size, and the algorithm actually used
//! 4. Patch the index region exactly once and restore the sink position
//!
//! After a successful write, block offsets are strictly monotonic and the
//! per-block element counts sum to `element_count`.

use std::io::{Seek, Write};

use framestore_core::{CompressionPlan, Result};
use tracing::trace;

use super::BlockIndexWriter;
use crate::compression;

/// Write `element_count` fixed-width elements as a compressed block stream.
///
/// `src` must hold exactly `element_count * element_size` bytes. The sink
/// may be at any position; all recorded offsets are absolute.
pub(crate) fn write_blocks<S: Write + Seek>(
    sink: &mut S,
    src: &[u8],
    element_count: usize,
    element_size: usize,
    block_elements: usize,
    plan: CompressionPlan,
) -> Result<()> {
    debug_assert_eq!(src.len(), element_count * element_size);

    let n_blocks = element_count.div_ceil(block_elements);
    let mut index = BlockIndexWriter::reserve(sink, n_blocks)?;

    for (block, raw) in src.chunks(block_elements * element_size).enumerate() {
        let stage = plan.stage_for_block(block as u64);
        let compressed = compression::compress(raw, stage)?;
        let offset = sink.stream_position()?;
        sink.write_all(&compressed)?;
        trace!(
            block,
            algo = stage.algo.id(),
            raw_len = raw.len(),
            comp_len = compressed.len(),
            "wrote block"
        );
        index.record(offset, compressed.len() as u32, stage.algo);
    }

    index.finish(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{read_block_index, INDEX_ENTRY_SIZE};
    use framestore_core::{CompressAlgo, Stage};
    use std::io::Cursor;

    fn le_bytes_u32(values: &[u32]) -> Vec<u8> {
        let mut out = Vec::with_capacity(values.len() * 4);
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_index_has_one_entry_per_block() {
        let values: Vec<u32> = (0..10).collect();
        let src = le_bytes_u32(&values);
        let mut sink = Cursor::new(Vec::new());

        // 4 elements per block over 10 elements -> 3 blocks
        write_blocks(&mut sink, &src, 10, 4, 4, CompressionPlan::Identity).unwrap();

        let entries = read_block_index(&mut sink, 0, 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].offset, 3 * INDEX_ENTRY_SIZE as u64);
        // identity blocks: 4*4, 4*4, 2*4 bytes
        assert_eq!(entries[0].comp_size, 16);
        assert_eq!(entries[1].comp_size, 16);
        assert_eq!(entries[2].comp_size, 8);
    }

    #[test]
    fn test_offsets_are_strictly_monotonic() {
        let values: Vec<u32> = (0..1000).map(|i| i * 7).collect();
        let src = le_bytes_u32(&values);
        let mut sink = Cursor::new(Vec::new());

        let plan = CompressionPlan::Composite {
            primary: Stage::new(CompressAlgo::Identity, 0),
            secondary: Stage::new(CompressAlgo::Lz4, 100),
            mix: 50,
        };
        write_blocks(&mut sink, &src, 1000, 4, 64, plan).unwrap();

        let n_blocks = 1000usize.div_ceil(64);
        let entries = read_block_index(&mut sink, 0, n_blocks).unwrap();
        for pair in entries.windows(2) {
            assert!(pair[0].offset < pair[1].offset);
        }
    }

    #[test]
    fn test_composite_plan_records_per_block_algo() {
        let values: Vec<u32> = (0..640).collect();
        let src = le_bytes_u32(&values);
        let mut sink = Cursor::new(Vec::new());

        let plan = CompressionPlan::Composite {
            primary: Stage::new(CompressAlgo::Identity, 0),
            secondary: Stage::new(CompressAlgo::Lz4, 100),
            mix: 50,
        };
        write_blocks(&mut sink, &src, 640, 4, 64, plan).unwrap();

        let entries = read_block_index(&mut sink, 0, 10).unwrap();
        let lz4_blocks = entries
            .iter()
            .filter(|e| e.algo_id == CompressAlgo::Lz4.id())
            .count();
        assert_eq!(lz4_blocks, 5);
        // block 0 stays on the primary arm below full mix
        assert_eq!(entries[0].algo_id, CompressAlgo::Identity.id());
    }

    #[test]
    fn test_write_at_arbitrary_sink_position() {
        let values: Vec<u32> = (0..8).collect();
        let src = le_bytes_u32(&values);

        let mut sink = Cursor::new(Vec::new());
        sink.set_position(123);
        write_blocks(&mut sink, &src, 8, 4, 8, CompressionPlan::Identity).unwrap();

        let entries = read_block_index(&mut sink, 123, 1).unwrap();
        assert_eq!(entries[0].offset, 123 + INDEX_ENTRY_SIZE as u64);
    }

    #[test]
    fn test_sink_position_restored_after_patch() {
        let values: Vec<u32> = (0..100).collect();
        let src = le_bytes_u32(&values);
        let mut sink = Cursor::new(Vec::new());

        write_blocks(&mut sink, &src, 100, 4, 32, CompressionPlan::Identity).unwrap();

        // position is at the end of the last block, ready for the next column
        let expected_end = sink.get_ref().len() as u64;
        assert_eq!(sink.position(), expected_end);
    }
}
