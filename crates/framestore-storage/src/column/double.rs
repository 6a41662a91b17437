//! Double Column Codec
//!
//! Doubles are stored as raw little-endian f64 bits and round-trip
//! bit-for-bit, NaN payloads included: the host's missing sentinel is a
//! NaN and must survive unchanged. Compression shuffles the eight byte
//! planes apart before the entropy stage.

use std::io::{Read, Seek, Write};

use framestore_core::{plan_for, ColumnType, Result};

use crate::stream;

/// Doubles per compression block (16 KiB of raw bytes).
pub(crate) const BLOCK_ELEMENTS: usize = 2048;

const ELEMENT_SIZE: usize = 8;

pub(crate) fn write<S: Write + Seek>(sink: &mut S, values: &[f64], level: u8) -> Result<()> {
    let plan = plan_for(ColumnType::Double, level);

    let mut raw = Vec::with_capacity(values.len() * ELEMENT_SIZE);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }

    stream::write_blocks(sink, &raw, values.len(), ELEMENT_SIZE, BLOCK_ELEMENTS, plan)
}

pub(crate) fn read<R: Read + Seek>(
    source: &mut R,
    col_offset: u64,
    first_row: usize,
    n_rows: usize,
    total_rows: usize,
) -> Result<Vec<f64>> {
    let mut raw = vec![0u8; n_rows * ELEMENT_SIZE];
    stream::read_range(
        source,
        &mut raw,
        col_offset,
        first_row,
        n_rows,
        total_rows,
        ELEMENT_SIZE,
        BLOCK_ELEMENTS,
    )?;

    Ok(raw
        .chunks_exact(ELEMENT_SIZE)
        .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}
