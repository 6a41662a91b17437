//! Byte Compressors
//!
//! Stateless transforms between raw block bytes and their on-disk form.
//! Every algorithm is identified by a stable u16 id ([`CompressAlgo`]) that
//! the block index records per block, so the reader never reconstructs the
//! writer's plan; it just dispatches on the id it finds.
//!
//! ## Algorithm Families
//!
//! - **Identity**: verbatim copy, used at compression level 0.
//! - **Lz4**: `lz4_flex` block format with the uncompressed size prepended,
//!   the same framing the size-prepended helpers use.
//! - **Zstd**: a regular zstd frame; intensity 0..=100 maps onto zstd's
//!   1..=22 level range.
//! - **Shuffle4 / Shuffle8**: byte transposition of fixed-width elements
//!   into per-byte planes before the entropy stage. Low-order bytes of
//!   integers (stride 4) and doubles (stride 8) are far more repetitive
//!   when grouped, which is where most of the ratio comes from.
//! - **BitPack**: the fixed-ratio boolean packer: 16 tri-state values
//!   (0 = false, 1 = true, 2 = missing), each stored as a u32 word in the
//!   raw block, packed 2 bits apiece into one output word. Factor 16, no
//!   entropy coding. `Lz4BitPack`/`ZstdBitPack` run an entropy stage over
//!   the packed words.
//!
//! ## Two Decode Paths
//!
//! Fixed-width column blocks know their uncompressed size up front, so they
//! decode through [`decompress_into`] with an exact-size destination.
//! Variable-size payloads (character blocks) decode through
//! [`decompress_vec`], relying on the self-describing framing of each
//! algorithm.

use framestore_core::{CompressAlgo, Error, Result, Stage};

/// Map a plan intensity (0..=100) onto zstd's 1..=22 compression levels.
fn zstd_level(intensity: u8) -> i32 {
    (intensity as i32 * 22 / 100).max(1)
}

/// Byte-transpose `src` (a whole number of `stride`-byte elements) into
/// per-byte planes.
fn shuffle(src: &[u8], stride: usize) -> Vec<u8> {
    debug_assert_eq!(src.len() % stride, 0);
    let n = src.len() / stride;
    let mut out = vec![0u8; src.len()];
    for plane in 0..stride {
        for i in 0..n {
            out[plane * n + i] = src[i * stride + plane];
        }
    }
    out
}

/// Inverse of [`shuffle`].
fn unshuffle(src: &[u8], stride: usize, dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    debug_assert_eq!(src.len() % stride, 0);
    let n = src.len() / stride;
    for plane in 0..stride {
        for i in 0..n {
            dst[i * stride + plane] = src[plane * n + i];
        }
    }
}

/// Number of packed bytes for `n_values` tri-state booleans.
pub(crate) fn packed_len(n_values: usize) -> usize {
    n_values.div_ceil(16) * 4
}

/// Pack u32 tri-state values (little-endian, one per 4 source bytes) into
/// 2-bit fields, 16 per output word.
fn bitpack(src: &[u8]) -> Vec<u8> {
    debug_assert_eq!(src.len() % 4, 0);
    let n = src.len() / 4;
    let mut out = vec![0u8; packed_len(n)];
    for i in 0..n {
        let v = u32::from_le_bytes([src[4 * i], src[4 * i + 1], src[4 * i + 2], src[4 * i + 3]]);
        debug_assert!(v < 4, "tri-state boolean out of range");
        let word_idx = (i / 16) * 4;
        let shift = 2 * (i % 16);
        let mut word = u32::from_le_bytes([
            out[word_idx],
            out[word_idx + 1],
            out[word_idx + 2],
            out[word_idx + 3],
        ]);
        word |= (v & 3) << shift;
        out[word_idx..word_idx + 4].copy_from_slice(&word.to_le_bytes());
    }
    out
}

/// Inverse of [`bitpack`]; `dst` holds one u32 word per boolean.
fn bitunpack(src: &[u8], dst: &mut [u8]) -> Result<()> {
    debug_assert_eq!(dst.len() % 4, 0);
    let n = dst.len() / 4;
    if src.len() < packed_len(n) {
        return Err(Error::Decompression(
            "bit-packed block shorter than expected".to_string(),
        ));
    }
    for i in 0..n {
        let word_idx = (i / 16) * 4;
        let word = u32::from_le_bytes([
            src[word_idx],
            src[word_idx + 1],
            src[word_idx + 2],
            src[word_idx + 3],
        ]);
        let v = (word >> (2 * (i % 16))) & 3;
        dst[4 * i..4 * i + 4].copy_from_slice(&v.to_le_bytes());
    }
    Ok(())
}

fn lz4_compress(src: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(src)
}

fn lz4_decompress_into(src: &[u8], dst: &mut [u8]) -> Result<()> {
    if src.len() < 4 {
        return Err(Error::Decompression("truncated lz4 block".to_string()));
    }
    let raw_len = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;
    if raw_len != dst.len() {
        return Err(Error::Decompression(format!(
            "lz4 block declares {} bytes, expected {}",
            raw_len,
            dst.len()
        )));
    }
    let written = lz4_flex::block::decompress_into(&src[4..], dst)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    if written != dst.len() {
        return Err(Error::Decompression(format!(
            "lz4 block produced {} bytes, expected {}",
            written,
            dst.len()
        )));
    }
    Ok(())
}

fn lz4_decompress_vec(src: &[u8]) -> Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(src).map_err(|e| Error::Decompression(e.to_string()))
}

fn zstd_compress(src: &[u8], intensity: u8) -> Result<Vec<u8>> {
    zstd::bulk::compress(src, zstd_level(intensity))
        .map_err(|e| Error::Compression(e.to_string()))
}

fn zstd_decompress_into(src: &[u8], dst: &mut [u8]) -> Result<()> {
    let mut decompressor =
        zstd::bulk::Decompressor::new().map_err(|e| Error::Decompression(e.to_string()))?;
    let written = decompressor
        .decompress_to_buffer(src, dst)
        .map_err(|e| Error::Decompression(e.to_string()))?;
    if written != dst.len() {
        return Err(Error::Decompression(format!(
            "zstd block produced {} bytes, expected {}",
            written,
            dst.len()
        )));
    }
    Ok(())
}

/// Compress one block of raw bytes through `stage`.
pub(crate) fn compress(src: &[u8], stage: Stage) -> Result<Vec<u8>> {
    match stage.algo {
        CompressAlgo::Identity => Ok(src.to_vec()),
        CompressAlgo::Lz4 => Ok(lz4_compress(src)),
        CompressAlgo::Zstd => zstd_compress(src, stage.intensity),
        CompressAlgo::Lz4Shuffle4 => Ok(lz4_compress(&shuffle(src, 4))),
        CompressAlgo::ZstdShuffle4 => zstd_compress(&shuffle(src, 4), stage.intensity),
        CompressAlgo::Lz4Shuffle8 => Ok(lz4_compress(&shuffle(src, 8))),
        CompressAlgo::ZstdShuffle8 => zstd_compress(&shuffle(src, 8), stage.intensity),
        CompressAlgo::BitPack => Ok(bitpack(src)),
        CompressAlgo::Lz4BitPack => Ok(lz4_compress(&bitpack(src))),
        CompressAlgo::ZstdBitPack => zstd_compress(&bitpack(src), stage.intensity),
    }
}

/// Decompress one block whose uncompressed size is known exactly.
///
/// `dst.len()` must equal the block's raw byte length; every mismatch is a
/// `Decompression` error rather than a silent truncation.
pub(crate) fn decompress_into(src: &[u8], algo: CompressAlgo, dst: &mut [u8]) -> Result<()> {
    match algo {
        CompressAlgo::Identity => {
            if src.len() != dst.len() {
                return Err(Error::Decompression(format!(
                    "identity block is {} bytes, expected {}",
                    src.len(),
                    dst.len()
                )));
            }
            dst.copy_from_slice(src);
            Ok(())
        }
        CompressAlgo::Lz4 => lz4_decompress_into(src, dst),
        CompressAlgo::Zstd => zstd_decompress_into(src, dst),
        CompressAlgo::Lz4Shuffle4 => {
            let mut planes = vec![0u8; dst.len()];
            lz4_decompress_into(src, &mut planes)?;
            unshuffle(&planes, 4, dst);
            Ok(())
        }
        CompressAlgo::ZstdShuffle4 => {
            let mut planes = vec![0u8; dst.len()];
            zstd_decompress_into(src, &mut planes)?;
            unshuffle(&planes, 4, dst);
            Ok(())
        }
        CompressAlgo::Lz4Shuffle8 => {
            let mut planes = vec![0u8; dst.len()];
            lz4_decompress_into(src, &mut planes)?;
            unshuffle(&planes, 8, dst);
            Ok(())
        }
        CompressAlgo::ZstdShuffle8 => {
            let mut planes = vec![0u8; dst.len()];
            zstd_decompress_into(src, &mut planes)?;
            unshuffle(&planes, 8, dst);
            Ok(())
        }
        CompressAlgo::BitPack => bitunpack(src, dst),
        CompressAlgo::Lz4BitPack => {
            let packed = lz4_decompress_vec(src)?;
            bitunpack(&packed, dst)
        }
        CompressAlgo::ZstdBitPack => {
            let mut packed = vec![0u8; packed_len(dst.len() / 4)];
            zstd_decompress_into(src, &mut packed)?;
            bitunpack(&packed, dst)
        }
    }
}

/// Decompress a variable-size payload, relying on self-describing framing.
///
/// Only the byte-transparent algorithms are meaningful here; the fixed-width
/// transforms never appear on variable-size blocks.
pub(crate) fn decompress_vec(src: &[u8], algo: CompressAlgo) -> Result<Vec<u8>> {
    match algo {
        CompressAlgo::Identity => Ok(src.to_vec()),
        CompressAlgo::Lz4 => lz4_decompress_vec(src),
        CompressAlgo::Zstd => {
            zstd::stream::decode_all(src).map_err(|e| Error::Decompression(e.to_string()))
        }
        other => Err(Error::Decompression(format!(
            "algorithm {} is not valid for a variable-size payload",
            other.id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestore_core::CompressAlgo::*;

    fn sample_u32_block(n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n * 4);
        for i in 0..n {
            out.extend_from_slice(&((i as u32).wrapping_mul(2654435761) % 1000).to_le_bytes());
        }
        out
    }

    fn sample_tristate_block(n: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(n * 4);
        for i in 0..n {
            out.extend_from_slice(&((i % 3) as u32).to_le_bytes());
        }
        out
    }

    // ---------------------------------------------------------------
    // Exact round-trips, sized path
    // ---------------------------------------------------------------

    #[test]
    fn test_roundtrip_identity() {
        let src = sample_u32_block(100);
        let compressed = compress(&src, Stage::new(Identity, 0)).unwrap();
        assert_eq!(compressed, src);
        let mut dst = vec![0u8; src.len()];
        decompress_into(&compressed, Identity, &mut dst).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn test_roundtrip_lz4_and_zstd() {
        let src = sample_u32_block(500);
        for stage in [Stage::new(Lz4, 100), Stage::new(Zstd, 50)] {
            let compressed = compress(&src, stage).unwrap();
            let mut dst = vec![0u8; src.len()];
            decompress_into(&compressed, stage.algo, &mut dst).unwrap();
            assert_eq!(dst, src, "mismatch for {:?}", stage.algo);
        }
    }

    #[test]
    fn test_roundtrip_shuffle_variants() {
        let src4 = sample_u32_block(300);
        let mut src8 = Vec::new();
        for i in 0..200u64 {
            src8.extend_from_slice(&(i as f64 * 0.25).to_le_bytes());
        }
        for (src, stage) in [
            (&src4, Stage::new(Lz4Shuffle4, 100)),
            (&src4, Stage::new(ZstdShuffle4, 75)),
            (&src8, Stage::new(Lz4Shuffle8, 100)),
            (&src8, Stage::new(ZstdShuffle8, 75)),
        ] {
            let compressed = compress(src, stage).unwrap();
            let mut dst = vec![0u8; src.len()];
            decompress_into(&compressed, stage.algo, &mut dst).unwrap();
            assert_eq!(&dst, src, "mismatch for {:?}", stage.algo);
        }
    }

    #[test]
    fn test_roundtrip_bitpack_variants() {
        for n in [1usize, 15, 16, 17, 4096] {
            let src = sample_tristate_block(n);
            for stage in [
                Stage::new(BitPack, 0),
                Stage::new(Lz4BitPack, 100),
                Stage::new(ZstdBitPack, 65),
            ] {
                let compressed = compress(&src, stage).unwrap();
                let mut dst = vec![0u8; src.len()];
                decompress_into(&compressed, stage.algo, &mut dst).unwrap();
                assert_eq!(dst, src, "mismatch for {:?} n={}", stage.algo, n);
            }
        }
    }

    #[test]
    fn test_bitpack_is_fixed_ratio() {
        let src = sample_tristate_block(4096);
        let packed = compress(&src, Stage::new(BitPack, 0)).unwrap();
        // 16 booleans per word: 4096 * 4 bytes in, 4096 / 16 * 4 bytes out
        assert_eq!(packed.len(), src.len() / 16);
    }

    // ---------------------------------------------------------------
    // Self-describing path
    // ---------------------------------------------------------------

    #[test]
    fn test_decompress_vec_roundtrip() {
        let src = b"a variable sized payload: offsets, then a heap of strings".to_vec();
        for stage in [
            Stage::new(Identity, 0),
            Stage::new(Lz4, 100),
            Stage::new(Zstd, 30),
        ] {
            let compressed = compress(&src, stage).unwrap();
            let out = decompress_vec(&compressed, stage.algo).unwrap();
            assert_eq!(out, src);
        }
    }

    #[test]
    fn test_decompress_vec_rejects_fixed_width_transforms() {
        assert!(decompress_vec(&[0u8; 8], BitPack).is_err());
        assert!(decompress_vec(&[0u8; 8], Lz4Shuffle4).is_err());
    }

    // ---------------------------------------------------------------
    // Failure paths
    // ---------------------------------------------------------------

    #[test]
    fn test_identity_size_mismatch_rejected() {
        let mut dst = vec![0u8; 8];
        let err = decompress_into(&[1, 2, 3], Identity, &mut dst).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_truncated_lz4_block_rejected() {
        let src = sample_u32_block(100);
        let compressed = compress(&src, Stage::new(Lz4, 100)).unwrap();
        let mut dst = vec![0u8; src.len()];
        let err = decompress_into(&compressed[..3], Lz4, &mut dst).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_corrupt_zstd_frame_rejected() {
        let mut dst = vec![0u8; 64];
        let err = decompress_into(&[0xAA; 16], Zstd, &mut dst).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)));
    }

    #[test]
    fn test_zstd_level_mapping() {
        assert_eq!(zstd_level(0), 1);
        assert_eq!(zstd_level(30), 6);
        assert_eq!(zstd_level(100), 22);
    }
}
