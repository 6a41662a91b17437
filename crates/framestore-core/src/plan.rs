//! Compression Plans
//!
//! This module maps the user-visible compression level (0..=100) to the
//! two-stage codec pipeline each column's blocks are routed through.
//!
//! ## Plan Shapes
//!
//! - **Identity**: level 0 for byte-transparent types; blocks are stored
//!   verbatim.
//! - **Single**: one algorithm for every block. Level 0 for booleans uses
//!   this shape with the fixed-ratio bit packer, which always runs.
//! - **Composite**: a primary and a secondary arm plus a mix ratio
//!   `0..=100`, the percentage of blocks routed through the stronger arm.
//!
//! ## Level Policy
//!
//! Levels 1..=50 mix an effectively-free primary with the fast codec at
//! full intensity (mix `2·L`); levels 51..=100 mix the fast codec with the
//! strong codec at intensity `30 + 7·((L−50)/5)` (mix `2·(L−50)`). Each
//! column type supplies its own algorithm pair, so integers shuffle on a
//! 4-byte stride, doubles on an 8-byte stride, and booleans bit-pack before
//! either codec runs.
//!
//! A plan is plain `Copy` data with no resources attached; the planner is
//! total over its input domain.

use crate::column::ColumnType;

/// Byte-compressor algorithm ids, stable on disk.
///
/// The block index records one of these per block, so a reader never has to
/// reconstruct the writer's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CompressAlgo {
    /// Verbatim copy.
    Identity = 0,
    /// Fast LZ codec, size-prepended block format.
    Lz4 = 1,
    /// Strong entropy codec.
    Zstd = 2,
    /// Byte shuffle with stride 4, then Lz4.
    Lz4Shuffle4 = 3,
    /// Byte shuffle with stride 4, then Zstd.
    ZstdShuffle4 = 4,
    /// Byte shuffle with stride 8, then Lz4.
    Lz4Shuffle8 = 5,
    /// Byte shuffle with stride 8, then Zstd.
    ZstdShuffle8 = 6,
    /// Fixed-ratio 2-bit packing of tri-state booleans (16 per u32 word).
    BitPack = 7,
    /// BitPack, then Lz4.
    Lz4BitPack = 8,
    /// BitPack, then Zstd.
    ZstdBitPack = 9,
}

impl CompressAlgo {
    pub fn id(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for CompressAlgo {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CompressAlgo::Identity),
            1 => Ok(CompressAlgo::Lz4),
            2 => Ok(CompressAlgo::Zstd),
            3 => Ok(CompressAlgo::Lz4Shuffle4),
            4 => Ok(CompressAlgo::ZstdShuffle4),
            5 => Ok(CompressAlgo::Lz4Shuffle8),
            6 => Ok(CompressAlgo::ZstdShuffle8),
            7 => Ok(CompressAlgo::BitPack),
            8 => Ok(CompressAlgo::Lz4BitPack),
            9 => Ok(CompressAlgo::ZstdBitPack),
            _ => Err(crate::Error::UnknownCodec(value)),
        }
    }
}

/// One compression stage: an algorithm and its internal intensity (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub algo: CompressAlgo,
    pub intensity: u8,
}

impl Stage {
    pub const fn new(algo: CompressAlgo, intensity: u8) -> Self {
        Self { algo, intensity }
    }
}

/// How a column's blocks are compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionPlan {
    /// Every block stored verbatim.
    Identity,
    /// Every block through one stage.
    Single(Stage),
    /// Blocks split between two arms; `mix` percent go to `secondary`.
    Composite {
        primary: Stage,
        secondary: Stage,
        mix: u8,
    },
}

impl CompressionPlan {
    /// The stage block `block` is routed through.
    ///
    /// Composite assignment is a deterministic dither: block `b` takes the
    /// secondary arm iff `(b+1)·mix/100` exceeds `b·mix/100` in integer
    /// arithmetic, which sends ⌊mix·n/100⌋ of every n blocks to the
    /// secondary, evenly spread, with block 0 on the primary for mix < 100.
    /// Readers never rely on this: each block records its own algorithm id.
    pub fn stage_for_block(&self, block: u64) -> Stage {
        match *self {
            CompressionPlan::Identity => Stage::new(CompressAlgo::Identity, 0),
            CompressionPlan::Single(stage) => stage,
            CompressionPlan::Composite {
                primary,
                secondary,
                mix,
            } => {
                let mix = mix as u64;
                if (block + 1) * mix / 100 > block * mix / 100 {
                    secondary
                } else {
                    primary
                }
            }
        }
    }
}

/// Strong-codec intensity for levels 51..=100.
fn strong_intensity(level: u8) -> u8 {
    30 + 7 * ((level - 50) / 5)
}

/// Map a column type and user level to a compression plan.
///
/// `level` must already be validated to 0..=100 by the caller; the planner
/// itself never fails.
pub fn plan_for(column_type: ColumnType, level: u8) -> CompressionPlan {
    debug_assert!(level <= 100);

    use CompressAlgo::*;

    // Each type contributes (level-0 stage, fast algo, strong algo).
    let (base, fast, strong) = match column_type {
        ColumnType::Boolean => (Some(BitPack), Lz4BitPack, ZstdBitPack),
        ColumnType::Integer | ColumnType::Factor => (None, Lz4Shuffle4, ZstdShuffle4),
        ColumnType::Double => (None, Lz4Shuffle8, ZstdShuffle8),
        ColumnType::Character => (None, Lz4, Zstd),
    };

    match level {
        0 => match base {
            Some(algo) => CompressionPlan::Single(Stage::new(algo, 0)),
            None => CompressionPlan::Identity,
        },
        1..=50 => CompressionPlan::Composite {
            primary: match base {
                Some(algo) => Stage::new(algo, 0),
                None => Stage::new(Identity, 0),
            },
            secondary: Stage::new(fast, 100),
            mix: 2 * level,
        },
        _ => CompressionPlan::Composite {
            primary: Stage::new(fast, 100),
            secondary: Stage::new(strong, strong_intensity(level)),
            mix: 2 * (level - 50),
        },
    }
}
