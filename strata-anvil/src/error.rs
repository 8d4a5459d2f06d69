use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A coordinate or section index fell outside `0..=15`.
    #[error("{axis} ({value}) must be in range of 0 to 15")]
    OutOfRange { axis: &'static str, value: i32 },

    #[error("could not find chunk ({x}, {z})")]
    ChunkNotFound { x: i32, z: i32 },

    #[error("missing tag: {0}")]
    MissingTag(String),

    #[error("tag {tag} is not a {expected}")]
    UnexpectedTag { tag: String, expected: &'static str },

    #[error("palette index {index} out of range for palette of {len}")]
    PaletteIndex { index: usize, len: usize },

    #[error("block state array too short: need word {needed}, have {len}")]
    TruncatedBlockStates { needed: usize, len: usize },

    #[error("no modern equivalent for legacy block {id}:{data}")]
    UnknownLegacyBlock { id: u16, data: u8 },

    #[error("legacy block table is invalid: {0}")]
    LegacyTable(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("nbt error: {0}")]
    Nbt(#[from] fastnbt::error::Error),

    #[error("unsupported chunk compression: {0}")]
    UnsupportedCompression(u8),

    #[error("chunk ({x}, {z}) is stored outside the region file")]
    ExternalChunk { x: i32, z: i32 },

    #[error("invalid region file: {0}")]
    InvalidRegion(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rejects anything outside the inclusive `0..=15` range used for
/// local x/z and section indices.
pub(crate) fn check_range(axis: &'static str, value: i32) -> Result<()> {
    if !(0..=15).contains(&value) {
        return Err(Error::OutOfRange { axis, value });
    }
    Ok(())
}
