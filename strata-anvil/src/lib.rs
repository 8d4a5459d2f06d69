//! Anvil chunk decoding.
//!
//! Reads block states, palettes and tile entities out of a chunk's tag
//! tree across every storage era since 1.12, including pre-flattening
//! numeric ids. `Region` and `RegionDir` fetch chunks from `.mca` files.

pub mod bits;
pub mod block;
pub mod chunk;
pub mod error;
pub mod nbt;
pub mod region;
pub mod stream;
pub mod version;

#[cfg(test)]
mod test_support;

pub use block::{Block, LegacyBlock, ModernBlock};
pub use chunk::{Chunk, Section};
pub use error::{Error, Result};
pub use region::{ChunkSource, Region, RegionDir};
pub use stream::{BlockStream, ChunkStream};
pub use version::FormatEra;
