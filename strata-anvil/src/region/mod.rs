//! Region (`.mca`) files: the container chunks are fetched from.
//!
//! A region holds 32x32 chunks behind an 8 KiB header. Each stored chunk
//! is `[length:4][compression:1][payload:length-1]`, the payload being a
//! compressed NBT compound.

pub mod header;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use fastnbt::Value;
use flate2::read::{GzDecoder, ZlibDecoder};
use log::{debug, trace};
use lz4_java_wrc::Lz4BlockInput;

use crate::error::{Error, Result};
use header::{HEADER_SIZE, Location, SECTOR_SIZE};

/// Anything that can hand out a chunk's root tag by chunk coordinates.
pub trait ChunkSource {
    /// `Ok(None)` when the chunk was never generated.
    fn chunk_data(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Value>>;
}

/// Payload compression schemes, by their on-disk id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Compression {
    Gzip = 1,
    Zlib = 2,
    None = 3,
    Lz4 = 4,
}

impl TryFrom<u8> for Compression {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Compression::Gzip),
            2 => Ok(Compression::Zlib),
            3 => Ok(Compression::None),
            4 => Ok(Compression::Lz4),
            _ => Err(Error::UnsupportedCompression(value)),
        }
    }
}

impl Compression {
    pub fn decompress(self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Compression::Gzip => GzDecoder::new(payload).read_to_end(&mut out)?,
            Compression::Zlib => ZlibDecoder::new(payload).read_to_end(&mut out)?,
            Compression::None => {
                out.extend_from_slice(payload);
                payload.len()
            }
            Compression::Lz4 => Lz4BlockInput::new(payload).read_to_end(&mut out)?,
        };
        Ok(out)
    }
}

/// Marks a chunk stored in a separate `c.<x>.<z>.mcc` file.
const EXTERNAL_FLAG: u8 = 0x80;

/// A whole region file held in memory.
#[derive(Debug, Clone)]
pub struct Region {
    data: Vec<u8>,
}

impl Region {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        debug!("loaded region {} ({} bytes)", path.as_ref().display(), data.len());
        Ok(Self::from_bytes(data))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn header(&self) -> Result<&[u8]> {
        if self.data.is_empty() {
            return Err(Error::InvalidRegion("region file is empty".to_string()));
        }
        self.data.get(..HEADER_SIZE).ok_or_else(|| {
            Error::InvalidRegion(format!("header truncated to {} bytes", self.data.len()))
        })
    }

    /// `(sector_offset, sector_count)` of a chunk; `(0, 0)` if it is not stored.
    pub fn chunk_location(&self, chunk_x: i32, chunk_z: i32) -> Result<(u32, u8)> {
        let loc = header::location(self.header()?, header::chunk_index(chunk_x, chunk_z));
        Ok((loc.sector_offset, loc.sector_count))
    }

    /// Last save time of a chunk in seconds since the epoch; 0 if never saved.
    pub fn timestamp(&self, chunk_x: i32, chunk_z: i32) -> Result<u32> {
        Ok(header::timestamp(self.header()?, header::chunk_index(chunk_x, chunk_z)))
    }

    /// Raw decompressed NBT bytes of a chunk.
    pub fn chunk_bytes(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Vec<u8>>> {
        let loc = header::location(self.header()?, header::chunk_index(chunk_x, chunk_z));
        if loc.is_empty() || loc.sector_offset == 0 {
            trace!("chunk ({chunk_x}, {chunk_z}) not present in region");
            return Ok(None);
        }

        let (length, compression) = self.chunk_prefix(&loc)?;
        if length <= 1 {
            return Ok(None);
        }
        // the length prefix itself takes 4 bytes of the allotted sectors
        if length + 4 > loc.sector_count as usize * SECTOR_SIZE {
            return Err(Error::InvalidRegion(format!(
                "chunk ({chunk_x}, {chunk_z}) length {length} exceeds its {} sectors",
                loc.sector_count
            )));
        }
        if compression & EXTERNAL_FLAG != 0 {
            return Err(Error::ExternalChunk { x: chunk_x, z: chunk_z });
        }
        let compression = Compression::try_from(compression)?;

        let start = loc.byte_offset() + 5;
        let payload = self.data.get(start..start + length - 1).ok_or_else(|| {
            Error::InvalidRegion(format!("chunk ({chunk_x}, {chunk_z}) runs past end of file"))
        })?;
        debug!(
            "chunk ({chunk_x}, {chunk_z}): {} bytes, {:?}",
            payload.len(),
            compression
        );
        compression.decompress(payload).map(Some)
    }

    fn chunk_prefix(&self, loc: &Location) -> Result<(usize, u8)> {
        let start = loc.byte_offset();
        let prefix = self
            .data
            .get(start..start + 5)
            .ok_or_else(|| Error::InvalidRegion(format!("sector {} out of bounds", loc.sector_offset)))?;
        let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        Ok((length, prefix[4]))
    }
}

impl ChunkSource for Region {
    fn chunk_data(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Value>> {
        match self.chunk_bytes(chunk_x, chunk_z)? {
            Some(bytes) => Ok(Some(fastnbt::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// A world's `region/` directory of `r.<x>.<z>.mca` files.
#[derive(Debug, Clone)]
pub struct RegionDir {
    path: PathBuf,
}

impl RegionDir {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// File holding chunk `(chunk_x, chunk_z)`.
    pub fn region_path(&self, chunk_x: i32, chunk_z: i32) -> PathBuf {
        self.path
            .join(format!("r.{}.{}.mca", chunk_x >> 5, chunk_z >> 5))
    }
}

impl ChunkSource for RegionDir {
    fn chunk_data(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Value>> {
        let path = self.region_path(chunk_x, chunk_z);
        if !path.exists() {
            debug!("no region file {}", path.display());
            return Ok(None);
        }
        Region::from_file(path)?.chunk_data(chunk_x, chunk_z)
    }
}
