//! Region file header parsing.
//!
//! The header consists of two tables:
//! - Location table: where each chunk is stored
//! - Timestamp table: when each chunk was last saved

/// Region files are addressed in 4 KiB sectors.
pub const SECTOR_SIZE: usize = 4096;
/// Location table + timestamp table (2 sectors).
pub const HEADER_SIZE: usize = 2 * SECTOR_SIZE;
/// Chunks per region side.
pub const REGION_WIDTH: i32 = 32;

/// Slot of a chunk in the 32x32 header tables. Formula: x + z * 32
#[inline]
pub fn chunk_index(chunk_x: i32, chunk_z: i32) -> usize {
    ((chunk_x & (REGION_WIDTH - 1)) + (chunk_z & (REGION_WIDTH - 1)) * REGION_WIDTH) as usize
}

/// One location table entry: 3 bytes sector offset + 1 byte sector count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub sector_offset: u32,
    pub sector_count: u8,
}

impl Location {
    pub fn is_empty(&self) -> bool {
        self.sector_offset == 0 && self.sector_count == 0
    }

    /// Byte offset of the chunk payload in the file.
    pub fn byte_offset(&self) -> usize {
        self.sector_offset as usize * SECTOR_SIZE
    }
}

/// Reads the location entry for `index` from a full header.
pub fn location(header: &[u8], index: usize) -> Location {
    let entry = &header[index * 4..index * 4 + 4];
    Location {
        sector_offset: (entry[0] as u32) << 16 | (entry[1] as u32) << 8 | entry[2] as u32,
        sector_count: entry[3],
    }
}

/// Last save time (seconds since the epoch) for `index`.
pub fn timestamp(header: &[u8], index: usize) -> u32 {
    let start = SECTOR_SIZE + index * 4;
    u32::from_be_bytes([header[start], header[start + 1], header[start + 2], header[start + 3]])
}
