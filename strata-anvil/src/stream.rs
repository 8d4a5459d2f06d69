//! Sequential section and chunk decoding.
//!
//! Streams yield blocks in storage order (YZX within a section, sections
//! bottom to top) and decode each packed word once, instead of the per
//! voxel word arithmetic of `Chunk::get_block`.

use fastnbt::Value;

use crate::bits::{PackedIndices, SECTION_VOLUME};
use crate::block::{Block, ModernBlock};
use crate::chunk::{Chunk, LegacyArrays, Section, SectionData};
use crate::error::{Error, Result};

/// Sections in a chunk column.
pub const SECTIONS_PER_CHUNK: i32 = 16;

enum State<'a> {
    /// Every voxel is the same block.
    Fill(Block),
    Legacy { arrays: LegacyArrays<'a>, index: usize },
    Paletted {
        palette: LazyPalette<'a>,
        indices: PackedIndices<'a>,
    },
    Done,
}

/// Palette entries decoded on first use, so an entry no voxel refers to
/// never has to parse.
struct LazyPalette<'a> {
    entries: &'a [Value],
    decoded: Vec<Option<ModernBlock>>,
}

impl<'a> LazyPalette<'a> {
    fn new(entries: &'a [Value]) -> Self {
        Self {
            entries,
            decoded: vec![None; entries.len()],
        }
    }

    fn get(&mut self, index: usize) -> Result<ModernBlock> {
        let entry = self.entries.get(index).ok_or(Error::PaletteIndex {
            index,
            len: self.entries.len(),
        })?;
        match &mut self.decoded[index] {
            Some(block) => Ok(block.clone()),
            slot => Ok(slot.insert(ModernBlock::from_palette(entry)?).clone()),
        }
    }
}

/// The 4096 blocks of one section, in YZX order.
///
/// Yields exactly [`SECTION_VOLUME`] items unless decoding fails; after an
/// error the stream ends.
pub struct BlockStream<'a> {
    state: State<'a>,
    remaining: usize,
}

impl<'a> BlockStream<'a> {
    fn new(state: State<'a>) -> Self {
        Self {
            state,
            remaining: SECTION_VOLUME,
        }
    }

    fn fail(&mut self, error: Error) -> Option<Result<Block>> {
        self.state = State::Done;
        self.remaining = 0;
        Some(Err(error))
    }
}

impl Iterator for BlockStream<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let block = match &mut self.state {
            State::Done => return None,
            State::Fill(block) => Ok(block.clone()),
            State::Legacy { arrays, index } => {
                let block = arrays.block(*index).map(Block::Legacy);
                *index += 1;
                block
            }
            State::Paletted { palette, indices } => match indices.next() {
                Some(Ok(i)) => palette.get(i).map(Block::Modern),
                Some(Err(e)) => Err(e),
                None => return None,
            },
        };
        match block {
            Ok(block) => {
                self.remaining -= 1;
                Some(Ok(block))
            }
            Err(e) => self.fail(e),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl Chunk {
    /// Streams section `section_y`; an absent section yields 4096 air blocks.
    ///
    /// # Errors
    /// `OutOfRange` unless `0 <= section_y <= 15`. Structural problems in
    /// the stored section surface here or as the stream's first error.
    pub fn stream_blocks(&self, section_y: i32) -> Result<BlockStream<'_>> {
        let section = self.get_section(section_y)?;
        self.stream_section(section.as_ref())
    }

    /// Streams an already resolved section. `None` stands for an absent one.
    pub fn stream_section<'a>(&'a self, section: Option<&Section<'a>>) -> Result<BlockStream<'a>> {
        let state = match self.section_data(section)? {
            SectionData::Air => State::Fill(self.air()),
            SectionData::Legacy(arrays) => State::Legacy { arrays, index: 0 },
            SectionData::Paletted {
                palette,
                states,
                bits,
                packing,
            } => State::Paletted {
                palette: LazyPalette::new(palette),
                indices: PackedIndices::new(states, bits, packing, SECTION_VOLUME),
            },
        };
        Ok(BlockStream::new(state))
    }

    /// Streams all 65536 blocks of the chunk, section 0 first.
    pub fn stream_chunk(&self) -> ChunkStream<'_> {
        ChunkStream {
            chunk: self,
            next_section: 0,
            current: None,
            failed: false,
        }
    }
}

/// Every block of a chunk: the sections' streams chained bottom to top.
pub struct ChunkStream<'a> {
    chunk: &'a Chunk,
    next_section: i32,
    current: Option<BlockStream<'a>>,
    failed: bool,
}

impl Iterator for ChunkStream<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(stream) = &mut self.current {
                match stream.next() {
                    Some(Ok(block)) => return Some(Ok(block)),
                    Some(Err(e)) => {
                        self.failed = true;
                        return Some(Err(e));
                    }
                    None => self.current = None,
                }
            }
            if self.next_section >= SECTIONS_PER_CHUNK {
                return None;
            }
            match self.chunk.stream_blocks(self.next_section) {
                Ok(stream) => self.current = Some(stream),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
            self.next_section += 1;
        }
    }
}
