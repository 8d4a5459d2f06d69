//! Chunk decoding.
//!
//! A `Chunk` owns the parsed tag tree of one chunk and answers block,
//! palette, section and tile entity queries against it. The format era is
//! resolved once at construction; every query navigates the tree again
//! using that era's layout. Absent sections and missing block arrays are
//! air, never errors.

use fastnbt::Value;
use log::{debug, trace, warn};

use crate::bits::{self, Packing, SECTION_VOLUME};
use crate::block::{Block, LegacyBlock, ModernBlock};
use crate::error::{Error, Result, check_range};
use crate::nbt::{self, Compound};
use crate::region::ChunkSource;
use crate::version::{FormatEra, Layout};

/// YZX index of a voxel inside a section.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    y * 256 + z * 16 + x
}

/// A 16x16x16 slab of the chunk, borrowed from the tag tree.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    y: i8,
    tag: &'a Compound,
}

impl<'a> Section<'a> {
    pub fn y(&self) -> i8 {
        self.y
    }

    pub fn tag(&self) -> &'a Compound {
        self.tag
    }
}

/// Pre-flattening block arrays of one section, all in YZX order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LegacyArrays<'a> {
    blocks: &'a [i8],
    add: Option<&'a [i8]>,
    data: Option<&'a [i8]>,
}

fn nibble(array: &[i8], index: usize) -> Result<u8> {
    let byte = *array
        .get(index / 2)
        .ok_or(Error::TruncatedBlockStates {
            needed: index / 2,
            len: array.len(),
        })? as u8;
    Ok(if index % 2 == 1 { byte >> 4 } else { byte & 0x0F })
}

impl LegacyArrays<'_> {
    pub(crate) fn block(&self, index: usize) -> Result<LegacyBlock> {
        let mut id = *self.blocks.get(index).ok_or(Error::TruncatedBlockStates {
            needed: index,
            len: self.blocks.len(),
        })? as u8 as u16;
        if let Some(add) = self.add {
            id |= (nibble(add, index)? as u16) << 8;
        }
        let data = match self.data {
            Some(data) => nibble(data, index)?,
            None => 0,
        };
        Ok(LegacyBlock::new(id, data))
    }
}

/// What a section's storage resolved to for one query.
pub(crate) enum SectionData<'a> {
    /// Nothing stored: every voxel is air.
    Air,
    Paletted {
        palette: &'a [Value],
        states: &'a [i64],
        bits: u32,
        packing: Packing,
    },
    Legacy(LegacyArrays<'a>),
}

/// Decoder over a single chunk's tag tree.
#[derive(Debug, Clone)]
pub struct Chunk {
    data_version: Option<i32>,
    era: FormatEra,
    layout: Layout,
    x: i32,
    z: i32,
    // body compound: the root itself, or its `Level` child in older eras
    level: Compound,
    tile_entities: Vec<Value>,
}

impl Chunk {
    /// Builds a decoder from a chunk's root compound.
    pub fn from_nbt(root: Value) -> Result<Self> {
        let Value::Compound(mut root) = root else {
            return Err(Error::UnexpectedTag {
                tag: "root".to_string(),
                expected: "compound",
            });
        };

        let data_version = nbt::get_int(&root, "DataVersion")?.map(|v| v as i32);
        let era = FormatEra::from_data_version(data_version);
        let layout = era.layout();

        let mut level = match layout.level_tag {
            Some(tag) => match root.remove(tag) {
                Some(Value::Compound(level)) => level,
                Some(_) => {
                    return Err(Error::UnexpectedTag {
                        tag: tag.to_string(),
                        expected: "compound",
                    });
                }
                None => return Err(Error::MissingTag(tag.to_string())),
            },
            None => root,
        };

        let x = nbt::get_int(&level, "xPos")?.ok_or_else(|| Error::MissingTag("xPos".to_string()))?;
        let z = nbt::get_int(&level, "zPos")?.ok_or_else(|| Error::MissingTag("zPos".to_string()))?;
        let (x, z) = (x as i32, z as i32);

        let tile_entities = match level.remove(layout.tile_entities_tag) {
            Some(Value::List(items)) => items,
            Some(_) => {
                return Err(Error::UnexpectedTag {
                    tag: layout.tile_entities_tag.to_string(),
                    expected: "list",
                });
            }
            None => {
                warn!("chunk ({x}, {z}) has no {} list", layout.tile_entities_tag);
                Vec::new()
            }
        };

        debug!("chunk ({x}, {z}): data version {data_version:?}, era {era:?}");

        Ok(Self {
            data_version,
            era,
            layout,
            x,
            z,
            level,
            tile_entities,
        })
    }

    /// Fetches chunk `(chunk_x, chunk_z)` from a region source and decodes it.
    pub fn from_region<S: ChunkSource + ?Sized>(source: &S, chunk_x: i32, chunk_z: i32) -> Result<Self> {
        let root = source
            .chunk_data(chunk_x, chunk_z)?
            .ok_or(Error::ChunkNotFound { x: chunk_x, z: chunk_z })?;
        Self::from_nbt(root)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn data_version(&self) -> Option<i32> {
        self.data_version
    }

    pub fn era(&self) -> FormatEra {
        self.era
    }

    pub fn tile_entities(&self) -> &[Value] {
        &self.tile_entities
    }

    /// Section with stored `Y == y`, or `None` if the slab is all air.
    ///
    /// # Errors
    /// `OutOfRange` unless `0 <= y <= 15`.
    pub fn get_section(&self, y: i32) -> Result<Option<Section<'_>>> {
        check_range("section", y)?;

        let Some(sections) = nbt::get_list(&self.level, self.layout.sections_tag)? else {
            return Ok(None);
        };
        for section in sections {
            let tag = nbt::expect_compound(section, self.layout.sections_tag)?;
            if nbt::get_int(tag, "Y")? == Some(y as i64) {
                return Ok(Some(Section { y: y as i8, tag }));
            }
        }
        Ok(None)
    }

    /// Decoded palette of section `y`; `None` when there is none (air).
    pub fn get_palette(&self, y: i32) -> Result<Option<Vec<ModernBlock>>> {
        match self.get_section(y)? {
            Some(section) => self.section_palette(&section),
            None => Ok(None),
        }
    }

    pub fn section_palette(&self, section: &Section<'_>) -> Result<Option<Vec<ModernBlock>>> {
        match self.palette_list(section)? {
            Some(entries) => entries
                .iter()
                .map(ModernBlock::from_palette)
                .collect::<Result<Vec<_>>>()
                .map(Some),
            None => Ok(None),
        }
    }

    /// Block at chunk-local `x`, `z` and absolute `y` (`0..=255`).
    ///
    /// Pre-flattening chunks return `Block::Legacy`; use
    /// `Block::into_modern` for the namespaced form.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Result<Block> {
        check_range("X", x)?;
        check_range("Z", z)?;
        let section = self.get_section(y.div_euclid(16))?;
        self.section_block(section.as_ref(), x, y.rem_euclid(16), z)
    }

    /// Block at section-local coordinates. `None` stands for an absent section.
    pub fn section_block(&self, section: Option<&Section<'_>>, x: i32, y: i32, z: i32) -> Result<Block> {
        check_range("X", x)?;
        check_range("Y", y)?;
        check_range("Z", z)?;
        let index = block_index(x as usize, y as usize, z as usize);

        match self.section_data(section)? {
            SectionData::Air => Ok(self.air()),
            SectionData::Legacy(arrays) => Ok(Block::Legacy(arrays.block(index)?)),
            SectionData::Paletted {
                palette,
                states,
                bits,
                packing,
            } => {
                let palette_index = bits::extract(states, index, bits, packing)?;
                let entry = palette.get(palette_index).ok_or(Error::PaletteIndex {
                    index: palette_index,
                    len: palette.len(),
                })?;
                Ok(Block::Modern(ModernBlock::from_palette(entry)?))
            }
        }
    }

    /// First tile entity whose `x`, `y`, `z` equal the given world coordinates.
    pub fn get_tile_entity(&self, x: i32, y: i32, z: i32) -> Option<&Compound> {
        let wanted = [x as i64, y as i64, z as i64];
        self.tile_entities.iter().find_map(|entity| {
            let Value::Compound(entity) = entity else {
                return None;
            };
            let position = ["x", "y", "z"].map(|k| entity.get(k).and_then(nbt::as_int));
            (position == wanted.map(Some)).then_some(entity)
        })
    }

    /// Air in the representation this era's blocks use.
    pub(crate) fn air(&self) -> Block {
        if self.layout.legacy {
            Block::Legacy(LegacyBlock::AIR)
        } else {
            Block::Modern(ModernBlock::air())
        }
    }

    fn palette_parent<'a>(&self, section: &Section<'a>) -> Result<Option<&'a Compound>> {
        match self.layout.block_states_parent {
            Some(tag) => nbt::get_compound(section.tag, tag),
            None => Ok(Some(section.tag)),
        }
    }

    fn palette_list<'a>(&self, section: &Section<'a>) -> Result<Option<&'a [Value]>> {
        if self.layout.legacy {
            return Ok(None);
        }
        match self.palette_parent(section)? {
            Some(parent) => nbt::get_list(parent, self.layout.palette_tag),
            None => Ok(None),
        }
    }

    /// Resolves where a section's blocks live, once per query.
    pub(crate) fn section_data<'a>(&self, section: Option<&Section<'a>>) -> Result<SectionData<'a>> {
        let Some(section) = section else {
            return Ok(SectionData::Air);
        };

        if self.layout.legacy {
            let Some(blocks) = nbt::get_byte_array(section.tag, "Blocks")? else {
                trace!("section {} has no Blocks array", section.y);
                return Ok(SectionData::Air);
            };
            return Ok(SectionData::Legacy(LegacyArrays {
                blocks,
                add: nbt::get_byte_array(section.tag, "Add")?,
                data: nbt::get_byte_array(section.tag, "Data")?,
            }));
        }

        let Some(parent) = self.palette_parent(section)? else {
            return Ok(SectionData::Air);
        };
        let palette = nbt::get_list(parent, self.layout.palette_tag)?;
        let states = nbt::get_long_array(parent, self.layout.block_states_tag)?;

        match (palette, states) {
            (Some(palette), Some(states)) if !palette.is_empty() => Ok(SectionData::Paletted {
                palette,
                states,
                bits: bits::bits_per_index(palette.len()),
                packing: Packing::from_stretches(self.layout.stretches),
            }),
            _ => {
                trace!("section {} has no block states, treating as air", section.y);
                Ok(SectionData::Air)
            }
        }
    }
}
