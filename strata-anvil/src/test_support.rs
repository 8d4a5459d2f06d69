//! In-memory chunk fixtures for tests.

use std::collections::HashMap;
use std::io::Write;

use fastnbt::{ByteArray, LongArray, Value};
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};
use lz4_java_wrc::Lz4BlockOutput;

use crate::bits::{SECTION_VOLUME, bits_per_index};
use crate::error::Result;
use crate::nbt::Compound;
use crate::region::header::{HEADER_SIZE, SECTOR_SIZE, chunk_index};
use crate::region::ChunkSource;
use crate::version::FormatEra;

/// One data version per modern era: stretched, padded, renamed, unwrapped.
pub const MODERN_VERSIONS: [i32; 4] = [1500, 2600, 2840, 3000];

/// Deterministic pseudo-random palette indices; the last one is the widest.
pub fn sample_indices(palette_len: usize, seed: u64) -> Vec<usize> {
    let mut state = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut indices: Vec<usize> = (0..SECTION_VOLUME)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % palette_len as u64) as usize
        })
        .collect();
    indices[SECTION_VOLUME - 1] = palette_len - 1;
    indices
}

/// Packs indices so none crosses a word boundary (20w17a+).
pub fn pack_padded(indices: &[usize], bits: u32) -> Vec<i64> {
    let bits = bits as usize;
    let per_word = 64 / bits;
    let mut words = vec![0i64; indices.len().div_ceil(per_word)];
    for (i, &index) in indices.iter().enumerate() {
        // treat i64 as u64 for the bit ops, then cast back
        let current = words[i / per_word] as u64;
        let updated = current | ((index as u64) << ((i % per_word) * bits));
        words[i / per_word] = updated as i64;
    }
    words
}

/// Packs indices end to end, letting them straddle words (pre-20w17a).
pub fn pack_stretched(indices: &[usize], bits: u32) -> Vec<i64> {
    let bits = bits as usize;
    let mut words = vec![0u64; (indices.len() * bits).div_ceil(64)];
    for (i, &index) in indices.iter().enumerate() {
        let start = i * bits;
        let (w, offset) = (start / 64, start % 64);
        words[w] |= (index as u64) << offset;
        if offset + bits > 64 {
            words[w + 1] |= (index as u64) >> (64 - offset);
        }
    }
    words.into_iter().map(|w| w as i64).collect()
}

/// Parses `name[k=v,...]` into a palette entry compound.
fn palette_entry(text: &str) -> Value {
    let mut entry = Compound::new();
    let (name, props) = match text.split_once('[') {
        Some((name, rest)) => (name, rest.trim_end_matches(']')),
        None => (text, ""),
    };
    entry.insert("Name".into(), Value::String(name.to_string()));
    if !props.is_empty() {
        let props: Compound = props
            .split(',')
            .filter_map(|kv| kv.split_once('='))
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        entry.insert("Properties".into(), Value::Compound(props));
    }
    Value::Compound(entry)
}

fn palette_list(palette: &[&str]) -> Value {
    Value::List(palette.iter().map(|p| palette_entry(p)).collect())
}

/// A paletted section laid out the way `version` stores it.
pub fn modern_section(version: i32, y: i8, palette: &[&str], indices: &[usize]) -> Value {
    let layout = FormatEra::from_data_version(Some(version)).layout();
    let bits = bits_per_index(palette.len());
    let words = if layout.stretches {
        pack_stretched(indices, bits)
    } else {
        pack_padded(indices, bits)
    };

    let mut storage = Compound::new();
    storage.insert(layout.palette_tag.into(), palette_list(palette));
    storage.insert(layout.block_states_tag.into(), Value::LongArray(LongArray::new(words)));
    section_with(layout.block_states_parent, y, storage)
}

/// A section whose palette has one entry and no bit array.
pub fn uniform_section(version: i32, y: i8, name: &str) -> Value {
    let layout = FormatEra::from_data_version(Some(version)).layout();
    let mut storage = Compound::new();
    storage.insert(layout.palette_tag.into(), palette_list(&[name]));
    section_with(layout.block_states_parent, y, storage)
}

fn section_with(parent: Option<&str>, y: i8, storage: Compound) -> Value {
    let mut section = match parent {
        Some(parent) => {
            let mut section = Compound::new();
            section.insert(parent.into(), Value::Compound(storage));
            section
        }
        None => storage,
    };
    section.insert("Y".into(), Value::Byte(y));
    Value::Compound(section)
}

/// Overwrites the packed words of a section built by `modern_section`.
pub fn set_block_states(section: &mut Value, version: i32, words: Vec<i64>) {
    let layout = FormatEra::from_data_version(Some(version)).layout();
    let Value::Compound(section) = section else {
        panic!("section is not a compound");
    };
    let storage = match layout.block_states_parent {
        Some(parent) => match section.get_mut(parent) {
            Some(Value::Compound(storage)) => storage,
            _ => panic!("missing {parent}"),
        },
        None => section,
    };
    storage.insert(layout.block_states_tag.into(), Value::LongArray(LongArray::new(words)));
}

/// Appends a raw entry to the palette of a section built by `modern_section`.
pub fn push_palette_entry(section: &mut Value, version: i32, entry: Value) {
    let layout = FormatEra::from_data_version(Some(version)).layout();
    let Value::Compound(section) = section else {
        panic!("section is not a compound");
    };
    let storage = match layout.block_states_parent {
        Some(parent) => match section.get_mut(parent) {
            Some(Value::Compound(storage)) => storage,
            _ => panic!("missing {parent}"),
        },
        None => section,
    };
    match storage.get_mut(layout.palette_tag) {
        Some(Value::List(palette)) => palette.push(entry),
        _ => panic!("missing {}", layout.palette_tag),
    }
}

fn pack_nibbles(values: impl Iterator<Item = u8>) -> Vec<i8> {
    let mut out = vec![0u8; SECTION_VOLUME / 2];
    for (i, v) in values.enumerate() {
        out[i / 2] |= (v & 0x0F) << (4 * (i % 2));
    }
    out.into_iter().map(|b| b as i8).collect()
}

/// A pre-flattening section; `Add` is written only when an id needs it.
pub fn legacy_section(y: i8, ids: &[u16], data: &[u8]) -> Value {
    let mut section = Compound::new();
    section.insert("Y".into(), Value::Byte(y));
    let blocks: Vec<i8> = ids.iter().map(|id| (*id & 0xFF) as u8 as i8).collect();
    section.insert("Blocks".into(), Value::ByteArray(ByteArray::new(blocks)));
    if ids.iter().any(|id| *id > 0xFF) {
        let add = pack_nibbles(ids.iter().map(|id| (id >> 8) as u8));
        section.insert("Add".into(), Value::ByteArray(ByteArray::new(add)));
    }
    let data = pack_nibbles(data.iter().copied());
    section.insert("Data".into(), Value::ByteArray(ByteArray::new(data)));
    Value::Compound(section)
}

pub fn tile_entity(id: &str, x: i32, y: i32, z: i32) -> Value {
    let mut entity = Compound::new();
    entity.insert("id".into(), Value::String(id.into()));
    entity.insert("x".into(), Value::Int(x));
    entity.insert("y".into(), Value::Int(y));
    entity.insert("z".into(), Value::Int(z));
    Value::Compound(entity)
}

/// Root compound for a chunk, wrapped in `Level` when the era needs it.
pub fn chunk_root(
    version: Option<i32>,
    x: i32,
    z: i32,
    sections: Vec<Value>,
    tile_entities: Vec<Value>,
) -> Value {
    let layout = FormatEra::from_data_version(version).layout();
    let mut body = Compound::new();
    body.insert("xPos".into(), Value::Int(x));
    body.insert("zPos".into(), Value::Int(z));
    body.insert(layout.sections_tag.into(), Value::List(sections));
    body.insert(layout.tile_entities_tag.into(), Value::List(tile_entities));

    let mut root = match layout.level_tag {
        Some(level) => {
            let mut root = Compound::new();
            root.insert(level.into(), Value::Compound(body));
            root
        }
        None => body,
    };
    if let Some(version) = version {
        root.insert("DataVersion".into(), Value::Int(version));
    }
    Value::Compound(root)
}

#[derive(Default)]
pub struct MemorySource {
    pub chunks: HashMap<(i32, i32), Value>,
}

impl ChunkSource for MemorySource {
    fn chunk_data(&self, chunk_x: i32, chunk_z: i32) -> Result<Option<Value>> {
        Ok(self.chunks.get(&(chunk_x, chunk_z)).cloned())
    }
}

/// Compresses and frames a chunk payload: `[length:4][type:1][data:N]`.
/// Types 1, 2 and 4 are gzip, zlib and LZ4; anything else is stored raw.
pub fn frame_chunk(root: &Value, compression: u8) -> Vec<u8> {
    let nbt = fastnbt::to_bytes(root).expect("chunk serializes");
    let compressed = match compression {
        1 => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&nbt).unwrap();
            encoder.finish().unwrap()
        }
        2 => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&nbt).unwrap();
            encoder.finish().unwrap()
        }
        4 => {
            let mut compressed = Vec::new();
            let mut encoder = Lz4BlockOutput::new(&mut compressed);
            encoder.write_all(&nbt).unwrap();
            encoder.flush().unwrap();
            drop(encoder);
            compressed
        }
        _ => nbt,
    };
    let mut framed = Vec::with_capacity(5 + compressed.len());
    framed.extend_from_slice(&((compressed.len() + 1) as u32).to_be_bytes());
    framed.push(compression);
    framed.extend_from_slice(&compressed);
    framed
}

/// Lays out framed chunks one after another behind an 8 KiB header.
pub fn build_region(chunks: &[((i32, i32), Vec<u8>)]) -> Vec<u8> {
    let mut region = vec![0u8; HEADER_SIZE];
    for ((x, z), framed) in chunks {
        let sector = (region.len() / SECTOR_SIZE) as u32;
        let sectors = framed.len().div_ceil(SECTOR_SIZE);
        let entry = chunk_index(*x, *z) * 4;
        region[entry] = ((sector >> 16) & 0xFF) as u8;
        region[entry + 1] = ((sector >> 8) & 0xFF) as u8;
        region[entry + 2] = (sector & 0xFF) as u8;
        region[entry + 3] = sectors as u8;
        // timestamp table
        region[4096 + entry..4096 + entry + 4].copy_from_slice(&1_700_000_000u32.to_be_bytes());

        region.extend_from_slice(framed);
        region.resize(region.len().div_ceil(SECTOR_SIZE) * SECTOR_SIZE, 0);
    }
    region
}
