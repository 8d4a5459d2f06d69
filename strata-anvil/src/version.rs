//! Chunk format eras.
//!
//! Every layout difference between chunk format revisions is keyed by the
//! chunk's `DataVersion`. The era is resolved once per chunk and carries
//! the tag names and packing policy the decoder needs.
//!
//! Data versions: https://minecraft.wiki/w/Data_version

/// Format revision, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatEra {
    /// Numeric block ids with 4-bit data values (before 17w47a).
    PreFlattening,
    /// Namespaced palettes, indices may stretch across words (17w47a).
    Flattening,
    /// Indices no longer straddle words (20w17a).
    StretchRemoval,
    /// `BlockStates` moved to `block_states.data` (21w39a).
    TagRename,
    /// `Level` wrapper removed, tags lowercased (21w43a).
    LevelUnwrap,
}

/// Minimum data version for each era after the oldest, ascending.
const ERA_TABLE: &[(i32, FormatEra)] = &[
    (1451, FormatEra::Flattening),
    (2529, FormatEra::StretchRemoval),
    (2836, FormatEra::TagRename),
    (2844, FormatEra::LevelUnwrap),
];

impl FormatEra {
    /// Picks the newest era whose threshold is `<= version`.
    /// A missing version predates data versions entirely.
    pub fn from_data_version(version: Option<i32>) -> Self {
        let Some(version) = version else {
            return FormatEra::PreFlattening;
        };
        ERA_TABLE
            .iter()
            .rev()
            .find(|(min, _)| version >= *min)
            .map(|(_, era)| *era)
            .unwrap_or(FormatEra::PreFlattening)
    }

    pub fn layout(self) -> Layout {
        let unwrapped = self >= FormatEra::LevelUnwrap;
        let renamed = self >= FormatEra::TagRename;
        Layout {
            level_tag: if unwrapped { None } else { Some("Level") },
            sections_tag: if unwrapped { "sections" } else { "Sections" },
            tile_entities_tag: if unwrapped { "block_entities" } else { "TileEntities" },
            block_states_parent: if renamed { Some("block_states") } else { None },
            palette_tag: if unwrapped { "palette" } else { "Palette" },
            block_states_tag: if renamed { "data" } else { "BlockStates" },
            stretches: self < FormatEra::StretchRemoval,
            legacy: self == FormatEra::PreFlattening,
        }
    }
}

/// Where an era keeps things inside the chunk tag tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Child compound holding the chunk body, or `None` when the root is the body.
    pub level_tag: Option<&'static str>,
    pub sections_tag: &'static str,
    pub tile_entities_tag: &'static str,
    /// Per-section compound holding both palette and bit array, if nested.
    pub block_states_parent: Option<&'static str>,
    pub palette_tag: &'static str,
    pub block_states_tag: &'static str,
    /// Palette indices may span two adjacent words.
    pub stretches: bool,
    /// Sections store `Blocks`/`Add`/`Data` arrays instead of palettes.
    pub legacy: bool,
}
