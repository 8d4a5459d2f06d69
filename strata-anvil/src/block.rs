//! Block identities.
//!
//! A voxel is either a pre-flattening numeric block (`id` + 4-bit `data`)
//! or a namespaced block state. Numeric blocks convert to namespaced ones
//! through a fixed table embedded from `data/legacy_blocks.json`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use fastnbt::Value;

use crate::error::{Error, Result};
use crate::nbt::{self, Compound};

const DEFAULT_NAMESPACE: &str = "minecraft";

// "id:data" -> [namespaced id, properties or null]
type LegacyTable = HashMap<String, (String, Option<BTreeMap<String, String>>)>;

static LEGACY_TABLE: LazyLock<std::result::Result<LegacyTable, String>> =
    LazyLock::new(|| parse_legacy_table(include_str!("../data/legacy_blocks.json")));

fn parse_legacy_table(json: &str) -> std::result::Result<LegacyTable, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

fn legacy_table() -> Result<&'static LegacyTable> {
    LEGACY_TABLE
        .as_ref()
        .map_err(|e| Error::LegacyTable(e.clone()))
}

/// A namespaced block state, e.g. `minecraft:oak_log[axis=x]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModernBlock {
    name: String,
    properties: BTreeMap<String, String>,
}

impl ModernBlock {
    /// Builds a block from an id, adding the `minecraft` namespace if none is given.
    pub fn from_name(name: &str) -> Self {
        Self::with_properties(name, BTreeMap::new())
    }

    pub fn with_properties(name: &str, properties: BTreeMap<String, String>) -> Self {
        let name = if name.contains(':') {
            name.to_string()
        } else {
            format!("{DEFAULT_NAMESPACE}:{name}")
        };
        Self { name, properties }
    }

    pub fn air() -> Self {
        Self::from_name("minecraft:air")
    }

    /// Decodes one palette entry: a compound with `Name` and optional `Properties`.
    pub fn from_palette(entry: &Value) -> Result<Self> {
        let entry = nbt::expect_compound(entry, "palette entry")?;
        let name = nbt::get_string(entry, "Name")?
            .ok_or_else(|| Error::MissingTag("Name".to_string()))?;
        let properties = match nbt::get_compound(entry, "Properties")? {
            Some(props) => properties_from(props)?,
            None => BTreeMap::new(),
        };
        Ok(Self::with_properties(name, properties))
    }

    /// Full namespaced id, e.g. `minecraft:stone`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        self.name.split_once(':').map_or(DEFAULT_NAMESPACE, |(ns, _)| ns)
    }

    /// Id without the namespace.
    pub fn id(&self) -> &str {
        self.name.split_once(':').map_or(self.name.as_str(), |(_, id)| id)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_air(&self) -> bool {
        matches!(
            self.name.as_str(),
            "minecraft:air" | "minecraft:cave_air" | "minecraft:void_air"
        )
    }
}

fn properties_from(props: &Compound) -> Result<BTreeMap<String, String>> {
    props
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key.clone(), s.clone())),
            _ => Err(Error::UnexpectedTag {
                tag: format!("Properties.{key}"),
                expected: "string",
            }),
        })
        .collect()
}

impl fmt::Display for ModernBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            let props: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "[{}]", props.join(","))?;
        }
        Ok(())
    }
}

/// A pre-flattening block: 12-bit numeric id plus a 4-bit data value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LegacyBlock {
    id: u16,
    data: u8,
}

impl LegacyBlock {
    pub const AIR: LegacyBlock = LegacyBlock { id: 0, data: 0 };

    pub fn new(id: u16, data: u8) -> Self {
        Self { id, data: data & 0x0F }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn data(&self) -> u8 {
        self.data
    }

    /// Looks up the namespaced equivalent. Data values missing from the
    /// table fall back to the id's base variant (data 0).
    pub fn to_modern(&self) -> Result<ModernBlock> {
        if self.id == 0 {
            return Ok(ModernBlock::air());
        }
        let table = legacy_table()?;
        let entry = table
            .get(&format!("{}:{}", self.id, self.data))
            .or_else(|| table.get(&format!("{}:0", self.id)))
            .ok_or(Error::UnknownLegacyBlock {
                id: self.id,
                data: self.data,
            })?;
        let (name, properties) = entry;
        Ok(ModernBlock::with_properties(
            name,
            properties.clone().unwrap_or_default(),
        ))
    }
}

impl fmt::Display for LegacyBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.data)
    }
}

/// The occupant of one voxel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Block {
    Legacy(LegacyBlock),
    Modern(ModernBlock),
}

impl Block {
    pub fn is_air(&self) -> bool {
        match self {
            Block::Legacy(block) => block.id == 0,
            Block::Modern(block) => block.is_air(),
        }
    }

    /// Namespaced form of this block, converting legacy blocks through the table.
    pub fn into_modern(self) -> Result<ModernBlock> {
        match self {
            Block::Legacy(block) => block.to_modern(),
            Block::Modern(block) => Ok(block),
        }
    }

    pub fn to_modern(&self) -> Result<ModernBlock> {
        self.clone().into_modern()
    }

    pub fn as_modern(&self) -> Option<&ModernBlock> {
        match self {
            Block::Legacy(_) => None,
            Block::Modern(block) => Some(block),
        }
    }
}

impl From<LegacyBlock> for Block {
    fn from(block: LegacyBlock) -> Self {
        Block::Legacy(block)
    }
}

impl From<ModernBlock> for Block {
    fn from(block: ModernBlock) -> Self {
        Block::Modern(block)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Legacy(block) => block.fmt(f),
            Block::Modern(block) => block.fmt(f),
        }
    }
}
