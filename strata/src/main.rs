use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;

use strata_anvil::{Block, Chunk, ChunkSource, Region, RegionDir};

#[derive(Parser)]
#[command(name = "strata", about = "Inspect blocks, palettes and tile entities in Anvil chunks")]
pub struct Args {
    /// World region directory containing r.<x>.<z>.mca files
    #[arg(short, long, env = "STRATA_WORLD", conflicts_with = "region")]
    pub world: Option<PathBuf>,

    /// A single region file
    #[arg(short, long, env = "STRATA_REGION")]
    pub region: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the block at chunk-local x, z and absolute y
    Block {
        #[arg(allow_negative_numbers = true)]
        chunk_x: i32,
        #[arg(allow_negative_numbers = true)]
        chunk_z: i32,
        x: i32,
        y: i32,
        z: i32,
        /// Convert pre-flattening blocks to namespaced ids
        #[arg(long)]
        modern: bool,
    },
    /// Print the palette of one section
    Palette {
        #[arg(allow_negative_numbers = true)]
        chunk_x: i32,
        #[arg(allow_negative_numbers = true)]
        chunk_z: i32,
        section: i32,
    },
    /// Count blocks by id over a section or the whole chunk
    Histogram {
        #[arg(allow_negative_numbers = true)]
        chunk_x: i32,
        #[arg(allow_negative_numbers = true)]
        chunk_z: i32,
        #[arg(long)]
        section: Option<i32>,
    },
    /// Print the tile entity at world coordinates
    TileEntity {
        #[arg(allow_negative_numbers = true)]
        chunk_x: i32,
        #[arg(allow_negative_numbers = true)]
        chunk_z: i32,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        #[arg(allow_negative_numbers = true)]
        z: i32,
    },
}

fn open_source(args: &Args) -> Result<Box<dyn ChunkSource>> {
    match (&args.world, &args.region) {
        (Some(world), _) => {
            info!("Reading chunks from world {:?}", world);
            Ok(Box::new(RegionDir::new(world)))
        }
        (None, Some(region)) => {
            info!("Reading chunks from region {:?}", region);
            let region = Region::from_file(region)
                .with_context(|| format!("Failed to read region file {}", region.display()))?;
            Ok(Box::new(region))
        }
        (None, None) => bail!("either --world or --region is required"),
    }
}

fn load_chunk(source: &dyn ChunkSource, chunk_x: i32, chunk_z: i32) -> Result<Chunk> {
    Chunk::from_region(source, chunk_x, chunk_z)
        .with_context(|| format!("Failed to load chunk ({chunk_x}, {chunk_z})"))
}

fn histogram_key(block: Block) -> String {
    match block {
        Block::Modern(block) => block.name().to_string(),
        // unknown legacy ids still get counted
        Block::Legacy(legacy) => match legacy.to_modern() {
            Ok(block) => block.name().to_string(),
            Err(_) => legacy.to_string(),
        },
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let source = open_source(&args)?;

    match args.command {
        Command::Block {
            chunk_x,
            chunk_z,
            x,
            y,
            z,
            modern,
        } => {
            let chunk = load_chunk(source.as_ref(), chunk_x, chunk_z)?;
            let block = chunk
                .get_block(x, y, z)
                .with_context(|| format!("Failed to read block ({x}, {y}, {z})"))?;
            if modern {
                println!("{}", block.into_modern()?);
            } else {
                println!("{block}");
            }
        }
        Command::Palette {
            chunk_x,
            chunk_z,
            section,
        } => {
            let chunk = load_chunk(source.as_ref(), chunk_x, chunk_z)?;
            match chunk.get_palette(section)? {
                Some(palette) => {
                    for (index, entry) in palette.iter().enumerate() {
                        println!("{index:>4}  {entry}");
                    }
                }
                None => println!("section {section} has no palette"),
            }
        }
        Command::Histogram {
            chunk_x,
            chunk_z,
            section,
        } => {
            let chunk = load_chunk(source.as_ref(), chunk_x, chunk_z)?;
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            match section {
                Some(section) => {
                    for block in chunk.stream_blocks(section)? {
                        *counts.entry(histogram_key(block?)).or_default() += 1;
                    }
                }
                None => {
                    for block in chunk.stream_chunk() {
                        *counts.entry(histogram_key(block?)).or_default() += 1;
                    }
                }
            }
            let mut counts: Vec<_> = counts.into_iter().collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            for (name, count) in counts {
                println!("{count:>6}  {name}");
            }
        }
        Command::TileEntity {
            chunk_x,
            chunk_z,
            x,
            y,
            z,
        } => {
            let chunk = load_chunk(source.as_ref(), chunk_x, chunk_z)?;
            match chunk.get_tile_entity(x, y, z) {
                Some(entity) => println!("{entity:#?}"),
                None => println!("no tile entity at ({x}, {y}, {z})"),
            }
        }
    }

    Ok(())
}
