//! Saving and restoring a grid's walkability layout.
//!
//! Map files are zlib-compressed bincode [`MapData`]. Only the layout is stored; search
//! state never leaves the grid.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use fixedbitset::FixedBitSet;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use bincode::Options;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::game::error::NavError;
use crate::game::grid::{Grid, GridPos, MAX_GRID_CELLS};
use crate::game::math::FixedNum;

pub const MAP_VERSION: u32 = 1;

/// Decoded size cap: the largest grid's bitmap plus the header, with headroom.
const MAX_MAP_BYTES: u64 = (MAX_GRID_CELLS as u64 / 8) + 4096;

/// On-disk blocked bitmap: the cell count, then one bit per cell packed into bytes,
/// lowest bit first.
mod bitmap {
    use fixedbitset::FixedBitSet;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::game::grid::MAX_GRID_CELLS;

    pub fn serialize<S: Serializer>(bits: &FixedBitSet, serializer: S) -> Result<S::Ok, S::Error> {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for idx in bits.ones() {
            bytes[idx / 8] |= 1 << (idx % 8);
        }
        (bits.len() as u64, bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FixedBitSet, D::Error> {
        let (len, bytes) = <(u64, Vec<u8>)>::deserialize(deserializer)?;
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= MAX_GRID_CELLS)
            .ok_or_else(|| D::Error::custom(format!("bitmap of {len} cells is too large")))?;
        if bytes.len() != len.div_ceil(8) {
            return Err(D::Error::invalid_length(bytes.len(), &"one bit per cell"));
        }

        let mut bits = FixedBitSet::with_capacity(len);
        for idx in 0..len {
            if bytes[idx / 8] & (1 << (idx % 8)) != 0 {
                bits.insert(idx);
            }
        }
        Ok(bits)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapData {
    pub version: u32,
    pub width: usize,
    pub height: usize,
    pub cell_size: FixedNum,
    /// Bit `y * width + x` is set when that cell is blocked.
    #[serde(with = "bitmap")]
    pub blocked: FixedBitSet,
}

impl MapData {
    pub fn from_grid(grid: &Grid) -> Self {
        let mut blocked = FixedBitSet::with_capacity(grid.len());
        for node in grid.nodes().filter(|n| !n.is_walkable()) {
            blocked.insert(grid.get_index(node.pos()));
        }
        Self {
            version: MAP_VERSION,
            width: grid.width(),
            height: grid.height(),
            cell_size: grid.cell_size(),
            blocked,
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.count_ones(..)
    }

    /// Rebuild the grid. Fails on a version mismatch, dimensions larger than
    /// [`MAX_GRID_CELLS`], or a bitmap that doesn't match the stored dimensions.
    pub fn to_grid(&self) -> Result<Grid, NavError> {
        if self.version != MAP_VERSION {
            return Err(NavError::UnsupportedMapVersion {
                found: self.version,
                expected: MAP_VERSION,
            });
        }

        let cells = self
            .width
            .checked_mul(self.height)
            .filter(|&cells| cells <= MAX_GRID_CELLS)
            .ok_or(NavError::InvalidDimensions {
                width: self.width,
                height: self.height,
                cell_size: self.cell_size,
            })?;
        if self.blocked.len() != cells {
            return Err(NavError::CorruptMap {
                found: self.blocked.len(),
                expected: cells,
            });
        }

        let mut grid = Grid::new(self.width, self.height, self.cell_size)?;

        for idx in self.blocked.ones() {
            let pos = GridPos::new(idx % self.width, idx / self.width);
            grid.set_walkable(pos, false)?;
        }
        Ok(grid)
    }
}

pub fn save_map(path: impl AsRef<Path>, map_data: &MapData) -> Result<(), NavError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(&mut encoder, map_data)?;
    encoder.finish()?.flush()?;
    Ok(())
}

pub fn load_map(path: impl AsRef<Path>) -> Result<MapData, NavError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut bytes = Vec::new();
    ZlibDecoder::new(reader)
        .take(MAX_MAP_BYTES)
        .read_to_end(&mut bytes)?;
    // same layout as `bincode::serialize_into`, with a hard size limit
    let map_data: MapData = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(MAX_MAP_BYTES)
        .deserialize(&bytes)?;
    Ok(map_data)
}

/// Save `grid`'s layout to `path`.
pub fn save_grid(path: impl AsRef<Path>, grid: &Grid) -> Result<(), NavError> {
    save_map(path, &MapData::from_grid(grid))
}

/// Load a grid saved with [`save_grid`].
pub fn load_grid(path: impl AsRef<Path>) -> Result<Grid, NavError> {
    load_map(path)?.to_grid()
}
