use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use juliascope_core::TileKey;

/// Decoded pixel data for one tile.
///
/// `width`/`height` are the payload's own dimensions — a coarse-LOD tile
/// arrives at reduced resolution and is scaled up at draw time.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePixels {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub rgba: Vec<u8>,
}

/// A received tile. Never mutated after insertion; a re-delivery of the
/// same key replaces the entry wholesale.
#[derive(Debug, Clone)]
pub struct Tile {
    pub key: TileKey,
    pub pixels: TilePixels,
    pub received_at: Instant,
}

/// In-memory store of received tiles, keyed by grid position and LOD.
///
/// Backed by a `BTreeMap` so enumeration order is stable. The cache holds
/// pixel data only — it knows nothing about visibility or scheduling, and
/// it is cleared exactly when the fractal parameters change (never on
/// pan/zoom, which only changes which keys are looked up).
#[derive(Debug, Default)]
pub struct TileCache {
    entries: BTreeMap<TileKey, Tile>,
}

impl TileCache {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert a tile, replacing any previous entry for the same key.
    pub fn put(&mut self, tile: Tile) {
        self.entries.insert(tile.key, tile);
    }

    pub fn get(&self, key: &TileKey) -> Option<&Tile> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop every entry. Called on parameter changes, which invalidate all
    /// previously computed pixel content.
    pub fn clear(&mut self) {
        let n = self.entries.len();
        self.entries.clear();
        debug!(dropped = n, "Tile cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All tiles in compositing order: larger LOD numbers (coarser tiles)
    /// first, so later draws of finer tiles paint over the coarse
    /// placeholders. Within one LOD the order follows the key ordering,
    /// which is deterministic.
    pub fn ordered_by_lod(&self) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.entries.values().collect();
        tiles.sort_by(|a, b| {
            b.key
                .lod
                .cmp(&a.key.lod)
                .then_with(|| a.key.cmp(&b.key))
        });
        tiles
    }
}
