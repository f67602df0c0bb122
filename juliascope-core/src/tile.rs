use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::viewport::Viewport;

/// Default tile edge length in screen pixels.
pub const TILE_SIZE: u32 = 128;

/// Identifies a fixed-size square region of the plane at one detail tier.
///
/// `x` and `y` are grid indices in "world pixels": the plane scaled by the
/// current zoom, with imaginary-axis-up flipped to screen-y-down. Tile
/// `(x, y)` covers world pixels `[x·T, (x+1)·T) × [y·T, (y+1)·T)` for tile
/// size `T`. `lod` is the detail tier — lower is finer, 1 is full detail.
///
/// The grid is anchored at the plane origin, not the viewport, so pure
/// panning leaves every key valid; only which keys are visible changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub x: i64,
    pub y: i64,
    pub lod: u32,
}

impl TileKey {
    pub fn new(x: i64, y: i64, lod: u32) -> Self {
        Self { x, y, lod }
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) @lod{}", self.x, self.y, self.lod)
    }
}

/// Compute the covering grid of tiles for a viewport at one detail tier.
///
/// Returns the minimal set of keys whose union covers the canvas, plus a
/// one-tile margin on every edge so sub-tile panning never exposes an
/// unrequested seam. Row-major order, deterministic.
pub fn visible_tiles(viewport: &Viewport, tile_size: u32, lod: u32) -> Vec<TileKey> {
    let t = tile_size as f64;

    // Canvas edges in world pixels.
    let left = viewport.center.re * viewport.zoom - viewport.width as f64 / 2.0;
    let top = -viewport.center.im * viewport.zoom - viewport.height as f64 / 2.0;
    let right = left + viewport.width as f64;
    let bottom = top + viewport.height as f64;

    // floor−1 / ceil land exactly one tile beyond the covered range on
    // each edge, whether or not the edge sits on a tile boundary.
    let x0 = (left / t).floor() as i64 - 1;
    let x1 = (right / t).ceil() as i64;
    let y0 = (top / t).floor() as i64 - 1;
    let y1 = (bottom / t).ceil() as i64;

    let mut keys = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            keys.push(TileKey::new(x, y, lod));
        }
    }
    keys
}

/// Convert an accumulated drag offset into whole-tile crossings.
///
/// Returns `(tiles_x, tiles_y, remainder_x, remainder_y)`: how many whole
/// tiles the offset spans (truncating division, so partial tiles in either
/// direction count as zero) and the sub-tile remainder to retain as the
/// live pan offset. The remainder keeps the offset's sign and is strictly
/// smaller than one tile in magnitude.
pub fn crossed_tiles(offset_x: f64, offset_y: f64, tile_size: u32) -> (i64, i64, f64, f64) {
    let t = tile_size as f64;
    let tx = (offset_x / t).trunc() as i64;
    let ty = (offset_y / t).trunc() as i64;
    (tx, ty, offset_x - tx as f64 * t, offset_y - ty as f64 * t)
}

/// The plane point at a tile's top-left corner.
///
/// The compositor maps this through the viewport transform to place the
/// tile on screen.
pub fn tile_plane_origin(key: &TileKey, zoom: f64, tile_size: u32) -> Complex {
    let t = tile_size as f64;
    Complex::new(key.x as f64 * t / zoom, -(key.y as f64) * t / zoom)
}
