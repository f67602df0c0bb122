pub mod complex;
pub mod error;
pub mod params;
pub mod tile;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use params::FractalParams;
pub use tile::{crossed_tiles, tile_plane_origin, visible_tiles, TileKey, TILE_SIZE};
pub use viewport::{Viewport, MIN_ZOOM};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
