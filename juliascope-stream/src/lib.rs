pub mod backoff;
pub mod cache;
pub mod connection;
pub mod debounce;
pub mod decode;
pub mod error;
pub mod protocol;
pub mod scheduler;

// Re-export primary types for convenience.
pub use backoff::Backoff;
pub use cache::{Tile, TileCache, TilePixels};
pub use connection::{spawn, ConnEvent, ConnState, ConnectionHandle};
pub use debounce::{Debounce, Delayed};
pub use decode::{decode_raw_frame, decode_tile_image};
pub use error::StreamError;
pub use protocol::{ServerMessage, TileRequest, WireParams, WireViewport};
pub use scheduler::{RequestScheduler, COARSE_LOD, FAST_SETTLE, FINE_DELAY, SLOW_SETTLE};

/// Convenience result type for the stream crate.
pub type Result<T> = std::result::Result<T, StreamError>;
