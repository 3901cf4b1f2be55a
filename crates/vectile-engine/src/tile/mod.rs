//! Tile addressing and visible-tile computation.

mod cover;
mod id;

pub use cover::tile_cover;
pub use id::{CanonicalTileId, EXTENT, UnwrappedTileId};
