//! Camera state of the map view.

mod mode;
mod transform;

pub use mode::{ContextMode, MapMode, ViewportMode};
pub use transform::{DEFAULT_ALTITUDE, MAX_ZOOM, TILE_SIZE, TransformState};
