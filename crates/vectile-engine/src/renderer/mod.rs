//! Frame painter and the per-tile data it draws.

pub mod bucket;
mod config;
mod frame_data;
mod frame_history;
mod paint_parameters;
mod painter;
mod render_tile;

pub use bucket::Bucket;
pub use config::RendererConfig;
pub use frame_data::{DebugOptions, FrameData};
pub use frame_history::FrameHistory;
pub use paint_parameters::PaintParameters;
pub use painter::{DEPTH_EPSILON, Painter, contrast_factor, saturation_factor, spin_weights};
pub use render_tile::RenderTile;
