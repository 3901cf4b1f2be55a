//! Vectile engine crate.
//!
//! GPU-resource-aware rendering of styled vector and raster map tiles: a
//! state-caching graphics context, the frame painter and the stencil clip
//! allocator, plus the window/device runtime that hosts them.

pub mod algorithm;
pub mod core;
pub mod device;
pub mod gl;
pub mod logging;
pub mod map;
pub mod paint;
pub mod renderer;
pub mod shader;
pub mod style;
pub mod tile;
pub mod window;
