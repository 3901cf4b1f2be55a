//! winit event loop and window ownership.
//!
//! Each window is paired with its [`Gpu`](crate::device::Gpu). Frames are
//! drawn only when something asked for a redraw; there is no continuous
//! render loop.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
