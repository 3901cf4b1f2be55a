use std::time::Instant;

use bitflags::bitflags;

use crate::map::{ContextMode, MapMode};

bitflags! {
    /// Debug overlays and inspection modes.
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
    pub struct DebugOptions: u8 {
        const TILE_BORDERS = 1 << 0;
        const PARSE_STATUS = 1 << 1;
        const TIMESTAMPS = 1 << 2;
        const COLLISION = 1 << 3;
        /// Additive blending of flat white fragments. Debug builds only.
        const OVERDRAW = 1 << 4;
    }
}

/// Per-frame input of [`Painter::render`](super::Painter::render).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub framebuffer_size: [u32; 2],
    pub time_point: Instant,
    pub pixel_ratio: f32,
    pub map_mode: MapMode,
    pub context_mode: ContextMode,
    pub debug_options: DebugOptions,
}

impl FrameData {
    pub fn new(framebuffer_size: [u32; 2], time_point: Instant) -> Self {
        Self {
            framebuffer_size,
            time_point,
            pixel_ratio: 1.0,
            map_mode: MapMode::default(),
            context_mode: ContextMode::default(),
            debug_options: DebugOptions::empty(),
        }
    }
}
