use std::time::Duration;

use crate::gl::TEXTURE_POOL_SIZE;

/// Tunables of the frame painter.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Texture names requested per pool refill.
    pub texture_pool_size: usize,
    /// Cross-fade duration of symbols and raster tiles in continuous mode.
    pub fade_duration: Duration,
    /// Depth slots reserved inside each layer's range.
    pub sublayers: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            texture_pool_size: TEXTURE_POOL_SIZE,
            fade_duration: Duration::from_millis(300),
            sublayers: 3,
        }
    }
}
