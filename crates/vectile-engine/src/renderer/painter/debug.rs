use crate::gl::{ColorMode, Depth, DrawMode, Drawable};
use crate::paint::Color;
use crate::renderer::{DebugOptions, RenderTile};
use crate::shader::uniforms::FillUniforms;

use super::Painter;

impl Painter {
    /// Outlines `tile` when tile borders are being debugged.
    pub fn render_tile_debug(&mut self, tile: &RenderTile) {
        if !self.frame.debug_options.contains(DebugOptions::TILE_BORDERS) {
            return;
        }

        let red = Color::from_rgba_u8(255, 0, 0, 255);
        let uniforms = FillUniforms::new(&tile.matrix(), 1.0, red, red, self.frame.framebuffer_size);
        let drawable = Drawable::unindexed(
            DrawMode::LineStrip { line_width: 4.0 * self.frame.pixel_ratio },
            Depth::disabled(),
            self.stencil_for_clipping(tile.clip()),
            ColorMode::unblended(),
            self.shaders.fill.id(),
            &uniforms,
            &self.tile_line_strip_vertex_buffer,
        );
        self.context.draw(&drawable);
    }
}
