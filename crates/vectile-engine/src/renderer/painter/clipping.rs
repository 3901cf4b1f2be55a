use crate::algorithm::ClipId;
use crate::gl::{ColorMode, Depth, DrawMode, Drawable, Stencil, StencilOpKind, StencilTest};
use crate::paint::Color;
use crate::shader::uniforms::FillUniforms;
use crate::tile::UnwrappedTileId;

use super::Painter;

impl Painter {
    /// Writes `clip` into the stencil buffer over the footprint of `id`.
    pub fn render_clipping_mask(&mut self, id: &UnwrappedTileId, clip: ClipId) {
        let uniforms = FillUniforms::new(
            &self.matrix_for_tile(id),
            0.0,
            Color::transparent(),
            Color::transparent(),
            self.frame.framebuffer_size,
        );
        let stencil = Stencil {
            test: StencilTest::Always,
            reference: i32::from(clip.reference),
            mask: 0b1111_1111,
            fail: StencilOpKind::Keep,
            depth_fail: StencilOpKind::Keep,
            pass: StencilOpKind::Replace,
        };
        let drawable = Drawable::unindexed(
            DrawMode::Triangles,
            Depth::disabled(),
            stencil,
            ColorMode::disabled(),
            self.shaders.fill.id(),
            &uniforms,
            &self.tile_triangle_vertex_buffer,
        );
        self.context.draw(&drawable);
    }
}
