use crate::gl::{DrawMode, Drawable, Stencil, TextureFilter};
use crate::renderer::PaintParameters;
use crate::shader::uniforms::{FillPatternUniforms, FillUniforms, columns};
use crate::style::BackgroundPaint;
use crate::tile::tile_cover;

use super::Painter;

impl Painter {
    /// Covers the view with one quad per visible tile.
    pub(super) fn render_background(&mut self, params: &PaintParameters<'_>, paint: &BackgroundPaint) {
        let tiles = tile_cover(&self.state, self.state.integer_zoom());

        let Some(pattern) = &paint.pattern else {
            for id in tiles {
                let uniforms = FillUniforms::new(
                    &self.matrix_for_tile(&id),
                    paint.opacity,
                    paint.color,
                    paint.color,
                    self.frame.framebuffer_size,
                );
                let drawable = Drawable::unindexed(
                    DrawMode::Triangles,
                    self.depth_for_sublayer(0, false),
                    Stencil::disabled(),
                    self.color_for_render_pass(),
                    params.programs.fill,
                    &uniforms,
                    &self.tile_triangle_vertex_buffer,
                );
                self.context.draw(&drawable);
            }
            return;
        };

        let Some(position) = params.sprite_atlas.position(pattern) else {
            log::debug!("background pattern `{pattern}` is not in the sprite atlas");
            return;
        };
        params.sprite_atlas.bind(&mut self.context, 0, TextureFilter::Linear);

        for id in tiles {
            let uniforms = FillPatternUniforms {
                matrix: columns(&self.matrix_for_tile(&id)),
                pattern_tl: position.tl,
                pattern_br: position.br,
                pattern_size: [
                    self.state.pixels_to_tile_units(&id, position.size[0]),
                    self.state.pixels_to_tile_units(&id, position.size[1]),
                ],
                opacity: paint.opacity,
                _pad: 0.0,
            };
            let drawable = Drawable::unindexed(
                DrawMode::Triangles,
                self.depth_for_sublayer(0, false),
                Stencil::disabled(),
                self.color_for_render_pass(),
                params.programs.fill_pattern,
                &uniforms,
                &self.tile_triangle_vertex_buffer,
            );
            self.context.draw(&drawable);
        }
    }
}
