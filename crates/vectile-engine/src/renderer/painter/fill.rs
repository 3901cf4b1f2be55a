use crate::gl::{DrawMode, Drawable, TextureFilter};
use crate::renderer::bucket::FillBucket;
use crate::renderer::{PaintParameters, RenderTile};
use crate::shader::uniforms::{FillOutlinePatternUniforms, FillPatternUniforms, FillUniforms, columns};
use crate::style::{FillPaint, RenderPass};

use super::Painter;

const OUTLINE_WIDTH: f32 = 2.0;

impl Painter {
    /// Draws the interior in the pass matching its opacity and the
    /// antialiasing outline in the translucent pass.
    pub fn render_fill(
        &mut self,
        params: &PaintParameters<'_>,
        bucket: &FillBucket,
        paint: &FillPaint,
        tile: &RenderTile,
    ) {
        let Some(buffers) = bucket.buffers() else {
            return;
        };

        let matrix = tile.translated_matrix(paint.translate, paint.translate_anchor, &self.state);
        let translucent = self.pass == RenderPass::Translucent;
        let outline_color = paint.outline_color.unwrap_or(paint.color);
        let uniforms = FillUniforms::new(
            &matrix,
            paint.opacity,
            paint.color,
            outline_color,
            self.frame.framebuffer_size,
        );
        let outline = DrawMode::Lines { line_width: OUTLINE_WIDTH };

        // An explicit outline is drawn below the fill.
        if paint.antialias && paint.pattern.is_none() && paint.outline_color.is_some() && translucent {
            let drawable = Drawable::segmented(
                outline,
                self.depth_for_sublayer(0, false),
                self.stencil_for_tile(tile),
                self.color_for_render_pass(),
                params.programs.fill_outline,
                &uniforms,
                &buffers.vertices,
                &buffers.lines,
                &bucket.line_segments,
            );
            self.context.draw(&drawable);
        }

        if let Some(pattern) = &paint.pattern {
            if !translucent {
                return;
            }
            let Some(position) = params.sprite_atlas.position(pattern) else {
                log::debug!("fill pattern `{pattern}` is not in the sprite atlas");
                return;
            };
            params.sprite_atlas.bind(&mut self.context, 0, TextureFilter::Linear);

            let uniforms = FillPatternUniforms {
                matrix: columns(&matrix),
                pattern_tl: position.tl,
                pattern_br: position.br,
                pattern_size: [
                    self.state.pixels_to_tile_units(&tile.id, position.size[0]),
                    self.state.pixels_to_tile_units(&tile.id, position.size[1]),
                ],
                opacity: paint.opacity,
                _pad: 0.0,
            };
            let drawable = Drawable::segmented(
                DrawMode::Triangles,
                self.depth_for_sublayer(0, false),
                self.stencil_for_tile(tile),
                self.color_for_render_pass(),
                params.programs.fill_pattern,
                &uniforms,
                &buffers.vertices,
                &buffers.triangles,
                &bucket.triangle_segments,
            );
            self.context.draw(&drawable);

            if paint.antialias && paint.outline_color.is_none() {
                let uniforms = FillOutlinePatternUniforms::new(&uniforms, self.frame.framebuffer_size);
                let drawable = Drawable::segmented(
                    outline,
                    self.depth_for_sublayer(2, false),
                    self.stencil_for_tile(tile),
                    self.color_for_render_pass(),
                    params.programs.fill_outline_pattern,
                    &uniforms,
                    &buffers.vertices,
                    &buffers.lines,
                    &bucket.line_segments,
                );
                self.context.draw(&drawable);
            }
            return;
        }

        let opaque = paint.color.a * paint.opacity >= 1.0;
        if opaque == (self.pass == RenderPass::Opaque) {
            let drawable = Drawable::segmented(
                DrawMode::Triangles,
                self.depth_for_sublayer(1, self.pass == RenderPass::Opaque),
                self.stencil_for_tile(tile),
                self.color_for_render_pass(),
                params.programs.fill,
                &uniforms,
                &buffers.vertices,
                &buffers.triangles,
                &bucket.triangle_segments,
            );
            self.context.draw(&drawable);
        }

        // Fringe antialiasing in the fill color, above the fill.
        if paint.antialias && paint.outline_color.is_none() && translucent {
            let drawable = Drawable::segmented(
                outline,
                self.depth_for_sublayer(2, false),
                self.stencil_for_tile(tile),
                self.color_for_render_pass(),
                params.programs.fill_outline,
                &uniforms,
                &buffers.vertices,
                &buffers.lines,
                &bucket.line_segments,
            );
            self.context.draw(&drawable);
        }
    }
}
