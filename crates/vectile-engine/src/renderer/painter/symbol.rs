use crate::gl::{DrawMode, Drawable, TextureFilter};
use crate::paint::Color;
use crate::renderer::bucket::{Geometry, SymbolBucket};
use crate::renderer::{PaintParameters, RenderTile};
use crate::shader::uniforms::{SymbolUniforms, columns};
use crate::shader::vertex::SymbolVertex;
use crate::style::{Atlas, RenderPass, SymbolPaint};

use super::Painter;

/// Pixel size glyphs are rasterized at in the glyph atlas.
const GLYPH_SIZE: f32 = 24.0;
/// Half-width of the distance-field edge at a scale of one.
const SDF_GAMMA: f32 = 0.105;

const ATLAS_UNIT: u8 = 0;
const FADE_UNIT: u8 = 1;

struct SymbolDraw<'a> {
    geometry: &'a Geometry<SymbolVertex>,
    atlas: &'a dyn Atlas,
    color: Color,
    opacity: f32,
    size_scale: f32,
    sdf: bool,
}

impl Painter {
    /// Draws icons first, then text on top.
    pub fn render_symbol(
        &mut self,
        params: &PaintParameters<'_>,
        bucket: &SymbolBucket,
        paint: &SymbolPaint,
        tile: &RenderTile,
    ) {
        if self.pass == RenderPass::Opaque {
            return;
        }

        self.frame_history.bind(&mut self.context, FADE_UNIT);
        let matrix = tile.translated_matrix(paint.translate, paint.translate_anchor, &self.state);

        let icons = SymbolDraw {
            geometry: &bucket.icons,
            atlas: params.sprite_atlas,
            color: if bucket.sdf_icons { paint.icon_color } else { Color::white() },
            opacity: paint.icon_opacity,
            size_scale: paint.icon_size,
            sdf: bucket.sdf_icons,
        };
        let text = SymbolDraw {
            geometry: &bucket.text,
            atlas: params.glyph_atlas,
            color: paint.text_color,
            opacity: paint.text_opacity,
            size_scale: paint.text_size / GLYPH_SIZE,
            sdf: true,
        };

        for draw in [icons, text] {
            if draw.opacity <= 0.0 {
                continue;
            }
            let Some((vertices, indices)) = draw.geometry.buffers() else {
                continue;
            };

            draw.atlas.bind(&mut self.context, ATLAS_UNIT, TextureFilter::Linear);
            let [width, height] = draw.atlas.size();
            let uniforms = SymbolUniforms {
                matrix: columns(&matrix),
                color: draw.color.to_array(),
                extrude_scale: self.pixels_to_gl_units,
                texsize: [width as f32, height as f32],
                size_scale: draw.size_scale,
                opacity: draw.opacity,
                sdf: if draw.sdf { 1.0 } else { 0.0 },
                gamma: SDF_GAMMA / (draw.size_scale * self.frame.pixel_ratio).max(f32::EPSILON),
            };
            let drawable = Drawable::segmented(
                DrawMode::Triangles,
                self.depth_for_sublayer(0, false),
                self.stencil_for_tile(tile),
                self.color_for_render_pass(),
                params.programs.symbol,
                &uniforms,
                vertices,
                indices,
                &draw.geometry.segments,
            );
            self.context.draw(&drawable);
        }
    }
}
