use crate::gl::{DrawMode, Drawable, TextureFilter};
use crate::renderer::bucket::LineBucket;
use crate::renderer::{PaintParameters, RenderTile};
use crate::shader::uniforms::{LineUniforms, columns};
use crate::style::{LinePaint, RenderPass};

use super::Painter;

impl Painter {
    pub fn render_line(
        &mut self,
        params: &PaintParameters<'_>,
        bucket: &LineBucket,
        paint: &LinePaint,
        tile: &RenderTile,
    ) {
        if self.pass == RenderPass::Opaque {
            return;
        }
        let Some((vertices, indices)) = bucket.geometry.buffers() else {
            return;
        };

        // x: atlas row, y: row height, z: tile units to pattern repeats,
        // w: 1 when dashed.
        let dash = match paint.dash {
            Some(dash) => {
                params.line_atlas.bind(&mut self.context, 0, TextureFilter::Linear);
                let repeat = self.state.pixels_to_tile_units(&tile.id, dash.width * paint.width);
                [dash.y, dash.height, 1.0 / repeat.max(f32::EPSILON), 1.0]
            }
            None => [0.0; 4],
        };

        let matrix = tile.translated_matrix(paint.translate, paint.translate_anchor, &self.state);
        let uniforms = LineUniforms {
            matrix: columns(&matrix),
            color: paint.color.to_array(),
            dash,
            extrude_scale: self.pixels_to_gl_units,
            half_width: paint.width / 2.0,
            gap_width: paint.gap_width,
            blur: paint.blur,
            offset: -paint.offset,
            opacity: paint.opacity,
            ratio: self.frame.pixel_ratio,
        };
        let drawable = Drawable::segmented(
            DrawMode::Triangles,
            self.depth_for_sublayer(0, false),
            self.stencil_for_tile(tile),
            self.color_for_render_pass(),
            params.programs.line,
            &uniforms,
            vertices,
            indices,
            &bucket.geometry.segments,
        );
        self.context.draw(&drawable);
    }
}
