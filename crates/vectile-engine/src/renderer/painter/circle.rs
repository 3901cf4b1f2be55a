use crate::gl::{DrawMode, Drawable};
use crate::renderer::bucket::CircleBucket;
use crate::renderer::{PaintParameters, RenderTile};
use crate::shader::uniforms::{CircleUniforms, columns};
use crate::style::{CirclePaint, CirclePitchScale, RenderPass};

use super::Painter;

impl Painter {
    pub fn render_circle(
        &mut self,
        params: &PaintParameters<'_>,
        bucket: &CircleBucket,
        paint: &CirclePaint,
        tile: &RenderTile,
    ) {
        if self.pass == RenderPass::Opaque {
            return;
        }
        let Some((vertices, indices)) = bucket.geometry.buffers() else {
            return;
        };

        let scale_with_map = paint.pitch_scale == CirclePitchScale::Map;
        let extrude_scale = if scale_with_map {
            let altitude = self.state.altitude() as f32;
            self.pixels_to_gl_units.map(|v| v * altitude)
        } else {
            self.pixels_to_gl_units
        };

        let matrix = tile.translated_matrix(paint.translate, paint.translate_anchor, &self.state);
        let uniforms = CircleUniforms {
            matrix: columns(&matrix),
            color: paint.color.to_array(),
            extrude_scale,
            radius: paint.radius,
            blur: paint.blur,
            opacity: paint.opacity,
            scale_with_map: if scale_with_map { 1.0 } else { 0.0 },
            device_pixel_ratio: self.frame.pixel_ratio,
            _pad: 0.0,
        };
        let drawable = Drawable::segmented(
            DrawMode::Triangles,
            self.depth_for_sublayer(0, false),
            self.stencil_for_tile(tile),
            self.color_for_render_pass(),
            params.programs.circle,
            &uniforms,
            vertices,
            indices,
            &bucket.geometry.segments,
        );
        self.context.draw(&drawable);
    }
}
