use std::f32::consts::PI;

use crate::gl::{DrawMode, Drawable, Stencil, TextureFilter, TextureMipMap};
use crate::renderer::bucket::RasterBucket;
use crate::renderer::{PaintParameters, RenderTile};
use crate::shader::uniforms::{RasterUniforms, columns};
use crate::style::{RasterPaint, RenderPass};

use super::Painter;

/// Maps a `[-1, 1]` saturation paint value to the shader's mix factor.
pub fn saturation_factor(saturation: f32) -> f32 {
    if saturation > 0.0 {
        1.0 - 1.0 / (1.001 - saturation)
    } else {
        -saturation
    }
}

/// Maps a `[-1, 1]` contrast paint value to the shader's scale factor.
pub fn contrast_factor(contrast: f32) -> f32 {
    if contrast > 0.0 {
        1.0 / (1.0 - contrast)
    } else {
        1.0 + contrast
    }
}

/// Weights rotating RGB around the gray axis by `hue_rotate` degrees.
pub fn spin_weights(hue_rotate: f32) -> [f32; 3] {
    let (s, c) = (hue_rotate * PI / 180.0).sin_cos();
    let sqrt3 = 3f32.sqrt();
    [
        (2.0 * c + 1.0) / 3.0,
        (-sqrt3 * s - c + 1.0) / 3.0,
        (sqrt3 * s - c + 1.0) / 3.0,
    ]
}

impl Painter {
    pub fn render_raster(
        &mut self,
        params: &PaintParameters<'_>,
        bucket: &RasterBucket,
        paint: &RasterPaint,
        tile: &RenderTile,
    ) {
        if self.pass == RenderPass::Opaque {
            return;
        }
        let mut slot = bucket.texture().borrow_mut();
        let Some(texture) = slot.as_mut() else {
            return;
        };

        // No parent image to cross-fade with; both units sample this tile.
        self.context.bind_texture(texture, 0, TextureFilter::Linear, TextureMipMap::No);
        self.context.bind_texture(texture, 1, TextureFilter::Linear, TextureMipMap::No);

        let [w0, w1, w2] = spin_weights(paint.hue_rotate);
        let uniforms = RasterUniforms {
            matrix: columns(&tile.matrix()),
            spin_weights: [w0, w1, w2, 0.0],
            opacity0: paint.opacity,
            opacity1: 0.0,
            brightness_low: paint.brightness_min,
            brightness_high: paint.brightness_max,
            saturation_factor: saturation_factor(paint.saturation),
            contrast_factor: contrast_factor(paint.contrast),
            buffer_scale: 1.0,
            _pad: 0.0,
        };
        let drawable = Drawable::unindexed(
            DrawMode::TriangleStrip,
            self.depth_for_sublayer(0, false),
            Stencil::disabled(),
            self.color_for_render_pass(),
            params.programs.raster,
            &uniforms,
            &self.raster_vertex_buffer,
        );
        self.context.draw(&drawable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_paint_values_leave_colors_alone() {
        assert_eq!(saturation_factor(0.0), 0.0);
        assert_eq!(contrast_factor(0.0), 1.0);
        let [a, b, c] = spin_weights(0.0);
        assert!((a - 1.0).abs() < 1e-6 && b.abs() < 1e-6 && c.abs() < 1e-6);
    }

    #[test]
    fn factors_grow_with_their_inputs() {
        assert!(saturation_factor(0.5) < 0.0);
        assert_eq!(saturation_factor(-0.5), 0.5);
        assert_eq!(contrast_factor(0.5), 2.0);
        assert_eq!(contrast_factor(-0.5), 0.5);
    }

    #[test]
    fn spin_weights_sum_to_one() {
        for degrees in [0.0, 45.0, 120.0, 270.0] {
            let sum: f32 = spin_weights(degrees).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "{degrees}: {sum}");
        }
    }
}
