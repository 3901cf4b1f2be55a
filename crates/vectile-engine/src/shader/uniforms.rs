//! Uniform blocks, one per program.
//!
//! Layouts follow WGSL uniform rules: every block is a whole number of
//! 16-byte columns and vec2 members sit on 8-byte boundaries.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::paint::Color;

pub type MatrixColumns = [[f32; 4]; 4];

pub fn columns(matrix: &Mat4) -> MatrixColumns {
    matrix.to_cols_array_2d()
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FillUniforms {
    pub matrix: MatrixColumns,
    pub color: [f32; 4],
    pub outline_color: [f32; 4],
    /// Framebuffer size in pixels.
    pub world: [f32; 2],
    pub opacity: f32,
    pub _pad: f32,
}

impl FillUniforms {
    pub fn new(matrix: &Mat4, opacity: f32, color: Color, outline_color: Color, world: [u32; 2]) -> Self {
        Self {
            matrix: columns(matrix),
            color: color.to_array(),
            outline_color: outline_color.to_array(),
            world: [world[0] as f32, world[1] as f32],
            opacity,
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FillPatternUniforms {
    pub matrix: MatrixColumns,
    /// Normalized atlas corners of the pattern image.
    pub pattern_tl: [f32; 2],
    pub pattern_br: [f32; 2],
    /// Size of one pattern repetition in tile units.
    pub pattern_size: [f32; 2],
    pub opacity: f32,
    pub _pad: f32,
}

/// Pattern sampling plus the framebuffer size the fringe is measured in.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FillOutlinePatternUniforms {
    pub matrix: MatrixColumns,
    pub pattern_tl: [f32; 2],
    pub pattern_br: [f32; 2],
    pub pattern_size: [f32; 2],
    pub world: [f32; 2],
    pub opacity: f32,
    pub _pad: [f32; 3],
}

impl FillOutlinePatternUniforms {
    pub fn new(pattern: &FillPatternUniforms, world: [u32; 2]) -> Self {
        Self {
            matrix: pattern.matrix,
            pattern_tl: pattern.pattern_tl,
            pattern_br: pattern.pattern_br,
            pattern_size: pattern.pattern_size,
            world: [world[0] as f32, world[1] as f32],
            opacity: pattern.opacity,
            _pad: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LineUniforms {
    pub matrix: MatrixColumns,
    pub color: [f32; 4],
    /// Atlas row, row height, distance scale, enabled flag.
    pub dash: [f32; 4],
    pub extrude_scale: [f32; 2],
    pub half_width: f32,
    pub gap_width: f32,
    pub blur: f32,
    pub offset: f32,
    pub opacity: f32,
    /// Pixel ratio of the framebuffer.
    pub ratio: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CircleUniforms {
    pub matrix: MatrixColumns,
    pub color: [f32; 4],
    pub extrude_scale: [f32; 2],
    pub radius: f32,
    pub blur: f32,
    pub opacity: f32,
    /// 1.0 when the circle scales with the map under pitch.
    pub scale_with_map: f32,
    pub device_pixel_ratio: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SymbolUniforms {
    pub matrix: MatrixColumns,
    pub color: [f32; 4],
    pub extrude_scale: [f32; 2],
    /// Atlas size in pixels.
    pub texsize: [f32; 2],
    pub size_scale: f32,
    pub opacity: f32,
    /// 1.0 for signed-distance glyphs, 0.0 for icons.
    pub sdf: f32,
    pub gamma: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct RasterUniforms {
    pub matrix: MatrixColumns,
    pub spin_weights: [f32; 4],
    pub opacity0: f32,
    pub opacity1: f32,
    pub brightness_low: f32,
    pub brightness_high: f32,
    pub saturation_factor: f32,
    pub contrast_factor: f32,
    pub buffer_scale: f32,
    pub _pad: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_whole_columns() {
        for size in [
            std::mem::size_of::<FillUniforms>(),
            std::mem::size_of::<FillPatternUniforms>(),
            std::mem::size_of::<FillOutlinePatternUniforms>(),
            std::mem::size_of::<LineUniforms>(),
            std::mem::size_of::<CircleUniforms>(),
            std::mem::size_of::<SymbolUniforms>(),
            std::mem::size_of::<RasterUniforms>(),
        ] {
            assert_eq!(size % 16, 0, "{size}");
            assert!(size <= 256, "{size}");
        }
    }
}
