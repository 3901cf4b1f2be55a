//! Vertex layouts of the tessellated bucket geometry.
//!
//! All positions are tile-local integers in `0..EXTENT`.

use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};

use crate::gl::{AttributeBinding, AttributeType, Vertex};

macro_rules! attribute {
    ($ty:ident, $field:ident, $location:expr, $count:expr, $attr:ident) => {
        AttributeBinding {
            location: $location,
            count: $count,
            ty: AttributeType::$attr,
            offset: offset_of!($ty, $field),
        }
    };
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct FillVertex {
    pub pos: [i16; 2],
}

impl FillVertex {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { pos: [x, y] }
    }
}

impl Vertex for FillVertex {
    const ATTRIBUTES: &'static [AttributeBinding] = &[attribute!(FillVertex, pos, 0, 2, I16)];
}

/// The quad corner is packed into the low bit of each coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct CircleVertex {
    pub pos: [i16; 2],
}

impl CircleVertex {
    /// `ex`/`ey` select the corner and are `-1` or `1`.
    pub const fn new(x: i16, y: i16, ex: i16, ey: i16) -> Self {
        Self { pos: [x * 2 + (ex + 1) / 2, y * 2 + (ey + 1) / 2] }
    }
}

impl Vertex for CircleVertex {
    const ATTRIBUTES: &'static [AttributeBinding] = &[attribute!(CircleVertex, pos, 0, 2, I16)];
}

/// Extrusion vectors are stored scaled by this factor.
pub const LINE_EXTRUDE_SCALE: f32 = 63.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [i16; 2],
    /// Unit normal (x, y), side of the line (-1 or 1) and padding.
    pub extrude: [i8; 4],
    /// Distance along the line in tile units, for dash lookups.
    pub distance: [u16; 2],
}

impl LineVertex {
    pub fn new(x: i16, y: i16, normal: [f32; 2], side: i8, distance: u16) -> Self {
        let scale = |v: f32| (v * LINE_EXTRUDE_SCALE).round() as i8;
        Self {
            pos: [x, y],
            extrude: [scale(normal[0]), scale(normal[1]), side, 0],
            distance: [distance, 0],
        }
    }
}

impl Vertex for LineVertex {
    const ATTRIBUTES: &'static [AttributeBinding] = &[
        attribute!(LineVertex, pos, 0, 2, I16),
        attribute!(LineVertex, extrude, 1, 4, I8),
        attribute!(LineVertex, distance, 2, 2, U16),
    ];
}

/// Texture coordinates span `0..=RASTER_TEXTURE_MAX`.
pub const RASTER_TEXTURE_MAX: i16 = 32767;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct RasterVertex {
    pub pos: [i16; 2],
    pub texture_pos: [i16; 2],
}

impl RasterVertex {
    pub const fn new(x: i16, y: i16, tx: i16, ty: i16) -> Self {
        Self { pos: [x, y], texture_pos: [tx, ty] }
    }
}

impl Vertex for RasterVertex {
    const ATTRIBUTES: &'static [AttributeBinding] = &[
        attribute!(RasterVertex, pos, 0, 2, I16),
        attribute!(RasterVertex, texture_pos, 1, 2, I16),
    ];
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct SymbolVertex {
    /// Anchor point.
    pub pos: [i16; 2],
    /// Corner offset from the anchor in 1/64 pixels.
    pub offset: [i16; 2],
    /// Atlas position in pixels.
    pub texture_pos: [u16; 2],
    /// Label minimum zoom ×10, minimum zoom ×10, maximum zoom ×10, unused.
    pub data: [u8; 4],
}

impl SymbolVertex {
    pub fn new(anchor: [i16; 2], offset: [f32; 2], texture_pos: [u16; 2], label_min_zoom: f32) -> Self {
        let zoom = (label_min_zoom * 10.0).clamp(0.0, 255.0) as u8;
        Self {
            pos: anchor,
            offset: [(offset[0] * 64.0).round() as i16, (offset[1] * 64.0).round() as i16],
            texture_pos,
            data: [zoom, 0, 255, 0],
        }
    }
}

impl Vertex for SymbolVertex {
    const ATTRIBUTES: &'static [AttributeBinding] = &[
        attribute!(SymbolVertex, pos, 0, 2, I16),
        attribute!(SymbolVertex, offset, 1, 2, I16),
        attribute!(SymbolVertex, texture_pos, 2, 2, U16),
        attribute!(SymbolVertex, data, 3, 4, U8),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_four_byte_aligned() {
        assert_eq!(std::mem::size_of::<FillVertex>(), 4);
        assert_eq!(std::mem::size_of::<LineVertex>(), 12);
        assert_eq!(std::mem::size_of::<RasterVertex>(), 8);
        assert_eq!(std::mem::size_of::<SymbolVertex>(), 16);
        assert_eq!(SymbolVertex::ATTRIBUTES[3].offset, 12);
    }

    #[test]
    fn circle_corners_live_in_the_low_bit() {
        let v = CircleVertex::new(100, 7, -1, 1);
        assert_eq!(v.pos, [200, 15]);
        assert_eq!(v.pos[0] >> 1, 100);
        assert_eq!(v.pos[1] & 1, 1);
    }
}
