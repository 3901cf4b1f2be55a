//! Draw-call descriptors consumed by [`Context::draw`](super::Context::draw).

use std::borrow::Cow;

use bytemuck::Pod;

use crate::paint::Color;

use super::api::GraphicsApi;
use super::object::{IndexBuffer, VertexBuffer};
use super::types::{
    AttributeType, BlendEquation, BlendFactor, BufferId, ColorMask, CompareFunc, DepthRange,
    PrimitiveType, ProgramId, StencilOpKind,
};

/// Primitive kind plus its per-mode parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DrawMode {
    Points { point_size: f32 },
    Lines { line_width: f32 },
    LineStrip { line_width: f32 },
    Triangles,
    TriangleStrip,
}

impl DrawMode {
    pub fn primitive_type(self) -> PrimitiveType {
        match self {
            DrawMode::Points { .. } => PrimitiveType::Points,
            DrawMode::Lines { .. } => PrimitiveType::Lines,
            DrawMode::LineStrip { .. } => PrimitiveType::LineStrip,
            DrawMode::Triangles => PrimitiveType::Triangles,
            DrawMode::TriangleStrip => PrimitiveType::TriangleStrip,
        }
    }

    /// Bytes of u16 indices that make up one primitive in an index buffer.
    pub fn primitive_size(self) -> usize {
        let indices = match self {
            DrawMode::Points { .. } => 1,
            DrawMode::Lines { .. } => 2,
            DrawMode::LineStrip { .. } => 1,
            DrawMode::Triangles => 3,
            DrawMode::TriangleStrip => 1,
        };
        indices * std::mem::size_of::<u16>()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Depth {
    pub func: CompareFunc,
    pub mask: bool,
    pub range: DepthRange,
}

impl Depth {
    pub const fn disabled() -> Self {
        Self { func: CompareFunc::Always, mask: false, range: DepthRange::FULL }
    }

    /// Always passing without writing is the same as no depth test at all.
    pub fn is_disabled(&self) -> bool {
        self.func == CompareFunc::Always && !self.mask
    }
}

/// Stencil comparison; the payload is the read mask.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StencilTest {
    Never,
    Less(u32),
    Equal(u32),
    LessEqual(u32),
    Greater(u32),
    NotEqual(u32),
    GreaterEqual(u32),
    Always,
}

impl StencilTest {
    pub fn func(self) -> CompareFunc {
        match self {
            StencilTest::Never => CompareFunc::Never,
            StencilTest::Less(_) => CompareFunc::Less,
            StencilTest::Equal(_) => CompareFunc::Equal,
            StencilTest::LessEqual(_) => CompareFunc::LessEqual,
            StencilTest::Greater(_) => CompareFunc::Greater,
            StencilTest::NotEqual(_) => CompareFunc::NotEqual,
            StencilTest::GreaterEqual(_) => CompareFunc::GreaterEqual,
            StencilTest::Always => CompareFunc::Always,
        }
    }

    pub fn mask(self) -> u32 {
        match self {
            StencilTest::Never | StencilTest::Always => 0,
            StencilTest::Less(m)
            | StencilTest::Equal(m)
            | StencilTest::LessEqual(m)
            | StencilTest::Greater(m)
            | StencilTest::NotEqual(m)
            | StencilTest::GreaterEqual(m) => m,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Stencil {
    pub test: StencilTest,
    pub reference: i32,
    /// Write mask.
    pub mask: u32,
    pub fail: StencilOpKind,
    pub depth_fail: StencilOpKind,
    pub pass: StencilOpKind,
}

impl Stencil {
    pub const fn disabled() -> Self {
        Self {
            test: StencilTest::Always,
            reference: 0,
            mask: 0,
            fail: StencilOpKind::Keep,
            depth_fail: StencilOpKind::Keep,
            pass: StencilOpKind::Keep,
        }
    }

    /// Always passing without writing is the same as no stencil test.
    pub fn is_disabled(&self) -> bool {
        self.test == StencilTest::Always && self.mask == 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendFunction {
    /// Source replaces destination; blending is off.
    Replace,
    Add { src: BlendFactor, dst: BlendFactor },
    Subtract { src: BlendFactor, dst: BlendFactor },
    ReverseSubtract { src: BlendFactor, dst: BlendFactor },
}

impl BlendFunction {
    /// Equation and factors, or `None` for [`BlendFunction::Replace`].
    pub fn parts(self) -> Option<(BlendEquation, BlendFactor, BlendFactor)> {
        match self {
            BlendFunction::Replace => None,
            BlendFunction::Add { src, dst } => Some((BlendEquation::Add, src, dst)),
            BlendFunction::Subtract { src, dst } => Some((BlendEquation::Subtract, src, dst)),
            BlendFunction::ReverseSubtract { src, dst } => {
                Some((BlendEquation::ReverseSubtract, src, dst))
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorMode {
    pub blend_function: BlendFunction,
    pub blend_color: Color,
    pub mask: ColorMask,
}

impl ColorMode {
    /// No color output at all (stencil-only draws).
    pub const fn disabled() -> Self {
        Self {
            blend_function: BlendFunction::Replace,
            blend_color: Color::transparent(),
            mask: ColorMask::NONE,
        }
    }

    pub const fn unblended() -> Self {
        Self {
            blend_function: BlendFunction::Replace,
            blend_color: Color::transparent(),
            mask: ColorMask::ALL,
        }
    }

    /// Premultiplied "over" compositing.
    pub const fn alpha_blended() -> Self {
        Self {
            blend_function: BlendFunction::Add {
                src: BlendFactor::One,
                dst: BlendFactor::OneMinusSrcAlpha,
            },
            blend_color: Color::transparent(),
            mask: ColorMask::ALL,
        }
    }
}

/// One draw range inside a shared vertex/index buffer pair.
///
/// `index_offset` and `index_length` count primitives, not indices.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub vertex_offset: usize,
    pub index_offset: usize,
    pub vertex_length: usize,
    pub index_length: usize,
}

impl Segment {
    pub const fn new(
        vertex_offset: usize,
        index_offset: usize,
        vertex_length: usize,
        index_length: usize,
    ) -> Self {
        Self { vertex_offset, index_offset, vertex_length, index_length }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AttributeBinding {
    pub location: u32,
    pub count: u8,
    pub ty: AttributeType,
    /// Byte offset of the attribute inside one vertex.
    pub offset: usize,
}

/// A vertex layout the context can bind.
pub trait Vertex: Pod {
    const ATTRIBUTES: &'static [AttributeBinding];
}

/// Applies a program's uniform values.
pub trait Uniforms {
    fn bind(&self, api: &mut dyn GraphicsApi, program: ProgramId);
}

impl<T: Pod> Uniforms for T {
    fn bind(&self, api: &mut dyn GraphicsApi, program: ProgramId) {
        api.uniform_block(program, bytemuck::bytes_of(self));
    }
}

/// A fully specified draw call.
pub struct Drawable<'a> {
    pub mode: DrawMode,
    pub depth: Depth,
    pub stencil: Stencil,
    pub color: ColorMode,
    pub program: ProgramId,
    pub uniforms: &'a dyn Uniforms,
    pub vertex_buffer: BufferId,
    pub vertex_size: usize,
    /// `None` draws the segments' vertex ranges without indices.
    pub index_buffer: Option<BufferId>,
    pub segments: Cow<'a, [Segment]>,
    pub attributes: &'static [AttributeBinding],
}

impl<'a> Drawable<'a> {
    /// Draws every vertex of `vertices` in order.
    pub fn unindexed<V: Vertex>(
        mode: DrawMode,
        depth: Depth,
        stencil: Stencil,
        color: ColorMode,
        program: ProgramId,
        uniforms: &'a dyn Uniforms,
        vertices: &VertexBuffer<V>,
    ) -> Self {
        Self {
            mode,
            depth,
            stencil,
            color,
            program,
            uniforms,
            vertex_buffer: vertices.id(),
            vertex_size: std::mem::size_of::<V>(),
            index_buffer: None,
            segments: Cow::Owned(vec![Segment::new(0, 0, vertices.vertex_count, 0)]),
            attributes: V::ATTRIBUTES,
        }
    }

    /// Draws each segment as an indexed range of the buffer pair.
    #[allow(clippy::too_many_arguments)]
    pub fn segmented<V: Vertex>(
        mode: DrawMode,
        depth: Depth,
        stencil: Stencil,
        color: ColorMode,
        program: ProgramId,
        uniforms: &'a dyn Uniforms,
        vertices: &VertexBuffer<V>,
        indices: &IndexBuffer,
        segments: &'a [Segment],
    ) -> Self {
        Self {
            mode,
            depth,
            stencil,
            color,
            program,
            uniforms,
            vertex_buffer: vertices.id(),
            vertex_size: std::mem::size_of::<V>(),
            index_buffer: Some(indices.id()),
            segments: Cow::Borrowed(segments),
            attributes: V::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_sizes_count_index_bytes() {
        assert_eq!(DrawMode::Triangles.primitive_size(), 6);
        assert_eq!(DrawMode::Lines { line_width: 1.0 }.primitive_size(), 4);
        assert_eq!(DrawMode::TriangleStrip.primitive_size(), 2);
        assert_eq!(DrawMode::Points { point_size: 2.0 }.primitive_size(), 2);
    }

    #[test]
    fn disabled_policies_are_recognized() {
        assert!(Depth::disabled().is_disabled());
        assert!(Stencil::disabled().is_disabled());
        assert_eq!(ColorMode::unblended().blend_function.parts(), None);

        let depth = Depth { func: CompareFunc::LessEqual, mask: false, range: DepthRange::FULL };
        assert!(!depth.is_disabled());
        assert_eq!(StencilTest::Equal(0b11).mask(), 0b11);
        assert_eq!(StencilTest::Always.func(), CompareFunc::Always);
    }

    #[test]
    fn writing_stencils_are_enabled_even_when_always_passing() {
        let write = Stencil { reference: 3, mask: 0xff, pass: StencilOpKind::Replace, ..Stencil::disabled() };
        assert!(!write.is_disabled());
    }
}
