use bitflags::bitflags;

pub type ProgramId = u32;
pub type ShaderId = u32;
pub type BufferId = u32;
pub type TextureId = u32;
pub type VertexArrayId = u32;
pub type FramebufferId = u32;

/// Index of a texture unit. The renderer uses units 0 and 1.
pub type TextureUnit = u8;

/// Number of texture units tracked by the state cache.
pub const TEXTURE_UNITS: usize = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Component type of a vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl AttributeType {
    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            AttributeType::I8 | AttributeType::U8 => 1,
            AttributeType::I16 | AttributeType::U16 => 2,
            AttributeType::I32 | AttributeType::U32 | AttributeType::F32 => 4,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Element,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureMipMap {
    No,
    Yes,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
}

/// A sampling parameter applied to the texture bound on the active unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    MinFilter(TextureFilter, TextureMipMap),
    MagFilter(TextureFilter),
    WrapS(TextureWrap),
    WrapT(TextureWrap),
}

/// Comparison used by both the depth and the stencil test.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StencilOpKind {
    Zero,
    Keep,
    Replace,
    Increment,
    Decrement,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
    ConstantColor,
    OneMinusConstantColor,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ColorMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorMask {
    pub const ALL: ColorMask = ColorMask { r: true, g: true, b: true, a: true };
    pub const NONE: ColorMask = ColorMask { r: false, g: false, b: false, a: false };
}

/// Mapping of normalized device depth onto window depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
}

impl DepthRange {
    pub const FULL: DepthRange = DepthRange { near: 0.0, far: 1.0 };
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn sized(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

bitflags! {
    /// Buffers affected by a clear.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ClearMask: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}
