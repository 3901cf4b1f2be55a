//! Mapping of the GL-shaped enums onto their wgpu counterparts.

use crate::gl::types::{
    AttributeType, BlendEquation, BlendFactor, ColorMask, CompareFunc, PrimitiveType,
    StencilOpKind, TextureFilter, TextureWrap,
};

pub fn compare(func: CompareFunc) -> wgpu::CompareFunction {
    match func {
        CompareFunc::Never => wgpu::CompareFunction::Never,
        CompareFunc::Less => wgpu::CompareFunction::Less,
        CompareFunc::Equal => wgpu::CompareFunction::Equal,
        CompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunc::Greater => wgpu::CompareFunction::Greater,
        CompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunc::Always => wgpu::CompareFunction::Always,
    }
}

pub fn stencil_op(op: StencilOpKind) -> wgpu::StencilOperation {
    match op {
        StencilOpKind::Zero => wgpu::StencilOperation::Zero,
        StencilOpKind::Keep => wgpu::StencilOperation::Keep,
        StencilOpKind::Replace => wgpu::StencilOperation::Replace,
        StencilOpKind::Increment => wgpu::StencilOperation::IncrementClamp,
        StencilOpKind::Decrement => wgpu::StencilOperation::DecrementClamp,
        StencilOpKind::Invert => wgpu::StencilOperation::Invert,
        StencilOpKind::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOpKind::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
    }
}

pub fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFactor::SrcAlphaSaturate => wgpu::BlendFactor::SrcAlphaSaturated,
        BlendFactor::ConstantColor => wgpu::BlendFactor::Constant,
        BlendFactor::OneMinusConstantColor => wgpu::BlendFactor::OneMinusConstant,
    }
}

pub fn blend_operation(equation: BlendEquation) -> wgpu::BlendOperation {
    match equation {
        BlendEquation::Add => wgpu::BlendOperation::Add,
        BlendEquation::Subtract => wgpu::BlendOperation::Subtract,
        BlendEquation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
    }
}

/// One blend equation for both color and alpha, like `glBlendFunc`.
pub fn blend_state(equation: BlendEquation, src: BlendFactor, dst: BlendFactor) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(src),
        dst_factor: blend_factor(dst),
        operation: blend_operation(equation),
    };
    wgpu::BlendState { color: component, alpha: component }
}

pub fn color_writes(mask: ColorMask) -> wgpu::ColorWrites {
    let mut writes = wgpu::ColorWrites::empty();
    if mask.r {
        writes |= wgpu::ColorWrites::RED;
    }
    if mask.g {
        writes |= wgpu::ColorWrites::GREEN;
    }
    if mask.b {
        writes |= wgpu::ColorWrites::BLUE;
    }
    if mask.a {
        writes |= wgpu::ColorWrites::ALPHA;
    }
    writes
}

pub fn topology(primitive: PrimitiveType) -> wgpu::PrimitiveTopology {
    match primitive {
        PrimitiveType::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// Strip topologies need the index format at pipeline creation.
pub fn strip_index_format(primitive: PrimitiveType) -> Option<wgpu::IndexFormat> {
    match primitive {
        PrimitiveType::LineStrip | PrimitiveType::TriangleStrip => Some(wgpu::IndexFormat::Uint16),
        _ => None,
    }
}

/// Integer attributes are passed through unnormalized; wgpu has no 3-wide
/// 8/16-bit formats, so those yield `None`.
pub fn vertex_format(count: u8, ty: AttributeType) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match (ty, count) {
        (AttributeType::I8, 2) => F::Sint8x2,
        (AttributeType::I8, 4) => F::Sint8x4,
        (AttributeType::U8, 2) => F::Uint8x2,
        (AttributeType::U8, 4) => F::Uint8x4,
        (AttributeType::I16, 2) => F::Sint16x2,
        (AttributeType::I16, 4) => F::Sint16x4,
        (AttributeType::U16, 2) => F::Uint16x2,
        (AttributeType::U16, 4) => F::Uint16x4,
        (AttributeType::I32, 1) => F::Sint32,
        (AttributeType::I32, 2) => F::Sint32x2,
        (AttributeType::I32, 3) => F::Sint32x3,
        (AttributeType::I32, 4) => F::Sint32x4,
        (AttributeType::U32, 1) => F::Uint32,
        (AttributeType::U32, 2) => F::Uint32x2,
        (AttributeType::U32, 3) => F::Uint32x3,
        (AttributeType::U32, 4) => F::Uint32x4,
        (AttributeType::F32, 1) => F::Float32,
        (AttributeType::F32, 2) => F::Float32x2,
        (AttributeType::F32, 3) => F::Float32x3,
        (AttributeType::F32, 4) => F::Float32x4,
        _ => return None,
    })
}

pub fn filter(filter: TextureFilter) -> wgpu::FilterMode {
    match filter {
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        TextureFilter::Linear => wgpu::FilterMode::Linear,
    }
}

pub fn address_mode(wrap: TextureWrap) -> wgpu::AddressMode {
    match wrap {
        TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_wide_small_formats_are_rejected() {
        assert_eq!(vertex_format(2, AttributeType::I16), Some(wgpu::VertexFormat::Sint16x2));
        assert_eq!(vertex_format(3, AttributeType::U8), None);
        assert_eq!(vertex_format(3, AttributeType::F32), Some(wgpu::VertexFormat::Float32x3));
    }

    #[test]
    fn partial_color_masks_map_per_channel() {
        let mask = ColorMask { r: true, g: false, b: true, a: false };
        assert_eq!(color_writes(mask), wgpu::ColorWrites::RED | wgpu::ColorWrites::BLUE);
        assert_eq!(color_writes(ColorMask::NONE), wgpu::ColorWrites::empty());
        assert_eq!(color_writes(ColorMask::ALL), wgpu::ColorWrites::ALL);
    }
}
