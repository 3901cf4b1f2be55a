//! The cached state slots and the API call each one maps to.

use crate::paint::Color;

use super::api::GraphicsApi;
use super::check::check_error;
use super::state::StateValue;
use super::types::{
    BlendEquation as BlendEquationKind, BlendFactor, BufferId, BufferTarget, ColorMask as Mask,
    CompareFunc, DepthRange as Range, FramebufferId, ProgramId, StencilOpKind, TextureId,
    TextureUnit, VertexArrayId, Viewport as Rect,
};

macro_rules! state_value {
    ($(#[$doc:meta])* $name:ident: $ty:ty = $default:expr, |$api:ident, $value:ident| $apply:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub enum $name {}

        impl StateValue for $name {
            type Type = $ty;

            fn default_value() -> $ty {
                $default
            }

            fn apply($api: &mut dyn GraphicsApi, $value: $ty) {
                check_error!($api, $apply);
            }
        }
    };
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StencilFuncValue {
    pub func: CompareFunc,
    pub reference: i32,
    pub mask: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StencilOpValue {
    pub fail: StencilOpKind,
    pub depth_fail: StencilOpKind,
    pub pass: StencilOpKind,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlendFuncValue {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

state_value!(StencilFunc: StencilFuncValue = StencilFuncValue {
    func: CompareFunc::Always,
    reference: 0,
    mask: !0,
}, |api, v| api.stencil_func(v.func, v.reference, v.mask));

state_value!(StencilMask: u32 = !0, |api, v| api.stencil_mask(v));

state_value!(StencilTest: bool = false, |api, v| api.stencil_test(v));

state_value!(StencilOp: StencilOpValue = StencilOpValue {
    fail: StencilOpKind::Keep,
    depth_fail: StencilOpKind::Keep,
    pass: StencilOpKind::Keep,
}, |api, v| api.stencil_op(v.fail, v.depth_fail, v.pass));

state_value!(DepthRange: Range = Range::FULL, |api, v| api.depth_range(v));

state_value!(DepthMask: bool = true, |api, v| api.depth_mask(v));

state_value!(DepthTest: bool = false, |api, v| api.depth_test(v));

state_value!(DepthFunc: CompareFunc = CompareFunc::Less, |api, v| api.depth_func(v));

state_value!(Blend: bool = true, |api, v| api.blend(v));

state_value!(BlendEquation: BlendEquationKind = BlendEquationKind::Add,
    |api, v| api.blend_equation(v));

state_value!(BlendFunc: BlendFuncValue = BlendFuncValue {
    src: BlendFactor::One,
    dst: BlendFactor::Zero,
}, |api, v| api.blend_func(v.src, v.dst));

state_value!(BlendColor: Color = Color::transparent(), |api, v| api.blend_color(v));

state_value!(ColorMask: Mask = Mask::ALL, |api, v| api.color_mask(v));

state_value!(ClearDepth: f32 = 1.0, |api, v| api.clear_depth(v));

state_value!(ClearColor: Color = Color::transparent(), |api, v| api.clear_color(v));

state_value!(ClearStencil: i32 = 0, |api, v| api.clear_stencil(v));

state_value!(Program: ProgramId = 0, |api, v| api.use_program(v));

state_value!(PointSize: f32 = 1.0, |api, v| api.point_size(v));

state_value!(LineWidth: f32 = 1.0, |api, v| api.line_width(v));

state_value!(ActiveTexture: TextureUnit = 0, |api, v| api.active_texture(v));

state_value!(
    /// Texture bound on the active unit. The context selects the unit first.
    BindTexture: TextureId = 0, |api, v| api.bind_texture(v));

state_value!(BindFramebuffer: FramebufferId = 0, |api, v| api.bind_framebuffer(v));

state_value!(Viewport: Rect = Rect::default(), |api, v| api.viewport(v));

state_value!(BindVertexBuffer: BufferId = 0,
    |api, v| api.bind_buffer(BufferTarget::Vertex, v));

state_value!(
    /// Element buffer binding; this is vertex-array state in the API.
    BindElementBuffer: BufferId = 0, |api, v| api.bind_buffer(BufferTarget::Element, v));

state_value!(BindVertexArray: VertexArrayId = 0, |api, v| api.bind_vertex_array(v));
