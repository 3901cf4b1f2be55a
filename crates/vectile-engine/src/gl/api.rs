//! The raw graphics-API seam driven by [`Context`](super::Context).
//!
//! The trait mirrors a GL-style state machine: objects are named by integer
//! ids, state is set one piece at a time, and errors are polled after the
//! fact through [`GraphicsApi::get_error`]. Nothing above this trait talks
//! to a backend directly, so every call can be checked and cached uniformly.

use crate::paint::Color;

use super::types::{
    AttributeType, BlendEquation, BlendFactor, BufferId, BufferTarget, ClearMask, ColorMask,
    CompareFunc, DepthRange, FramebufferId, PrimitiveType, ProgramId, ShaderId, ShaderKind,
    StencilOpKind, TextureId, TextureParameter, TextureUnit, VertexArrayId, Viewport,
};

/// Error reported by a backend after a failed call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("invalid enum: an unacceptable value was specified for an enumerated argument")]
    InvalidEnum,
    #[error("invalid value: a numeric argument is out of range")]
    InvalidValue,
    #[error("invalid operation: the operation is not allowed in the current state")]
    InvalidOperation,
    #[error("invalid framebuffer operation: the framebuffer object is not complete")]
    InvalidFramebufferOperation,
    #[error("out of memory: not enough memory left to execute the command")]
    OutOfMemory,
    #[error("unknown error {0:#x}")]
    Unknown(u32),
}

pub trait GraphicsApi {
    /// Returns and clears the oldest pending error.
    fn get_error(&mut self) -> Option<ApiError>;

    // ── objects ────────────────────────────────────────────────────────────

    fn create_program(&mut self) -> ProgramId;
    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    /// Compiles the shader and returns its compile status.
    fn compile_shader(&mut self, shader: ShaderId) -> bool;
    fn shader_info_log(&mut self, shader: ShaderId) -> String;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    /// Links the program and returns its link status.
    fn link_program(&mut self, program: ProgramId) -> bool;
    fn program_info_log(&mut self, program: ProgramId) -> String;

    fn gen_buffer(&mut self) -> BufferId;
    /// Replaces the contents of the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]);

    fn gen_textures(&mut self, count: usize) -> Vec<TextureId>;
    /// Returns `None` when the backend has no vertex-array objects.
    fn gen_vertex_array(&mut self) -> Option<VertexArrayId>;
    fn gen_framebuffer(&mut self) -> FramebufferId;
    /// Attaches `texture` as the color target of the bound framebuffer.
    fn framebuffer_texture(&mut self, texture: TextureId);

    fn delete_programs(&mut self, ids: &[ProgramId]);
    fn delete_shaders(&mut self, ids: &[ShaderId]);
    fn delete_buffers(&mut self, ids: &[BufferId]);
    fn delete_textures(&mut self, ids: &[TextureId]);
    fn delete_vertex_arrays(&mut self, ids: &[VertexArrayId]);
    fn delete_framebuffers(&mut self, ids: &[FramebufferId]);

    // ── pipeline state ─────────────────────────────────────────────────────

    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32);
    fn stencil_mask(&mut self, mask: u32);
    fn stencil_test(&mut self, enabled: bool);
    fn stencil_op(&mut self, fail: StencilOpKind, depth_fail: StencilOpKind, pass: StencilOpKind);
    fn depth_range(&mut self, range: DepthRange);
    fn depth_mask(&mut self, enabled: bool);
    fn depth_test(&mut self, enabled: bool);
    fn depth_func(&mut self, func: CompareFunc);
    fn blend(&mut self, enabled: bool);
    fn blend_equation(&mut self, equation: BlendEquation);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn blend_color(&mut self, color: Color);
    fn color_mask(&mut self, mask: ColorMask);
    fn clear_depth(&mut self, depth: f32);
    fn clear_color(&mut self, color: Color);
    fn clear_stencil(&mut self, value: i32);
    fn use_program(&mut self, program: ProgramId);
    fn point_size(&mut self, size: f32);
    fn line_width(&mut self, width: f32);
    fn active_texture(&mut self, unit: TextureUnit);
    /// Binds `texture` to the active unit.
    fn bind_texture(&mut self, texture: TextureId);
    fn bind_framebuffer(&mut self, framebuffer: FramebufferId);
    fn viewport(&mut self, viewport: Viewport);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId);
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);

    // ── textures ───────────────────────────────────────────────────────────

    fn tex_parameter(&mut self, parameter: TextureParameter);
    /// (Re)allocates the texture bound on the active unit as RGBA8 storage.
    fn tex_image_2d(&mut self, width: u32, height: u32, rgba: Option<&[u8]>);

    // ── draws ──────────────────────────────────────────────────────────────

    /// Sets the uniform block of `program`; the values persist until replaced.
    fn uniform_block(&mut self, program: ProgramId, data: &[u8]);
    fn enable_vertex_attrib_array(&mut self, location: u32);
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        count: u8,
        ty: AttributeType,
        stride: usize,
        offset: usize,
    );

    fn clear(&mut self, mask: ClearMask);
    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32);
    /// Draws `count` u16 indices starting `byte_offset` bytes into the element buffer.
    fn draw_elements(&mut self, primitive: PrimitiveType, count: u32, byte_offset: usize);
}
