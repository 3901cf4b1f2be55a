//! Headless backend that records every call.
//!
//! Object ids are allocated per kind like a GL driver does: the lowest freed
//! id is handed out again before fresh ids. Clones share one recorder, so a
//! test can keep a handle while the context owns another.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use crate::gl::api::{ApiError, GraphicsApi};
use crate::gl::types::{
    AttributeType, BlendEquation, BlendFactor, BufferId, BufferTarget, ClearMask, ColorMask,
    CompareFunc, DepthRange, FramebufferId, PrimitiveType, ProgramId, ShaderId, ShaderKind,
    StencilOpKind, TextureId, TextureParameter, TextureUnit, VertexArrayId, Viewport,
};
use crate::paint::Color;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProgram(ProgramId),
    CreateShader(ShaderKind, ShaderId),
    ShaderSource(ShaderId),
    CompileShader(ShaderId),
    AttachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    GenBuffer(BufferId),
    BufferData(BufferTarget, usize),
    GenTextures(usize),
    GenVertexArray(Option<VertexArrayId>),
    GenFramebuffer(FramebufferId),
    FramebufferTexture(TextureId),
    DeletePrograms(Vec<ProgramId>),
    DeleteShaders(Vec<ShaderId>),
    DeleteBuffers(Vec<BufferId>),
    DeleteTextures(Vec<TextureId>),
    DeleteVertexArrays(Vec<VertexArrayId>),
    DeleteFramebuffers(Vec<FramebufferId>),
    StencilFunc(CompareFunc, i32, u32),
    StencilMask(u32),
    StencilTest(bool),
    StencilOp(StencilOpKind, StencilOpKind, StencilOpKind),
    DepthRange(DepthRange),
    DepthMask(bool),
    DepthTest(bool),
    DepthFunc(CompareFunc),
    Blend(bool),
    BlendEquation(BlendEquation),
    BlendFunc(BlendFactor, BlendFactor),
    BlendColor(Color),
    ColorMask(ColorMask),
    ClearDepth(f32),
    ClearColor(Color),
    ClearStencil(i32),
    UseProgram(ProgramId),
    PointSize(f32),
    LineWidth(f32),
    ActiveTexture(TextureUnit),
    BindTexture(TextureId),
    BindFramebuffer(FramebufferId),
    Viewport(Viewport),
    BindBuffer(BufferTarget, BufferId),
    BindVertexArray(VertexArrayId),
    TexParameter(TextureParameter),
    TexImage2D { width: u32, height: u32 },
    UniformBlock { program: ProgramId, len: usize },
    EnableVertexAttribArray(u32),
    VertexAttribPointer { location: u32, count: u8, ty: AttributeType, stride: usize, offset: usize },
    Clear(ClearMask),
    DrawArrays { primitive: PrimitiveType, first: u32, count: u32 },
    DrawElements { primitive: PrimitiveType, count: u32, byte_offset: usize },
}

#[derive(Debug, Default)]
struct Names {
    next: u32,
    free: BTreeSet<u32>,
}

impl Names {
    fn alloc(&mut self) -> u32 {
        if let Some(id) = self.free.pop_first() {
            return id;
        }
        self.next += 1;
        self.next
    }

    fn release(&mut self, ids: &[u32]) {
        self.free.extend(ids.iter().copied().filter(|&id| id != 0));
    }
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
    errors: VecDeque<ApiError>,
    without_vertex_arrays: bool,
    failing_shaders: bool,

    programs: Names,
    shaders: Names,
    buffers: Names,
    textures: Names,
    vertex_arrays: Names,
    framebuffers: Names,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingApi {
    inner: Rc<RefCell<Recorder>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `gen_vertex_array` reports no support.
    pub fn without_vertex_arrays() -> Self {
        let api = Self::new();
        api.inner.borrow_mut().without_vertex_arrays = true;
        api
    }

    /// Makes every subsequent shader compilation fail.
    pub fn fail_shader_compilation(&self) {
        self.inner.borrow_mut().failing_shaders = true;
    }

    /// Queues an error for the next `get_error`.
    pub fn inject_error(&self, error: ApiError) {
        self.inner.borrow_mut().errors.push_back(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.inner.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.inner.borrow_mut().calls.push(call);
    }
}

impl GraphicsApi for RecordingApi {
    fn get_error(&mut self) -> Option<ApiError> {
        self.inner.borrow_mut().errors.pop_front()
    }

    fn create_program(&mut self) -> ProgramId {
        let id = self.inner.borrow_mut().programs.alloc();
        self.record(Call::CreateProgram(id));
        id
    }

    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId {
        let id = self.inner.borrow_mut().shaders.alloc();
        self.record(Call::CreateShader(kind, id));
        id
    }

    fn shader_source(&mut self, shader: ShaderId, _source: &str) {
        self.record(Call::ShaderSource(shader));
    }

    fn compile_shader(&mut self, shader: ShaderId) -> bool {
        self.record(Call::CompileShader(shader));
        !self.inner.borrow().failing_shaders
    }

    fn shader_info_log(&mut self, shader: ShaderId) -> String {
        format!("shader {shader}: compilation disabled by the recorder")
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.record(Call::AttachShader(program, shader));
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        self.record(Call::LinkProgram(program));
        true
    }

    fn program_info_log(&mut self, _program: ProgramId) -> String {
        String::new()
    }

    fn gen_buffer(&mut self) -> BufferId {
        let id = self.inner.borrow_mut().buffers.alloc();
        self.record(Call::GenBuffer(id));
        id
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        self.record(Call::BufferData(target, data.len()));
    }

    fn gen_textures(&mut self, count: usize) -> Vec<TextureId> {
        let ids = {
            let mut inner = self.inner.borrow_mut();
            (0..count).map(|_| inner.textures.alloc()).collect()
        };
        self.record(Call::GenTextures(count));
        ids
    }

    fn gen_vertex_array(&mut self) -> Option<VertexArrayId> {
        let id = {
            let mut inner = self.inner.borrow_mut();
            (!inner.without_vertex_arrays).then(|| inner.vertex_arrays.alloc())
        };
        self.record(Call::GenVertexArray(id));
        id
    }

    fn gen_framebuffer(&mut self) -> FramebufferId {
        let id = self.inner.borrow_mut().framebuffers.alloc();
        self.record(Call::GenFramebuffer(id));
        id
    }

    fn framebuffer_texture(&mut self, texture: TextureId) {
        self.record(Call::FramebufferTexture(texture));
    }

    fn delete_programs(&mut self, ids: &[ProgramId]) {
        self.inner.borrow_mut().programs.release(ids);
        self.record(Call::DeletePrograms(ids.to_vec()));
    }

    fn delete_shaders(&mut self, ids: &[ShaderId]) {
        self.inner.borrow_mut().shaders.release(ids);
        self.record(Call::DeleteShaders(ids.to_vec()));
    }

    fn delete_buffers(&mut self, ids: &[BufferId]) {
        self.inner.borrow_mut().buffers.release(ids);
        self.record(Call::DeleteBuffers(ids.to_vec()));
    }

    fn delete_textures(&mut self, ids: &[TextureId]) {
        self.inner.borrow_mut().textures.release(ids);
        self.record(Call::DeleteTextures(ids.to_vec()));
    }

    fn delete_vertex_arrays(&mut self, ids: &[VertexArrayId]) {
        self.inner.borrow_mut().vertex_arrays.release(ids);
        self.record(Call::DeleteVertexArrays(ids.to_vec()));
    }

    fn delete_framebuffers(&mut self, ids: &[FramebufferId]) {
        self.inner.borrow_mut().framebuffers.release(ids);
        self.record(Call::DeleteFramebuffers(ids.to_vec()));
    }

    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.record(Call::StencilFunc(func, reference, mask));
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.record(Call::StencilMask(mask));
    }

    fn stencil_test(&mut self, enabled: bool) {
        self.record(Call::StencilTest(enabled));
    }

    fn stencil_op(&mut self, fail: StencilOpKind, depth_fail: StencilOpKind, pass: StencilOpKind) {
        self.record(Call::StencilOp(fail, depth_fail, pass));
    }

    fn depth_range(&mut self, range: DepthRange) {
        self.record(Call::DepthRange(range));
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.record(Call::DepthMask(enabled));
    }

    fn depth_test(&mut self, enabled: bool) {
        self.record(Call::DepthTest(enabled));
    }

    fn depth_func(&mut self, func: CompareFunc) {
        self.record(Call::DepthFunc(func));
    }

    fn blend(&mut self, enabled: bool) {
        self.record(Call::Blend(enabled));
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        self.record(Call::BlendEquation(equation));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(Call::BlendFunc(src, dst));
    }

    fn blend_color(&mut self, color: Color) {
        self.record(Call::BlendColor(color));
    }

    fn color_mask(&mut self, mask: ColorMask) {
        self.record(Call::ColorMask(mask));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(Call::ClearDepth(depth));
    }

    fn clear_color(&mut self, color: Color) {
        self.record(Call::ClearColor(color));
    }

    fn clear_stencil(&mut self, value: i32) {
        self.record(Call::ClearStencil(value));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.record(Call::UseProgram(program));
    }

    fn point_size(&mut self, size: f32) {
        self.record(Call::PointSize(size));
    }

    fn line_width(&mut self, width: f32) {
        self.record(Call::LineWidth(width));
    }

    fn active_texture(&mut self, unit: TextureUnit) {
        self.record(Call::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.record(Call::BindTexture(texture));
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.record(Call::BindFramebuffer(framebuffer));
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.record(Call::Viewport(viewport));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn tex_parameter(&mut self, parameter: TextureParameter) {
        self.record(Call::TexParameter(parameter));
    }

    fn tex_image_2d(&mut self, width: u32, height: u32, _rgba: Option<&[u8]>) {
        self.record(Call::TexImage2D { width, height });
    }

    fn uniform_block(&mut self, program: ProgramId, data: &[u8]) {
        self.record(Call::UniformBlock { program, len: data.len() });
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.record(Call::EnableVertexAttribArray(location));
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        count: u8,
        ty: AttributeType,
        stride: usize,
        offset: usize,
    ) {
        self.record(Call::VertexAttribPointer { location, count, ty, stride, offset });
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(Call::Clear(mask));
    }

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) {
        self.record(Call::DrawArrays { primitive, first, count });
    }

    fn draw_elements(&mut self, primitive: PrimitiveType, count: u32, byte_offset: usize) {
        self.record(Call::DrawElements { primitive, count, byte_offset });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_ids_are_reused_lowest_first() {
        let mut api = RecordingApi::new();
        let ids: Vec<_> = (0..4).map(|_| api.gen_buffer()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        api.delete_buffers(&[3, 2]);
        assert_eq!(api.gen_buffer(), 2);
        assert_eq!(api.gen_buffer(), 3);
        assert_eq!(api.gen_buffer(), 5);
    }

    #[test]
    fn clones_share_the_log() {
        let api = RecordingApi::new();
        let mut other = api.clone();
        other.clear(ClearMask::COLOR);
        assert_eq!(api.take_calls(), vec![Call::Clear(ClearMask::COLOR)]);
        assert!(api.calls().is_empty());
    }
}
