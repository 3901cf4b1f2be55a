use std::collections::HashMap;
use std::rc::Rc;

use crate::paint::Color;

use super::api::GraphicsApi;
use super::check::check_error;
use super::drawable::{DrawMode, Drawable, Segment, Vertex};
use super::object::{
    AbandonedQueues, Framebuffer, IndexBuffer, SharedQueues, Texture, UniqueBuffer,
    UniqueFramebuffer, UniqueProgram, UniqueShader, UniqueTexture, UniqueVertexArray,
    VertexBuffer,
};
use super::state::{Slot, State};
use super::types::{
    BufferId, BufferTarget, ClearMask, ColorMask, ProgramId, ShaderKind, TEXTURE_UNITS,
    TextureFilter, TextureId, TextureMipMap, TextureParameter, TextureUnit, TextureWrap,
    VertexArrayId, Viewport,
};
use super::value::{
    ActiveTexture, BindElementBuffer, BindFramebuffer, BindTexture, BindVertexArray,
    BindVertexBuffer, Blend, BlendColor, BlendEquation, BlendFunc, BlendFuncValue, ClearColor,
    ClearDepth, ClearStencil, ColorMask as ColorMaskValue, DepthFunc, DepthMask, DepthRange,
    DepthTest, LineWidth, PointSize, Program, StencilFunc, StencilFuncValue, StencilMask,
    StencilOp, StencilOpValue, StencilTest, Viewport as ViewportValue,
};

/// Number of texture names requested per pool refill.
pub const TEXTURE_POOL_SIZE: usize = 64;

/// (program, vertex buffer, index buffer or 0, segment vertex offset)
type VertexArrayKey = (ProgramId, BufferId, BufferId, usize);

/// Every cached slot the context tracks.
#[derive(Debug, Default)]
pub struct ContextState {
    pub stencil_func: State<StencilFunc>,
    pub stencil_mask: State<StencilMask>,
    pub stencil_test: State<StencilTest>,
    pub stencil_op: State<StencilOp>,
    pub depth_range: State<DepthRange>,
    pub depth_mask: State<DepthMask>,
    pub depth_test: State<DepthTest>,
    pub depth_func: State<DepthFunc>,
    pub blend: State<Blend>,
    pub blend_equation: State<BlendEquation>,
    pub blend_func: State<BlendFunc>,
    pub blend_color: State<BlendColor>,
    pub color_mask: State<ColorMaskValue>,
    pub clear_depth: State<ClearDepth>,
    pub clear_color: State<ClearColor>,
    pub clear_stencil: State<ClearStencil>,
    pub program: State<Program>,
    pub point_size: State<PointSize>,
    pub line_width: State<LineWidth>,
    pub active_texture: State<ActiveTexture>,
    pub texture: [State<BindTexture>; TEXTURE_UNITS],
    pub bind_framebuffer: State<BindFramebuffer>,
    pub viewport: State<ViewportValue>,
    pub vertex_buffer: State<BindVertexBuffer>,
    pub element_buffer: State<BindElementBuffer>,
    pub vertex_array: State<BindVertexArray>,
}

impl ContextState {
    /// Every slot except the per-unit texture bindings, which need their unit
    /// selected first.
    fn slots(&mut self) -> Vec<&mut dyn Slot> {
        vec![
            &mut self.stencil_func,
            &mut self.stencil_mask,
            &mut self.stencil_test,
            &mut self.stencil_op,
            &mut self.depth_range,
            &mut self.depth_mask,
            &mut self.depth_test,
            &mut self.depth_func,
            &mut self.blend,
            &mut self.blend_equation,
            &mut self.blend_func,
            &mut self.blend_color,
            &mut self.color_mask,
            &mut self.clear_depth,
            &mut self.clear_color,
            &mut self.clear_stencil,
            &mut self.program,
            &mut self.point_size,
            &mut self.line_width,
            &mut self.bind_framebuffer,
            &mut self.viewport,
            &mut self.vertex_buffer,
            &mut self.element_buffer,
            &mut self.vertex_array,
        ]
    }
}

/// Owner of graphics-API object lifetimes and of the pipeline-state cache.
///
/// All object creation goes through the context so that handles report back
/// into its abandoned queues, and all state changes go through the cache so
/// that redundant calls are never issued.
pub struct Context {
    api: Box<dyn GraphicsApi>,
    state: ContextState,
    abandoned: SharedQueues,

    pooled_textures: Vec<TextureId>,
    texture_pool_size: usize,

    vertex_arrays: HashMap<VertexArrayKey, UniqueVertexArray>,
    vertex_arrays_supported: bool,
}

impl Context {
    pub fn new(api: Box<dyn GraphicsApi>) -> Self {
        Self::with_texture_pool_size(api, TEXTURE_POOL_SIZE)
    }

    pub fn with_texture_pool_size(api: Box<dyn GraphicsApi>, texture_pool_size: usize) -> Self {
        Self {
            api,
            state: ContextState::default(),
            abandoned: Rc::default(),
            pooled_textures: Vec::new(),
            texture_pool_size: texture_pool_size.max(1),
            vertex_arrays: HashMap::new(),
            vertex_arrays_supported: true,
        }
    }

    #[inline]
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    /// Raw API access for renderers that manage their own state.
    ///
    /// Anything changed here is invisible to the cache; call
    /// [`Context::set_dirty_state`] afterwards.
    pub fn api_mut(&mut self) -> &mut dyn GraphicsApi {
        &mut *self.api
    }

    /// Number of cached vertex-array objects.
    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    // ── object creation ────────────────────────────────────────────────────

    pub fn create_program(&mut self) -> UniqueProgram {
        let id = check_error!(self.api, self.api.create_program());
        UniqueProgram::new(id, self.abandoned.clone())
    }

    /// Creates and compiles a shader.
    pub fn create_shader(&mut self, kind: ShaderKind, source: &str) -> anyhow::Result<UniqueShader> {
        let id = check_error!(self.api, self.api.create_shader(kind));
        let shader = UniqueShader::new(id, self.abandoned.clone());

        check_error!(self.api, self.api.shader_source(id, source));
        if !check_error!(self.api, self.api.compile_shader(id)) {
            let log = self.api.shader_info_log(id);
            anyhow::bail!("{kind:?} shader failed to compile: {log}");
        }

        Ok(shader)
    }

    /// Links a vertex and a fragment shader into a new program.
    pub fn link_program(
        &mut self,
        vertex: &UniqueShader,
        fragment: &UniqueShader,
    ) -> anyhow::Result<UniqueProgram> {
        let program = self.create_program();
        let id = program.id();

        check_error!(self.api, self.api.attach_shader(id, vertex.id()));
        check_error!(self.api, self.api.attach_shader(id, fragment.id()));
        if !check_error!(self.api, self.api.link_program(id)) {
            let log = self.api.program_info_log(id);
            anyhow::bail!("program failed to link: {log}");
        }

        Ok(program)
    }

    pub fn create_vertex_buffer<V: Vertex>(&mut self, vertices: &[V]) -> VertexBuffer<V> {
        let id = check_error!(self.api, self.api.gen_buffer());
        let buffer = UniqueBuffer::new(id, self.abandoned.clone());

        self.state.vertex_buffer.set(&mut *self.api, id);
        check_error!(
            self.api,
            self.api.buffer_data(BufferTarget::Vertex, bytemuck::cast_slice(vertices))
        );

        VertexBuffer::new(vertices.len(), buffer)
    }

    pub fn create_index_buffer(&mut self, indices: &[u16]) -> IndexBuffer {
        let id = check_error!(self.api, self.api.gen_buffer());
        let buffer = UniqueBuffer::new(id, self.abandoned.clone());

        // The element binding belongs to the bound vertex array; unbind it so
        // a cached vertex array keeps its own index buffer.
        self.bind_vertex_array(0);
        self.state.element_buffer.set(&mut *self.api, id);
        check_error!(
            self.api,
            self.api.buffer_data(BufferTarget::Element, bytemuck::cast_slice(indices))
        );

        IndexBuffer { index_count: indices.len(), buffer }
    }

    /// Takes a texture name from the pool, refilling it with one batch call
    /// when empty.
    pub fn create_texture(&mut self) -> UniqueTexture {
        if self.pooled_textures.is_empty() {
            let batch = check_error!(self.api, self.api.gen_textures(self.texture_pool_size));
            log::debug!("texture pool refilled with {} names", batch.len());
            self.pooled_textures = batch;
        }

        let id = self.pooled_textures.pop().unwrap_or_else(|| {
            debug_assert!(false, "graphics API returned an empty texture batch");
            log::error!("graphics API returned an empty texture batch");
            0
        });
        UniqueTexture::new(id, self.abandoned.clone())
    }

    /// Creates an RGBA texture with edge clamping and nearest filtering.
    pub fn create_texture_with_data(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
        unit: TextureUnit,
    ) -> Texture {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);

        let texture = self.create_texture();
        self.bind_unit(unit, texture.id());

        let api = &mut *self.api;
        let parameters = [
            TextureParameter::MinFilter(TextureFilter::Nearest, TextureMipMap::No),
            TextureParameter::MagFilter(TextureFilter::Nearest),
            TextureParameter::WrapS(TextureWrap::ClampToEdge),
            TextureParameter::WrapT(TextureWrap::ClampToEdge),
        ];
        for parameter in parameters {
            check_error!(api, api.tex_parameter(parameter));
        }
        check_error!(api, api.tex_image_2d(width, height, Some(rgba)));

        Texture {
            size: [width, height],
            texture,
            filter: TextureFilter::Nearest,
            mipmap: TextureMipMap::No,
        }
    }

    /// Replaces the pixels (and possibly the size) of an existing texture.
    pub fn update_texture(
        &mut self,
        texture: &mut Texture,
        width: u32,
        height: u32,
        rgba: &[u8],
        unit: TextureUnit,
    ) {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);

        self.bind_unit(unit, texture.id());
        check_error!(self.api, self.api.tex_image_2d(width, height, Some(rgba)));
        texture.size = [width, height];
    }

    pub fn create_framebuffer(&mut self) -> UniqueFramebuffer {
        let id = check_error!(self.api, self.api.gen_framebuffer());
        UniqueFramebuffer::new(id, self.abandoned.clone())
    }

    /// Creates a framebuffer rendering into `texture`.
    pub fn create_framebuffer_with_texture(&mut self, texture: &Texture) -> Framebuffer {
        let framebuffer = self.create_framebuffer();
        self.state.bind_framebuffer.set(&mut *self.api, framebuffer.id());
        check_error!(self.api, self.api.framebuffer_texture(texture.id()));
        Framebuffer { size: texture.size, framebuffer }
    }

    // ── binding ────────────────────────────────────────────────────────────

    /// Binds `texture` to `unit`, reissuing filter parameters only when they
    /// differ from those recorded on the texture.
    pub fn bind_texture(
        &mut self,
        texture: &mut Texture,
        unit: TextureUnit,
        filter: TextureFilter,
        mipmap: TextureMipMap,
    ) {
        let id = texture.id();
        if filter != texture.filter || mipmap != texture.mipmap {
            self.bind_unit(unit, id);
            let api = &mut *self.api;
            check_error!(api, api.tex_parameter(TextureParameter::MinFilter(filter, mipmap)));
            check_error!(api, api.tex_parameter(TextureParameter::MagFilter(filter)));
            texture.filter = filter;
            texture.mipmap = mipmap;
        } else {
            let slot = &self.state.texture[usize::from(unit)];
            // Avoids selecting the unit without a following bind.
            if slot.is_dirty() || slot.current() != id {
                self.bind_unit(unit, id);
            }
        }
    }

    fn bind_unit(&mut self, unit: TextureUnit, id: TextureId) {
        debug_assert!(usize::from(unit) < TEXTURE_UNITS, "texture unit {unit} out of range");
        self.state.active_texture.set(&mut *self.api, unit);
        self.state.texture[usize::from(unit)].set(&mut *self.api, id);
    }

    fn bind_vertex_array(&mut self, id: VertexArrayId) {
        let slot = &self.state.vertex_array;
        let changed = slot.is_dirty() || slot.current() != id;
        self.state.vertex_array.set(&mut *self.api, id);
        if changed {
            self.state.element_buffer.set_dirty();
        }
    }

    pub fn set_viewport_default(&mut self, viewport: Viewport) {
        self.state.viewport.set_default_value(viewport);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport.set(&mut *self.api, viewport);
    }

    pub fn reset_viewport(&mut self) {
        self.state.viewport.reset(&mut *self.api);
    }

    pub fn reset_framebuffer(&mut self) {
        self.state.bind_framebuffer.reset(&mut *self.api);
    }

    // ── frame operations ───────────────────────────────────────────────────

    /// Clears the buffers whose value is given, forcing their write masks on.
    pub fn clear(&mut self, color: Option<Color>, depth: Option<f32>, stencil: Option<i32>) {
        let api = &mut *self.api;
        let state = &mut self.state;
        let mut mask = ClearMask::empty();

        if let Some(color) = color {
            mask |= ClearMask::COLOR;
            state.clear_color.set(api, color);
            state.color_mask.set(api, ColorMask::ALL);
        }
        if let Some(depth) = depth {
            mask |= ClearMask::DEPTH;
            state.clear_depth.set(api, depth);
            state.depth_mask.set(api, true);
        }
        if let Some(stencil) = stencil {
            mask |= ClearMask::STENCIL;
            state.clear_stencil.set(api, stencil);
            state.stencil_mask.set(api, 0xff);
        }

        if !mask.is_empty() {
            check_error!(api, api.clear(mask));
        }
    }

    pub fn draw(&mut self, drawable: &Drawable<'_>) {
        debug_assert_ne!(drawable.program, 0, "draw without a program");

        let api = &mut *self.api;
        let state = &mut self.state;

        match drawable.mode {
            DrawMode::Points { point_size } => {
                state.point_size.set(api, point_size);
            }
            DrawMode::Lines { line_width }
            | DrawMode::LineStrip { line_width } => {
                state.line_width.set(api, line_width);
            }
            _ => {}
        }

        let depth = &drawable.depth;
        if depth.is_disabled() {
            state.depth_test.set(api, false);
        } else {
            state.depth_test.set(api, true);
            state.depth_func.set(api, depth.func);
            state.depth_mask.set(api, depth.mask);
            state.depth_range.set(api, depth.range);
        }

        let stencil = &drawable.stencil;
        if stencil.is_disabled() {
            state.stencil_test.set(api, false);
        } else {
            state.stencil_test.set(api, true);
            state.stencil_func.set(
                api,
                StencilFuncValue {
                    func: stencil.test.func(),
                    reference: stencil.reference,
                    mask: stencil.test.mask(),
                },
            );
            state.stencil_mask.set(api, stencil.mask);
            state.stencil_op.set(
                api,
                StencilOpValue {
                    fail: stencil.fail,
                    depth_fail: stencil.depth_fail,
                    pass: stencil.pass,
                },
            );
        }

        let color = &drawable.color;
        match color.blend_function.parts() {
            None => state.blend.set(api, false),
            Some((equation, src, dst)) => {
                state.blend.set(api, true);
                state.blend_color.set(api, color.blend_color);
                state.blend_equation.set(api, equation);
                state.blend_func.set(api, BlendFuncValue { src, dst });
            }
        }
        state.color_mask.set(api, color.mask);

        state.program.set(api, drawable.program);
        check_error!(api, drawable.uniforms.bind(api, drawable.program));

        let primitive = drawable.mode.primitive_type();
        for segment in drawable.segments.iter() {
            self.bind_attributes(drawable, segment);

            let api = &mut *self.api;
            match drawable.index_buffer {
                Some(_) => {
                    let primitive_size = drawable.mode.primitive_size();
                    let count = primitive_size / std::mem::size_of::<u16>() * segment.index_length;
                    let offset = primitive_size * segment.index_offset;
                    check_error!(api, api.draw_elements(primitive, count as u32, offset));
                }
                None => {
                    check_error!(api, api.draw_arrays(primitive, 0, segment.vertex_length as u32));
                }
            }
        }
    }

    /// Makes the segment's attribute bindings current, reusing a cached
    /// vertex array when one matches.
    fn bind_attributes(&mut self, drawable: &Drawable<'_>, segment: &Segment) {
        let index_buffer = drawable.index_buffer.unwrap_or(0);

        if self.vertex_arrays_supported {
            let key = (drawable.program, drawable.vertex_buffer, index_buffer, segment.vertex_offset);
            if let Some(id) = self.vertex_arrays.get(&key).map(|vao| vao.id()) {
                self.bind_vertex_array(id);
                return;
            }

            match check_error!(self.api, self.api.gen_vertex_array()) {
                Some(id) => {
                    let vertex_array = UniqueVertexArray::new(id, self.abandoned.clone());
                    self.bind_vertex_array(id);
                    self.state.element_buffer.set(&mut *self.api, index_buffer);
                    self.specify_attributes(drawable, segment);
                    self.vertex_arrays.insert(key, vertex_array);
                    return;
                }
                None => {
                    log::debug!("vertex arrays unsupported; attributes are bound per draw");
                    self.vertex_arrays_supported = false;
                }
            }
        }

        self.state.element_buffer.set(&mut *self.api, index_buffer);
        self.specify_attributes(drawable, segment);
    }

    fn specify_attributes(&mut self, drawable: &Drawable<'_>, segment: &Segment) {
        let api = &mut *self.api;
        self.state.vertex_buffer.set(api, drawable.vertex_buffer);

        let base = drawable.vertex_size * segment.vertex_offset;
        for binding in drawable.attributes {
            check_error!(api, api.enable_vertex_attrib_array(binding.location));
            check_error!(
                api,
                api.vertex_attrib_pointer(
                    binding.location,
                    binding.count,
                    binding.ty,
                    drawable.vertex_size,
                    base + binding.offset,
                )
            );
        }
    }

    // ── state and lifetime management ──────────────────────────────────────

    /// Applies every slot's default value.
    pub fn reset_state(&mut self) {
        // The element binding is vertex-array state; leave cached vertex
        // arrays before it is reset.
        self.bind_vertex_array(0);

        let api = &mut *self.api;
        for slot in self.state.slots() {
            slot.reset(api);
        }
        for unit in 0..TEXTURE_UNITS {
            self.state.active_texture.set(api, unit as TextureUnit);
            self.state.texture[unit].reset(api);
        }
        self.state.active_texture.reset(api);
    }

    /// Forgets every cached value without touching the API.
    pub fn set_dirty_state(&mut self) {
        for slot in self.state.slots() {
            slot.set_dirty();
        }
        self.state.active_texture.set_dirty();
        for slot in &mut self.state.texture {
            slot.set_dirty();
        }
    }

    /// Abandons the unused pooled textures, then runs cleanup.
    pub fn reset(&mut self) {
        let pooled = std::mem::take(&mut self.pooled_textures);
        self.abandoned.borrow_mut().textures.extend(pooled);
        self.perform_cleanup();
    }

    /// Deletes every abandoned object, first invalidating cached state and
    /// vertex arrays that still name it.
    pub fn perform_cleanup(&mut self) {
        let mut queues: AbandonedQueues = std::mem::take(&mut *self.abandoned.borrow_mut());
        let api = &mut *self.api;
        let state = &mut self.state;

        if !queues.programs.is_empty() {
            for &id in &queues.programs {
                if state.program.current() == id {
                    state.program.set_dirty();
                }
            }
            self.vertex_arrays.retain(|key, _| !queues.programs.contains(&key.0));
            check_error!(api, api.delete_programs(&queues.programs));
        }

        if !queues.shaders.is_empty() {
            check_error!(api, api.delete_shaders(&queues.shaders));
        }

        if !queues.buffers.is_empty() {
            for &id in &queues.buffers {
                if state.vertex_buffer.current() == id {
                    state.vertex_buffer.set_dirty();
                }
                if state.element_buffer.current() == id {
                    state.element_buffer.set_dirty();
                }
            }
            self.vertex_arrays.retain(|key, _| {
                !queues.buffers.contains(&key.1) && !queues.buffers.contains(&key.2)
            });
            check_error!(api, api.delete_buffers(&queues.buffers));
        }

        if !queues.textures.is_empty() {
            for &id in &queues.textures {
                for slot in &mut state.texture {
                    if slot.current() == id {
                        slot.set_dirty();
                    }
                }
            }
            check_error!(api, api.delete_textures(&queues.textures));
        }

        // Cache entries dropped above land in the shared queue.
        queues
            .vertex_arrays
            .append(&mut self.abandoned.borrow_mut().vertex_arrays);
        if !queues.vertex_arrays.is_empty() {
            if queues.vertex_arrays.contains(&state.vertex_array.current()) {
                state.vertex_array.set_dirty();
                state.element_buffer.set_dirty();
            }
            check_error!(api, api.delete_vertex_arrays(&queues.vertex_arrays));
        }

        if !queues.framebuffers.is_empty() {
            if queues.framebuffers.contains(&state.bind_framebuffer.current()) {
                state.bind_framebuffer.set_dirty();
            }
            check_error!(api, api.delete_framebuffers(&queues.framebuffers));
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.vertex_arrays.clear();
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::backend::{Call, RecordingApi};
    use crate::gl::drawable::{ColorMode, Depth, Stencil};
    use crate::gl::types::{AttributeType, CompareFunc, DepthRange, StencilOpKind};
    use crate::gl::AttributeBinding;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct TestVertex {
        pos: [i16; 2],
    }

    impl Vertex for TestVertex {
        const ATTRIBUTES: &'static [AttributeBinding] =
            &[AttributeBinding { location: 0, count: 2, ty: AttributeType::I16, offset: 0 }];
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct TestUniforms {
        color: [f32; 4],
    }

    fn context() -> (Context, RecordingApi) {
        let rec = RecordingApi::new();
        (Context::new(Box::new(rec.clone())), rec)
    }

    fn vertices(ctx: &mut Context, n: usize) -> VertexBuffer<TestVertex> {
        ctx.create_vertex_buffer(&vec![TestVertex { pos: [0, 0] }; n])
    }

    fn segmented<'a>(
        program: ProgramId,
        uniforms: &'a TestUniforms,
        vbo: &VertexBuffer<TestVertex>,
        ibo: &IndexBuffer,
        segments: &'a [Segment],
    ) -> Drawable<'a> {
        Drawable::segmented(
            DrawMode::Triangles,
            Depth::disabled(),
            Stencil::disabled(),
            ColorMode::unblended(),
            program,
            uniforms,
            vbo,
            ibo,
            segments,
        )
    }

    #[test]
    fn texture_pool_refills_once_per_batch() {
        let (mut ctx, rec) = context();
        let textures: Vec<_> = (0..TEXTURE_POOL_SIZE + 1).map(|_| ctx.create_texture()).collect();

        let batches: Vec<_> = rec
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GenTextures(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(batches, vec![TEXTURE_POOL_SIZE, TEXTURE_POOL_SIZE]);
        drop(textures);
    }

    #[test]
    fn texture_pool_exhaustion_triggers_one_bulk_allocation() {
        let rec = RecordingApi::new();
        let mut ctx = Context::with_texture_pool_size(Box::new(rec.clone()), 4);
        let _first: Vec<_> = (0..4).map(|_| ctx.create_texture()).collect();
        assert_eq!(rec.count(|c| matches!(c, Call::GenTextures(_))), 1);

        let _extra = ctx.create_texture();
        assert_eq!(rec.count(|c| matches!(c, Call::GenTextures(4))), 2);
    }

    #[test]
    fn three_segments_share_one_vertex_array() {
        let (mut ctx, rec) = context();
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 12);
        let ibo = ctx.create_index_buffer(&[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        let segments = [
            Segment::new(0, 0, 12, 1),
            Segment::new(0, 1, 12, 1),
            Segment::new(0, 2, 12, 1),
        ];
        let uniforms = TestUniforms { color: [1.0; 4] };

        rec.clear_calls();
        ctx.draw(&segmented(program.id(), &uniforms, &vbo, &ibo, &segments));

        assert_eq!(ctx.vertex_array_count(), 1);
        assert_eq!(rec.count(|c| matches!(c, Call::GenVertexArray(_))), 1);
        assert_eq!(rec.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 1);
        assert_eq!(rec.count(|c| matches!(c, Call::DrawElements { .. })), 3);
        assert!(rec.calls().contains(&Call::DrawElements {
            primitive: crate::gl::PrimitiveType::Triangles,
            count: 3,
            byte_offset: 12,
        }));
    }

    #[test]
    fn attributes_are_offset_by_segment_vertex_offset() {
        let (mut ctx, rec) = context();
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 8);
        let ibo = ctx.create_index_buffer(&[0, 1, 2]);
        let segments = [Segment::new(4, 0, 4, 1)];
        let uniforms = TestUniforms { color: [0.0; 4] };

        ctx.draw(&segmented(program.id(), &uniforms, &vbo, &ibo, &segments));
        assert!(rec.calls().contains(&Call::VertexAttribPointer {
            location: 0,
            count: 2,
            ty: AttributeType::I16,
            stride: 4,
            offset: 16,
        }));
    }

    #[test]
    fn redundant_draw_state_is_not_reissued() {
        let (mut ctx, rec) = context();
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 3);
        let uniforms = TestUniforms { color: [1.0; 4] };
        let depth = Depth { func: CompareFunc::LessEqual, mask: false, range: DepthRange::FULL };
        let drawable = Drawable::unindexed(
            DrawMode::Triangles,
            depth,
            Stencil::disabled(),
            ColorMode::alpha_blended(),
            program.id(),
            &uniforms,
            &vbo,
        );

        ctx.draw(&drawable);
        rec.clear_calls();
        ctx.draw(&drawable);

        let calls = rec.calls();
        assert!(calls.iter().all(|c| matches!(
            c,
            Call::UniformBlock { .. } | Call::BindVertexArray(_) | Call::DrawArrays { .. }
        )), "unexpected calls: {calls:?}");
        assert_eq!(rec.count(|c| matches!(c, Call::DrawArrays { count: 3, .. })), 1);
    }

    #[test]
    fn clear_forces_write_masks() {
        let (mut ctx, rec) = context();
        ctx.clear(None, Some(1.0), None);
        assert_eq!(
            rec.calls(),
            vec![Call::ClearDepth(1.0), Call::DepthMask(true), Call::Clear(ClearMask::DEPTH)]
        );

        rec.clear_calls();
        ctx.clear(Some(Color::black()), None, Some(0));
        assert!(rec.calls().contains(&Call::ColorMask(ColorMask::ALL)));
        assert!(rec.calls().contains(&Call::StencilMask(0xff)));
        assert_eq!(rec.calls().last(), Some(&Call::Clear(ClearMask::COLOR | ClearMask::STENCIL)));
    }

    #[test]
    fn clear_without_buffers_issues_nothing() {
        let (mut ctx, rec) = context();
        ctx.clear(None, None, None);
        assert!(rec.calls().is_empty());
    }

    #[test]
    fn cleanup_dirties_slots_and_drops_stale_vertex_arrays() {
        let (mut ctx, rec) = context();
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 3);
        let ibo = ctx.create_index_buffer(&[0, 1, 2]);
        let segments = [Segment::new(0, 0, 3, 1)];
        let uniforms = TestUniforms { color: [1.0; 4] };
        ctx.draw(&segmented(program.id(), &uniforms, &vbo, &ibo, &segments));
        assert_eq!(ctx.vertex_array_count(), 1);
        assert!(!ctx.state().vertex_buffer.is_dirty());

        let old_vbo = vbo.id();
        drop(vbo);
        ctx.perform_cleanup();

        assert!(ctx.state().vertex_buffer.is_dirty());
        assert_eq!(ctx.vertex_array_count(), 0);
        assert!(rec.calls().contains(&Call::DeleteBuffers(vec![old_vbo])));
        assert_eq!(rec.count(|c| matches!(c, Call::DeleteVertexArrays(_))), 1);

        // The recycled buffer name must not hit the stale entry.
        let vbo = vertices(&mut ctx, 3);
        assert_eq!(vbo.id(), old_vbo);
        rec.clear_calls();
        ctx.draw(&segmented(program.id(), &uniforms, &vbo, &ibo, &segments));
        assert_eq!(rec.count(|c| matches!(c, Call::GenVertexArray(_))), 1);
        assert_eq!(rec.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 1);
    }

    #[test]
    fn cleanup_dirties_bound_texture_and_program() {
        let (mut ctx, rec) = context();
        let mut texture = ctx.create_texture_with_data(1, 1, &[255; 4], 1);
        ctx.bind_texture(&mut texture, 1, TextureFilter::Nearest, TextureMipMap::No);
        let program = ctx.create_program();
        ctx.state.program.set(&mut *ctx.api, program.id());

        drop(texture);
        drop(program);
        ctx.perform_cleanup();

        assert!(ctx.state().texture[1].is_dirty());
        assert!(ctx.state().program.is_dirty());
        assert_eq!(rec.count(|c| matches!(c, Call::DeleteTextures(ids) if ids.len() == 1)), 1);
        assert_eq!(rec.count(|c| matches!(c, Call::DeletePrograms(_))), 1);
    }

    #[test]
    fn bind_texture_reissues_filters_only_on_change() {
        let (mut ctx, rec) = context();
        let mut texture = ctx.create_texture_with_data(2, 2, &[0; 16], 0);
        rec.clear_calls();

        ctx.bind_texture(&mut texture, 0, TextureFilter::Nearest, TextureMipMap::No);
        assert_eq!(rec.count(|c| matches!(c, Call::TexParameter(_))), 0);

        ctx.bind_texture(&mut texture, 0, TextureFilter::Linear, TextureMipMap::No);
        assert_eq!(rec.count(|c| matches!(c, Call::TexParameter(_))), 2);
        assert_eq!(texture.filter, TextureFilter::Linear);

        rec.clear_calls();
        ctx.bind_texture(&mut texture, 1, TextureFilter::Linear, TextureMipMap::No);
        assert_eq!(rec.calls(), vec![Call::ActiveTexture(1), Call::BindTexture(texture.id())]);
    }

    #[test]
    fn set_dirty_state_forces_reapplication() {
        let (mut ctx, rec) = context();
        ctx.set_viewport(Viewport::sized(10, 10));
        ctx.set_viewport(Viewport::sized(10, 10));
        assert_eq!(rec.count(|c| matches!(c, Call::Viewport(_))), 1);

        ctx.set_dirty_state();
        ctx.set_viewport(Viewport::sized(10, 10));
        assert_eq!(rec.count(|c| matches!(c, Call::Viewport(_))), 2);
    }

    #[test]
    fn reset_state_applies_defaults_and_selects_units() {
        let (mut ctx, rec) = context();
        ctx.set_viewport_default(Viewport::sized(64, 32));
        ctx.reset_state();

        let calls = rec.calls();
        assert!(calls.contains(&Call::Viewport(Viewport::sized(64, 32))));
        assert!(calls.contains(&Call::Blend(true)));
        let binds: Vec<_> = calls
            .iter()
            .filter(|c| matches!(c, Call::ActiveTexture(_) | Call::BindTexture(_)))
            .cloned()
            .collect();
        assert_eq!(
            binds,
            vec![
                Call::ActiveTexture(0),
                Call::BindTexture(0),
                Call::ActiveTexture(1),
                Call::BindTexture(0),
                Call::ActiveTexture(0),
            ]
        );
    }

    #[test]
    fn reset_state_unbinds_the_vertex_array_before_the_element_buffer() {
        let (mut ctx, rec) = context();
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 3);
        let ibo = ctx.create_index_buffer(&[0, 1, 2]);
        let segments = [Segment::new(0, 0, 3, 1)];
        let uniforms = TestUniforms { color: [1.0; 4] };
        ctx.draw(&segmented(program.id(), &uniforms, &vbo, &ibo, &segments));

        rec.clear_calls();
        ctx.reset_state();

        let calls = rec.calls();
        let unbind_array = calls.iter().position(|c| *c == Call::BindVertexArray(0)).unwrap();
        let unbind_elements = calls
            .iter()
            .position(|c| *c == Call::BindBuffer(BufferTarget::Element, 0))
            .unwrap();
        assert!(unbind_array < unbind_elements, "calls: {calls:?}");
    }

    #[test]
    fn clipping_mask_stencils_enable_the_stencil_test() {
        let (mut ctx, rec) = context();
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 3);
        let uniforms = TestUniforms { color: [0.0; 4] };
        let stencil = Stencil {
            reference: 5,
            mask: 0xff,
            pass: StencilOpKind::Replace,
            ..Stencil::disabled()
        };
        let drawable = Drawable::unindexed(
            DrawMode::Triangles,
            Depth::disabled(),
            stencil,
            ColorMode::disabled(),
            program.id(),
            &uniforms,
            &vbo,
        );

        rec.clear_calls();
        ctx.draw(&drawable);

        let calls = rec.calls();
        assert!(calls.contains(&Call::StencilTest(true)));
        assert!(calls.contains(&Call::StencilFunc(CompareFunc::Always, 5, 0)));
        assert!(calls.contains(&Call::StencilMask(0xff)));
        assert!(calls.contains(&Call::StencilOp(
            StencilOpKind::Keep,
            StencilOpKind::Keep,
            StencilOpKind::Replace
        )));
    }

    #[test]
    fn reset_abandons_pooled_textures() {
        let (mut ctx, rec) = context();
        let texture = ctx.create_texture();
        ctx.reset();

        let deleted: Vec<_> = rec
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteTextures(ids) => Some(ids),
                _ => None,
            })
            .collect();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].len(), TEXTURE_POOL_SIZE - 1);
        assert!(!deleted[0].contains(&texture.id()));
    }

    #[test]
    fn draws_without_vertex_array_support_respecify_attributes() {
        let rec = RecordingApi::without_vertex_arrays();
        let mut ctx = Context::new(Box::new(rec.clone()));
        let program = ctx.create_program();
        let vbo = vertices(&mut ctx, 6);
        let ibo = ctx.create_index_buffer(&[0, 1, 2, 3, 4, 5]);
        let segments = [Segment::new(0, 0, 6, 1), Segment::new(0, 1, 6, 1)];
        let uniforms = TestUniforms { color: [1.0; 4] };

        ctx.draw(&segmented(program.id(), &uniforms, &vbo, &ibo, &segments));
        assert_eq!(ctx.vertex_array_count(), 0);
        assert_eq!(rec.count(|c| matches!(c, Call::VertexAttribPointer { .. })), 2);
        assert_eq!(rec.count(|c| matches!(c, Call::DrawElements { .. })), 2);
    }
}
