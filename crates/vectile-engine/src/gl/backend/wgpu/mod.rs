//! [`GraphicsApi`] on top of wgpu.
//!
//! wgpu has no global state machine, so this backend keeps one: object ids
//! map onto wgpu resources, state setters update a plain struct, and every
//! clear or draw snapshots that struct into a recorded command. The host
//! then calls [`WgpuApi::encode`] once per frame, which turns the recorded
//! commands into render passes on the surface (or texture) targets.
//!
//! Vertex-array objects are emulated: attribute pointers capture the buffer
//! bound to the vertex target when they are specified, and the element
//! binding lives in the bound vertex array, as in GL.

mod convert;
mod encode;

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::gl::api::{ApiError, GraphicsApi};
use crate::gl::types::{
    AttributeType, BlendEquation, BlendFactor, BufferId, BufferTarget, ClearMask, ColorMask,
    CompareFunc, DepthRange, FramebufferId, PrimitiveType, ProgramId, ShaderId, ShaderKind,
    StencilOpKind, TEXTURE_UNITS, TextureFilter, TextureId, TextureParameter,
    TextureUnit, TextureWrap, VertexArrayId, Viewport,
};
use crate::paint::Color;

use encode::Resources;

/// Size of one uniform slot; wgpu's minimum dynamic-offset alignment.
const UNIFORM_SLOT: usize = 256;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ── objects ──────────────────────────────────────────────────────────────────

struct ShaderObject {
    kind: ShaderKind,
    source: String,
    module: Option<Rc<wgpu::ShaderModule>>,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderId>,
    vertex: Option<Rc<wgpu::ShaderModule>>,
    fragment: Option<Rc<wgpu::ShaderModule>>,
    info_log: String,
    uniforms: Vec<u8>,
}

impl ProgramObject {
    fn is_linked(&self) -> bool {
        self.vertex.is_some() && self.fragment.is_some()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct SamplerKey {
    min: TextureFilter,
    mag: TextureFilter,
    wrap_s: TextureWrap,
    wrap_t: TextureWrap,
}

impl Default for SamplerKey {
    /// GL's initial texture parameters, minus mipmapping.
    fn default() -> Self {
        Self {
            min: TextureFilter::Nearest,
            mag: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
        }
    }
}

#[derive(Default)]
struct TextureObject {
    texture: Option<wgpu::Texture>,
    view: Option<Rc<wgpu::TextureView>>,
    size: [u32; 2],
    /// Bumped whenever the storage is reallocated.
    generation: u64,
    sampler: SamplerKey,
}

#[derive(Debug, Copy, Clone)]
struct AttribPointer {
    buffer: BufferId,
    count: u8,
    ty: AttributeType,
    stride: usize,
    offset: usize,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    element_buffer: BufferId,
    enabled: BTreeSet<u32>,
    attributes: BTreeMap<u32, AttribPointer>,
}

// ── recorded commands ────────────────────────────────────────────────────────

#[derive(Clone)]
enum Target {
    Surface,
    Texture { framebuffer: FramebufferId, view: Rc<wgpu::TextureView>, size: [u32; 2] },
}

impl Target {
    fn id(&self) -> FramebufferId {
        match self {
            Target::Surface => 0,
            Target::Texture { framebuffer, .. } => *framebuffer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VertexBufferKey {
    stride: u64,
    /// (location, count, type, offset relative to the buffer slice)
    attributes: Vec<(u32, u8, AttributeType, u64)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StencilKey {
    func: CompareFunc,
    read_mask: u32,
    write_mask: u32,
    fail: StencilOpKind,
    depth_fail: StencilOpKind,
    pass: StencilOpKind,
}

/// Everything that selects a distinct render pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    primitive: PrimitiveType,
    vertex_layout: Vec<VertexBufferKey>,
    /// `None` when the depth test is off.
    depth: Option<(CompareFunc, bool)>,
    stencil: Option<StencilKey>,
    blend: Option<(BlendEquation, BlendFactor, BlendFactor)>,
    color_mask: ColorMask,
    format: wgpu::TextureFormat,
}

#[derive(Clone)]
struct BoundTexture {
    id: TextureId,
    generation: u64,
    view: Rc<wgpu::TextureView>,
    sampler: SamplerKey,
}

#[derive(Debug, Copy, Clone)]
enum DrawRange {
    Arrays { first: u32, count: u32 },
    Elements { first: u32, count: u32 },
}

struct DrawCommand {
    target: Target,
    pipeline: PipelineKey,
    vertex_module: Rc<wgpu::ShaderModule>,
    fragment_module: Rc<wgpu::ShaderModule>,
    vertex_buffers: Vec<(Rc<wgpu::Buffer>, u64)>,
    index_buffer: Option<Rc<wgpu::Buffer>>,
    range: DrawRange,
    uniform_offset: u32,
    textures: [Option<BoundTexture>; TEXTURE_UNITS],
    viewport: Viewport,
    depth_range: DepthRange,
    stencil_reference: u32,
    blend_constant: wgpu::Color,
}

struct ClearCommand {
    target: Target,
    color: Option<wgpu::Color>,
    depth: Option<f32>,
    stencil: Option<u32>,
}

enum Command {
    Clear(ClearCommand),
    Draw(Box<DrawCommand>),
}

// ── raw state ────────────────────────────────────────────────────────────────

/// The GL-style current state, initialised to GL's defaults.
struct RawState {
    stencil_test: bool,
    stencil_func: (CompareFunc, i32, u32),
    stencil_mask: u32,
    stencil_op: (StencilOpKind, StencilOpKind, StencilOpKind),
    depth_test: bool,
    depth_func: CompareFunc,
    depth_mask: bool,
    depth_range: DepthRange,
    blend: bool,
    blend_equation: BlendEquation,
    blend_func: (BlendFactor, BlendFactor),
    blend_color: Color,
    color_mask: ColorMask,
    clear_color: Color,
    clear_depth: f32,
    clear_stencil: i32,
    program: ProgramId,
    active_unit: TextureUnit,
    units: [TextureId; TEXTURE_UNITS],
    framebuffer: FramebufferId,
    viewport: Viewport,
    array_buffer: BufferId,
    vertex_array: VertexArrayId,
}

impl Default for RawState {
    fn default() -> Self {
        let keep = StencilOpKind::Keep;
        Self {
            stencil_test: false,
            stencil_func: (CompareFunc::Always, 0, !0),
            stencil_mask: !0,
            stencil_op: (keep, keep, keep),
            depth_test: false,
            depth_func: CompareFunc::Less,
            depth_mask: true,
            depth_range: DepthRange::FULL,
            blend: false,
            blend_equation: BlendEquation::Add,
            blend_func: (BlendFactor::One, BlendFactor::Zero),
            blend_color: Color::transparent(),
            color_mask: ColorMask::ALL,
            clear_color: Color::transparent(),
            clear_depth: 1.0,
            clear_stencil: 0,
            program: 0,
            active_unit: 0,
            units: [0; TEXTURE_UNITS],
            framebuffer: 0,
            viewport: Viewport::default(),
            array_buffer: 0,
            vertex_array: 0,
        }
    }
}

// ── backend ──────────────────────────────────────────────────────────────────

struct WgpuState {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    color_format: wgpu::TextureFormat,

    errors: VecDeque<ApiError>,
    next_id: u32,

    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    buffers: HashMap<BufferId, Option<Rc<wgpu::Buffer>>>,
    textures: HashMap<TextureId, TextureObject>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayObject>,
    framebuffers: HashMap<FramebufferId, Option<TextureId>>,

    raw: RawState,
    commands: Vec<Command>,
    uniforms: Vec<u8>,

    resources: Resources,
}

/// Cloneable handle: the painter's context owns one clone as its
/// `Box<dyn GraphicsApi>`, the host keeps another to encode frames.
#[derive(Clone)]
pub struct WgpuApi {
    inner: Rc<RefCell<WgpuState>>,
}

impl WgpuApi {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let resources = Resources::new(&device, &queue);

        let mut vertex_arrays = HashMap::new();
        vertex_arrays.insert(0, VertexArrayObject::default());

        let state = WgpuState {
            device,
            queue,
            color_format,
            errors: VecDeque::new(),
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            vertex_arrays,
            framebuffers: HashMap::new(),
            raw: RawState::default(),
            commands: Vec::new(),
            uniforms: Vec::new(),
            resources,
        };

        Self { inner: Rc::new(RefCell::new(state)) }
    }

    /// Must be called when the surface is reconfigured with another format.
    pub fn set_color_format(&self, format: wgpu::TextureFormat) {
        self.inner.borrow_mut().color_format = format;
    }

    /// Encodes every recorded command into `encoder`. Framebuffer 0 renders
    /// into `view`, which must have the configured color format and `size`.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size: [u32; 2],
    ) {
        self.inner.borrow_mut().encode(encoder, view, size);
    }
}

impl WgpuState {
    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn error(&mut self, error: ApiError) {
        self.errors.push_back(error);
    }

    fn bound_texture_mut(&mut self) -> Option<&mut TextureObject> {
        let id = self.raw.units[usize::from(self.raw.active_unit)];
        self.textures.get_mut(&id)
    }

    fn target(&self) -> Result<Target, ApiError> {
        let framebuffer = self.raw.framebuffer;
        if framebuffer == 0 {
            return Ok(Target::Surface);
        }

        let texture = self
            .framebuffers
            .get(&framebuffer)
            .copied()
            .flatten()
            .and_then(|id| self.textures.get(&id))
            .ok_or(ApiError::InvalidFramebufferOperation)?;
        let view = texture.view.clone().ok_or(ApiError::InvalidFramebufferOperation)?;
        Ok(Target::Texture { framebuffer, view, size: texture.size })
    }

    fn target_format(&self, target: &Target) -> wgpu::TextureFormat {
        match target {
            Target::Surface => self.color_format,
            Target::Texture { .. } => TEXTURE_FORMAT,
        }
    }

    fn record_clear(&mut self, mask: ClearMask) {
        let target = match self.target() {
            Ok(target) => target,
            Err(err) => return self.error(err),
        };

        let raw = &self.raw;
        let clear = ClearCommand {
            target,
            color: mask.contains(ClearMask::COLOR).then(|| raw.clear_color.to_wgpu()),
            depth: mask.contains(ClearMask::DEPTH).then_some(raw.clear_depth.clamp(0.0, 1.0)),
            stencil: mask.contains(ClearMask::STENCIL).then_some(raw.clear_stencil as u32 & 0xff),
        };
        self.commands.push(Command::Clear(clear));
    }

    fn record_draw(&mut self, primitive: PrimitiveType, range: DrawRange) {
        match self.snapshot_draw(primitive, range) {
            Ok(Some((mut draw, uniforms))) => {
                draw.uniform_offset = self.push_uniforms(&uniforms);
                self.commands.push(Command::Draw(Box::new(draw)));
            }
            Ok(None) => {}
            Err(err) => self.error(err),
        }
    }

    /// Appends one 256-byte-aligned slot and returns its offset.
    fn push_uniforms(&mut self, data: &[u8]) -> u32 {
        let offset = self.uniforms.len();
        let len = data.len().max(1).div_ceil(UNIFORM_SLOT) * UNIFORM_SLOT;
        self.uniforms.extend_from_slice(data);
        self.uniforms.resize(offset + len, 0);
        offset as u32
    }

    /// Captures the current state as a draw. `Ok(None)` skips a draw the
    /// backend cannot express.
    fn snapshot_draw(
        &self,
        primitive: PrimitiveType,
        range: DrawRange,
    ) -> Result<Option<(DrawCommand, Vec<u8>)>, ApiError> {
        let raw = &self.raw;

        let program = self.programs.get(&raw.program).ok_or(ApiError::InvalidOperation)?;
        let (Some(vertex_module), Some(fragment_module)) =
            (program.vertex.clone(), program.fragment.clone())
        else {
            return Err(ApiError::InvalidOperation);
        };

        let vertex_array = self
            .vertex_arrays
            .get(&raw.vertex_array)
            .ok_or(ApiError::InvalidOperation)?;

        // Attributes sharing a buffer and stride become one vertex buffer slot.
        let mut groups: Vec<(BufferId, usize, Vec<(u32, AttribPointer)>)> = Vec::new();
        for location in &vertex_array.enabled {
            let pointer = *vertex_array
                .attributes
                .get(location)
                .ok_or(ApiError::InvalidOperation)?;
            if convert::vertex_format(pointer.count, pointer.ty).is_none() {
                log::warn!(
                    "skipping draw: no vertex format for {}x{:?} at location {location}",
                    pointer.count,
                    pointer.ty
                );
                return Ok(None);
            }
            match groups
                .iter_mut()
                .find(|(buffer, stride, _)| *buffer == pointer.buffer && *stride == pointer.stride)
            {
                Some((_, _, attributes)) => attributes.push((*location, pointer)),
                None => groups.push((pointer.buffer, pointer.stride, vec![(*location, pointer)])),
            }
        }

        let mut vertex_layout = Vec::with_capacity(groups.len());
        let mut vertex_buffers = Vec::with_capacity(groups.len());
        for (buffer, stride, attributes) in groups {
            let buffer = self
                .buffers
                .get(&buffer)
                .cloned()
                .flatten()
                .ok_or(ApiError::InvalidOperation)?;
            let base = attributes.iter().map(|(_, p)| p.offset).min().unwrap_or(0);
            vertex_layout.push(VertexBufferKey {
                stride: stride as u64,
                attributes: attributes
                    .iter()
                    .map(|(location, p)| (*location, p.count, p.ty, (p.offset - base) as u64))
                    .collect(),
            });
            vertex_buffers.push((buffer, base as u64));
        }

        let index_buffer = match range {
            DrawRange::Elements { .. } => Some(
                self.buffers
                    .get(&vertex_array.element_buffer)
                    .cloned()
                    .flatten()
                    .ok_or(ApiError::InvalidOperation)?,
            ),
            DrawRange::Arrays { .. } => None,
        };

        let mut textures: [Option<BoundTexture>; TEXTURE_UNITS] = Default::default();
        for (slot, &id) in textures.iter_mut().zip(&raw.units) {
            *slot = self.textures.get(&id).and_then(|texture| {
                Some(BoundTexture {
                    id,
                    generation: texture.generation,
                    view: texture.view.clone()?,
                    sampler: texture.sampler,
                })
            });
        }

        let target = self.target()?;
        let pipeline = PipelineKey {
            program: raw.program,
            primitive,
            vertex_layout,
            depth: raw.depth_test.then_some((raw.depth_func, raw.depth_mask)),
            stencil: raw.stencil_test.then_some(StencilKey {
                func: raw.stencil_func.0,
                read_mask: raw.stencil_func.2 & 0xff,
                write_mask: raw.stencil_mask & 0xff,
                fail: raw.stencil_op.0,
                depth_fail: raw.stencil_op.1,
                pass: raw.stencil_op.2,
            }),
            blend: raw
                .blend
                .then_some((raw.blend_equation, raw.blend_func.0, raw.blend_func.1)),
            color_mask: raw.color_mask,
            format: self.target_format(&target),
        };

        let draw = DrawCommand {
            target,
            pipeline,
            vertex_module,
            fragment_module,
            vertex_buffers,
            index_buffer,
            range,
            uniform_offset: 0,
            textures,
            viewport: raw.viewport,
            depth_range: raw.depth_range,
            stencil_reference: (raw.stencil_func.1 as u32) & 0xff,
            blend_constant: raw.blend_color.to_wgpu(),
        };
        Ok(Some((draw, program.uniforms.clone())))
    }
}

impl GraphicsApi for WgpuApi {
    fn get_error(&mut self) -> Option<ApiError> {
        self.inner.borrow_mut().errors.pop_front()
    }

    // ── objects ──────────────────────────────────────────────────────────────

    fn create_program(&mut self) -> ProgramId {
        let mut s = self.inner.borrow_mut();
        let id = s.alloc_id();
        s.programs.insert(id, ProgramObject::default());
        id
    }

    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId {
        let mut s = self.inner.borrow_mut();
        let id = s.alloc_id();
        s.shaders.insert(id, ShaderObject { kind, source: String::new(), module: None });
        id
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        let mut s = self.inner.borrow_mut();
        match s.shaders.get_mut(&shader) {
            Some(object) => object.source = source.to_owned(),
            None => s.error(ApiError::InvalidValue),
        }
    }

    /// Validation failures surface through the device's error handler; a
    /// module is always produced.
    fn compile_shader(&mut self, shader: ShaderId) -> bool {
        let mut s = self.inner.borrow_mut();
        let device = s.device.clone();
        let Some(object) = s.shaders.get_mut(&shader) else {
            s.error(ApiError::InvalidValue);
            return false;
        };
        if object.source.is_empty() {
            return false;
        }

        let label = match object.kind {
            ShaderKind::Vertex => "vectile vertex shader",
            ShaderKind::Fragment => "vectile fragment shader",
        };
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(object.source.clone())),
        });
        object.module = Some(Rc::new(module));
        true
    }

    fn shader_info_log(&mut self, shader: ShaderId) -> String {
        let s = self.inner.borrow();
        match s.shaders.get(&shader) {
            Some(object) if object.source.is_empty() => "empty shader source".to_owned(),
            Some(_) => String::new(),
            None => format!("no shader {shader}"),
        }
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        let mut s = self.inner.borrow_mut();
        if !s.shaders.contains_key(&shader) {
            return s.error(ApiError::InvalidValue);
        }
        match s.programs.get_mut(&program) {
            Some(object) => object.attached.push(shader),
            None => s.error(ApiError::InvalidValue),
        }
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        let mut s = self.inner.borrow_mut();
        let Some(attached) = s.programs.get(&program).map(|p| p.attached.clone()) else {
            s.error(ApiError::InvalidValue);
            return false;
        };

        let module_of = |kind: ShaderKind| {
            attached
                .iter()
                .filter_map(|id| s.shaders.get(id))
                .find(|shader| shader.kind == kind)
                .and_then(|shader| shader.module.clone())
        };
        let vertex = module_of(ShaderKind::Vertex);
        let fragment = module_of(ShaderKind::Fragment);

        let Some(object) = s.programs.get_mut(&program) else { return false };
        object.info_log = match (&vertex, &fragment) {
            (None, _) => "no compiled vertex shader attached".to_owned(),
            (_, None) => "no compiled fragment shader attached".to_owned(),
            _ => String::new(),
        };
        object.vertex = vertex;
        object.fragment = fragment;
        object.is_linked()
    }

    fn program_info_log(&mut self, program: ProgramId) -> String {
        let s = self.inner.borrow();
        s.programs.get(&program).map(|p| p.info_log.clone()).unwrap_or_default()
    }

    fn gen_buffer(&mut self) -> BufferId {
        let mut s = self.inner.borrow_mut();
        let id = s.alloc_id();
        s.buffers.insert(id, None);
        id
    }

    /// Always allocates a fresh wgpu buffer, so draws recorded earlier in
    /// the frame keep the previous contents.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8]) {
        let mut s = self.inner.borrow_mut();
        let id = match target {
            BufferTarget::Vertex => s.raw.array_buffer,
            BufferTarget::Element => s
                .vertex_arrays
                .get(&s.raw.vertex_array)
                .map_or(0, |vao| vao.element_buffer),
        };
        if !s.buffers.contains_key(&id) {
            return s.error(ApiError::InvalidOperation);
        }
        if data.is_empty() {
            s.buffers.insert(id, None);
            return;
        }

        // Copies must be 4-byte aligned; pad odd-sized index data.
        let mut contents = Cow::Borrowed(data);
        if data.len() % 4 != 0 {
            let mut padded = data.to_vec();
            padded.resize(data.len().next_multiple_of(4), 0);
            contents = Cow::Owned(padded);
        }

        let buffer = s.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vectile buffer"),
            contents: &contents,
            usage: wgpu::BufferUsages::VERTEX
                | wgpu::BufferUsages::INDEX
                | wgpu::BufferUsages::COPY_DST,
        });
        s.buffers.insert(id, Some(Rc::new(buffer)));
    }

    fn gen_textures(&mut self, count: usize) -> Vec<TextureId> {
        let mut s = self.inner.borrow_mut();
        (0..count)
            .map(|_| {
                let id = s.alloc_id();
                s.textures.insert(id, TextureObject::default());
                id
            })
            .collect()
    }

    fn gen_vertex_array(&mut self) -> Option<VertexArrayId> {
        let mut s = self.inner.borrow_mut();
        let id = s.alloc_id();
        s.vertex_arrays.insert(id, VertexArrayObject::default());
        Some(id)
    }

    fn gen_framebuffer(&mut self) -> FramebufferId {
        let mut s = self.inner.borrow_mut();
        let id = s.alloc_id();
        s.framebuffers.insert(id, None);
        id
    }

    fn framebuffer_texture(&mut self, texture: TextureId) {
        let mut s = self.inner.borrow_mut();
        let framebuffer = s.raw.framebuffer;
        if framebuffer == 0 || !s.textures.contains_key(&texture) {
            return s.error(ApiError::InvalidOperation);
        }
        s.framebuffers.insert(framebuffer, Some(texture));
    }

    fn delete_programs(&mut self, ids: &[ProgramId]) {
        let mut s = self.inner.borrow_mut();
        for id in ids {
            s.programs.remove(id);
            if s.raw.program == *id {
                s.raw.program = 0;
            }
        }
        s.resources.forget_programs(ids);
    }

    fn delete_shaders(&mut self, ids: &[ShaderId]) {
        let mut s = self.inner.borrow_mut();
        for id in ids {
            s.shaders.remove(id);
        }
    }

    fn delete_buffers(&mut self, ids: &[BufferId]) {
        let mut s = self.inner.borrow_mut();
        for id in ids {
            s.buffers.remove(id);
            if s.raw.array_buffer == *id {
                s.raw.array_buffer = 0;
            }
            let bound = s.raw.vertex_array;
            if let Some(vao) = s.vertex_arrays.get_mut(&bound)
                && vao.element_buffer == *id
            {
                vao.element_buffer = 0;
            }
        }
    }

    fn delete_textures(&mut self, ids: &[TextureId]) {
        let mut s = self.inner.borrow_mut();
        for id in ids {
            s.textures.remove(id);
            for unit in &mut s.raw.units {
                if *unit == *id {
                    *unit = 0;
                }
            }
        }
    }

    fn delete_vertex_arrays(&mut self, ids: &[VertexArrayId]) {
        let mut s = self.inner.borrow_mut();
        for &id in ids.iter().filter(|&&id| id != 0) {
            s.vertex_arrays.remove(&id);
            if s.raw.vertex_array == id {
                s.raw.vertex_array = 0;
            }
        }
    }

    fn delete_framebuffers(&mut self, ids: &[FramebufferId]) {
        let mut s = self.inner.borrow_mut();
        for id in ids {
            s.framebuffers.remove(id);
            if s.raw.framebuffer == *id {
                s.raw.framebuffer = 0;
            }
        }
    }

    // ── pipeline state ───────────────────────────────────────────────────────

    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.inner.borrow_mut().raw.stencil_func = (func, reference, mask);
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.inner.borrow_mut().raw.stencil_mask = mask;
    }

    fn stencil_test(&mut self, enabled: bool) {
        self.inner.borrow_mut().raw.stencil_test = enabled;
    }

    fn stencil_op(&mut self, fail: StencilOpKind, depth_fail: StencilOpKind, pass: StencilOpKind) {
        self.inner.borrow_mut().raw.stencil_op = (fail, depth_fail, pass);
    }

    fn depth_range(&mut self, range: DepthRange) {
        let mut s = self.inner.borrow_mut();
        s.raw.depth_range = DepthRange {
            near: range.near.clamp(0.0, 1.0),
            far: range.far.clamp(0.0, 1.0),
        };
    }

    fn depth_mask(&mut self, enabled: bool) {
        self.inner.borrow_mut().raw.depth_mask = enabled;
    }

    fn depth_test(&mut self, enabled: bool) {
        self.inner.borrow_mut().raw.depth_test = enabled;
    }

    fn depth_func(&mut self, func: CompareFunc) {
        self.inner.borrow_mut().raw.depth_func = func;
    }

    fn blend(&mut self, enabled: bool) {
        self.inner.borrow_mut().raw.blend = enabled;
    }

    fn blend_equation(&mut self, equation: BlendEquation) {
        self.inner.borrow_mut().raw.blend_equation = equation;
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.inner.borrow_mut().raw.blend_func = (src, dst);
    }

    fn blend_color(&mut self, color: Color) {
        self.inner.borrow_mut().raw.blend_color = color;
    }

    fn color_mask(&mut self, mask: ColorMask) {
        self.inner.borrow_mut().raw.color_mask = mask;
    }

    fn clear_depth(&mut self, depth: f32) {
        self.inner.borrow_mut().raw.clear_depth = depth;
    }

    fn clear_color(&mut self, color: Color) {
        self.inner.borrow_mut().raw.clear_color = color;
    }

    fn clear_stencil(&mut self, value: i32) {
        self.inner.borrow_mut().raw.clear_stencil = value;
    }

    fn use_program(&mut self, program: ProgramId) {
        let mut s = self.inner.borrow_mut();
        if program != 0 && !s.programs.contains_key(&program) {
            return s.error(ApiError::InvalidValue);
        }
        s.raw.program = program;
    }

    // Point size and line width are fixed at 1 in wgpu.
    fn point_size(&mut self, _size: f32) {}

    fn line_width(&mut self, _width: f32) {}

    fn active_texture(&mut self, unit: TextureUnit) {
        let mut s = self.inner.borrow_mut();
        if usize::from(unit) >= TEXTURE_UNITS {
            return s.error(ApiError::InvalidEnum);
        }
        s.raw.active_unit = unit;
    }

    fn bind_texture(&mut self, texture: TextureId) {
        let mut s = self.inner.borrow_mut();
        if texture != 0 && !s.textures.contains_key(&texture) {
            return s.error(ApiError::InvalidOperation);
        }
        let unit = usize::from(s.raw.active_unit);
        s.raw.units[unit] = texture;
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferId) {
        let mut s = self.inner.borrow_mut();
        if framebuffer != 0 && !s.framebuffers.contains_key(&framebuffer) {
            return s.error(ApiError::InvalidOperation);
        }
        s.raw.framebuffer = framebuffer;
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.inner.borrow_mut().raw.viewport = viewport;
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferId) {
        let mut s = self.inner.borrow_mut();
        if buffer != 0 && !s.buffers.contains_key(&buffer) {
            return s.error(ApiError::InvalidOperation);
        }
        match target {
            BufferTarget::Vertex => s.raw.array_buffer = buffer,
            BufferTarget::Element => {
                let bound = s.raw.vertex_array;
                if let Some(vao) = s.vertex_arrays.get_mut(&bound) {
                    vao.element_buffer = buffer;
                }
            }
        }
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        let mut s = self.inner.borrow_mut();
        if !s.vertex_arrays.contains_key(&vertex_array) {
            return s.error(ApiError::InvalidOperation);
        }
        s.raw.vertex_array = vertex_array;
    }

    // ── textures ─────────────────────────────────────────────────────────────

    fn tex_parameter(&mut self, parameter: TextureParameter) {
        let mut s = self.inner.borrow_mut();
        let Some(texture) = s.bound_texture_mut() else {
            return s.error(ApiError::InvalidOperation);
        };
        match parameter {
            // Storage has a single level, so the mipmap flag has nothing to select.
            TextureParameter::MinFilter(filter, _) => texture.sampler.min = filter,
            TextureParameter::MagFilter(filter) => texture.sampler.mag = filter,
            TextureParameter::WrapS(wrap) => texture.sampler.wrap_s = wrap,
            TextureParameter::WrapT(wrap) => texture.sampler.wrap_t = wrap,
        }
    }

    fn tex_image_2d(&mut self, width: u32, height: u32, rgba: Option<&[u8]>) {
        let mut s = self.inner.borrow_mut();
        if width == 0 || height == 0 {
            return s.error(ApiError::InvalidValue);
        }
        if rgba.is_some_and(|data| data.len() != (width * height * 4) as usize) {
            return s.error(ApiError::InvalidValue);
        }

        let device = s.device.clone();
        let queue = s.queue.clone();
        let Some(texture) = s.bound_texture_mut() else {
            return s.error(ApiError::InvalidOperation);
        };

        let extent = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        if texture.texture.is_none() || texture.size != [width, height] {
            let storage = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("vectile texture"),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            texture.view = Some(Rc::new(storage.create_view(&wgpu::TextureViewDescriptor::default())));
            texture.texture = Some(storage);
            texture.size = [width, height];
            texture.generation += 1;
        }

        if let (Some(data), Some(storage)) = (rgba, texture.texture.as_ref()) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: storage,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                extent,
            );
        }
    }

    // ── draws ────────────────────────────────────────────────────────────────

    fn uniform_block(&mut self, program: ProgramId, data: &[u8]) {
        let mut s = self.inner.borrow_mut();
        if data.len() > UNIFORM_SLOT {
            return s.error(ApiError::InvalidValue);
        }
        match s.programs.get_mut(&program) {
            Some(object) => {
                object.uniforms.clear();
                object.uniforms.extend_from_slice(data);
            }
            None => s.error(ApiError::InvalidOperation),
        }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        let mut s = self.inner.borrow_mut();
        let bound = s.raw.vertex_array;
        if let Some(vao) = s.vertex_arrays.get_mut(&bound) {
            vao.enabled.insert(location);
        }
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        count: u8,
        ty: AttributeType,
        stride: usize,
        offset: usize,
    ) {
        let mut s = self.inner.borrow_mut();
        let buffer = s.raw.array_buffer;
        if buffer == 0 || !(1..=4).contains(&count) {
            return s.error(ApiError::InvalidValue);
        }
        let bound = s.raw.vertex_array;
        if let Some(vao) = s.vertex_arrays.get_mut(&bound) {
            vao.attributes.insert(location, AttribPointer { buffer, count, ty, stride, offset });
        }
    }

    fn clear(&mut self, mask: ClearMask) {
        self.inner.borrow_mut().record_clear(mask);
    }

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) {
        if count == 0 {
            return;
        }
        self.inner.borrow_mut().record_draw(primitive, DrawRange::Arrays { first, count });
    }

    fn draw_elements(&mut self, primitive: PrimitiveType, count: u32, byte_offset: usize) {
        if count == 0 {
            return;
        }
        let first = (byte_offset / std::mem::size_of::<u16>()) as u32;
        self.inner.borrow_mut().record_draw(primitive, DrawRange::Elements { first, count });
    }
}
