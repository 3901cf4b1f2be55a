use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;
use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::gl::types::{ProgramId, TEXTURE_UNITS, TextureId};

use super::{
    Command, DrawCommand, DrawRange, PipelineKey, SamplerKey, Target, UNIFORM_SLOT, WgpuState,
    convert,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Per-unit texture identity used to share bind groups within a frame.
type TextureBindingKey = [Option<(TextureId, u64, SamplerKey)>; TEXTURE_UNITS];

/// Long-lived wgpu objects shared by every draw.
pub(super) struct Resources {
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    pipelines: HashMap<PipelineKey, Rc<wgpu::RenderPipeline>>,
    samplers: HashMap<SamplerKey, Rc<wgpu::Sampler>>,
    placeholder: wgpu::TextureView,

    uniform_buffer: Option<wgpu::Buffer>,
    uniform_capacity: u64,

    depth_targets: HashMap<[u32; 2], Rc<wgpu::TextureView>>,
}

impl Resources {
    pub(super) fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vectile uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("vectile texture bgl"),
            entries: &[texture_entry(0), sampler_entry(1), texture_entry(2), sampler_entry(3)],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vectile pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        // Sampled by units with nothing bound.
        let placeholder = device
            .create_texture_with_data(
                queue,
                &wgpu::TextureDescriptor {
                    label: Some("vectile placeholder texture"),
                    size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: super::TEXTURE_FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                &[0, 0, 0, 0],
            )
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            uniform_layout,
            texture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            placeholder,
            uniform_buffer: None,
            uniform_capacity: 0,
            depth_targets: HashMap::new(),
        }
    }

    /// Drops cached pipelines of deleted programs.
    pub(super) fn forget_programs(&mut self, programs: &[ProgramId]) {
        self.pipelines.retain(|key, _| !programs.contains(&key.program));
    }

    /// Uploads this frame's uniform slots and binds the buffer with a
    /// 256-byte window.
    fn upload_uniforms(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
    ) -> wgpu::BindGroup {
        let needed = (data.len().max(UNIFORM_SLOT) as u64).next_power_of_two();
        if self.uniform_capacity < needed {
            self.uniform_buffer = None;
        }
        let capacity = &mut self.uniform_capacity;
        let buffer = self.uniform_buffer.get_or_insert_with(|| {
            log::debug!("uniform buffer grown to {needed} bytes");
            *capacity = needed;
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("vectile uniforms"),
                size: needed,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        if !data.is_empty() {
            queue.write_buffer(buffer, 0, data);
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vectile uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_SLOT as u64),
                }),
            }],
        })
    }

    fn sampler(&mut self, device: &wgpu::Device, key: SamplerKey) -> Rc<wgpu::Sampler> {
        self.samplers
            .entry(key)
            .or_insert_with(|| {
                Rc::new(device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("vectile sampler"),
                    address_mode_u: convert::address_mode(key.wrap_s),
                    address_mode_v: convert::address_mode(key.wrap_t),
                    mag_filter: convert::filter(key.mag),
                    min_filter: convert::filter(key.min),
                    ..Default::default()
                }))
            })
            .clone()
    }

    fn texture_group(
        &mut self,
        device: &wgpu::Device,
        cache: &mut HashMap<TextureBindingKey, Rc<wgpu::BindGroup>>,
        draw: &DrawCommand,
    ) -> Rc<wgpu::BindGroup> {
        let key: TextureBindingKey = std::array::from_fn(|unit| {
            draw.textures[unit].as_ref().map(|t| (t.id, t.generation, t.sampler))
        });
        if let Some(group) = cache.get(&key) {
            return group.clone();
        }

        let samplers: [Rc<wgpu::Sampler>; TEXTURE_UNITS] = std::array::from_fn(|unit| {
            let key = draw.textures[unit].as_ref().map(|t| t.sampler).unwrap_or_default();
            self.sampler(device, key)
        });
        let views: [&wgpu::TextureView; TEXTURE_UNITS] = std::array::from_fn(|unit| {
            draw.textures[unit].as_ref().map_or(&self.placeholder, |t| &*t.view)
        });

        let group = Rc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("vectile texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&samplers[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&samplers[1]),
                },
            ],
        }));
        cache.insert(key, group.clone());
        group
    }

    fn pipeline(&mut self, device: &wgpu::Device, draw: &DrawCommand) -> Rc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(&draw.pipeline) {
            return pipeline.clone();
        }
        let key = &draw.pipeline;

        // Formats were validated when the draw was recorded.
        let attributes: Vec<Vec<wgpu::VertexAttribute>> = key
            .vertex_layout
            .iter()
            .map(|buffer| {
                buffer
                    .attributes
                    .iter()
                    .filter_map(|&(location, count, ty, offset)| {
                        Some(wgpu::VertexAttribute {
                            format: convert::vertex_format(count, ty)?,
                            offset,
                            shader_location: location,
                        })
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .vertex_layout
            .iter()
            .zip(&attributes)
            .map(|(buffer, attributes)| wgpu::VertexBufferLayout {
                array_stride: buffer.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let (depth_compare, depth_write_enabled) = match key.depth {
            Some((func, mask)) => (convert::compare(func), mask),
            None => (wgpu::CompareFunction::Always, false),
        };
        let stencil = match key.stencil {
            Some(stencil) => {
                let face = wgpu::StencilFaceState {
                    compare: convert::compare(stencil.func),
                    fail_op: convert::stencil_op(stencil.fail),
                    depth_fail_op: convert::stencil_op(stencil.depth_fail),
                    pass_op: convert::stencil_op(stencil.pass),
                };
                wgpu::StencilState {
                    front: face,
                    back: face,
                    read_mask: stencil.read_mask,
                    write_mask: stencil.write_mask,
                }
            }
            None => wgpu::StencilState::default(),
        };

        log::debug!(
            "creating pipeline for program {} ({:?}, {} vertex buffers)",
            key.program,
            key.primitive,
            buffers.len()
        );
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("vectile pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &draw.vertex_module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &draw.fragment_module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: key
                        .blend
                        .map(|(equation, src, dst)| convert::blend_state(equation, src, dst)),
                    write_mask: convert::color_writes(key.color_mask),
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: convert::topology(key.primitive),
                strip_index_format: convert::strip_index_format(key.primitive),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare,
                stencil,
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        let pipeline = Rc::new(pipeline);
        self.pipelines.insert(key.clone(), pipeline.clone());
        pipeline
    }

    fn depth_target(&mut self, device: &wgpu::Device, size: [u32; 2]) -> Rc<wgpu::TextureView> {
        self.depth_targets
            .entry(size)
            .or_insert_with(|| {
                log::debug!("creating {}x{} depth-stencil target", size[0], size[1]);
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("vectile depth-stencil"),
                    size: wgpu::Extent3d {
                        width: size[0].max(1),
                        height: size[1].max(1),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: DEPTH_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });
                Rc::new(texture.create_view(&wgpu::TextureViewDescriptor::default()))
            })
            .clone()
    }
}

/// One render pass: a target, its load operations and a run of draws.
struct PassPlan {
    target: Target,
    color: wgpu::LoadOp<wgpu::Color>,
    depth: wgpu::LoadOp<f32>,
    stencil: wgpu::LoadOp<u32>,
    draws: Range<usize>,
}

impl PassPlan {
    fn new(target: Target, at: usize) -> Self {
        Self {
            target,
            color: wgpu::LoadOp::Load,
            depth: wgpu::LoadOp::Load,
            stencil: wgpu::LoadOp::Load,
            draws: at..at,
        }
    }
}

/// Splits commands into passes. Clears that precede any draw of a pass
/// become its load operations; a clear after draws, or a change of target,
/// starts a new pass.
fn plan_passes(commands: &[Command]) -> Vec<PassPlan> {
    let mut passes: Vec<PassPlan> = Vec::new();

    for (index, command) in commands.iter().enumerate() {
        match command {
            Command::Clear(clear) => {
                let reusable = passes
                    .last()
                    .is_some_and(|p| p.draws.is_empty() && p.target.id() == clear.target.id());
                if !reusable {
                    passes.push(PassPlan::new(clear.target.clone(), index + 1));
                }
                if let Some(pass) = passes.last_mut() {
                    if let Some(color) = clear.color {
                        pass.color = wgpu::LoadOp::Clear(color);
                    }
                    if let Some(depth) = clear.depth {
                        pass.depth = wgpu::LoadOp::Clear(depth);
                    }
                    if let Some(stencil) = clear.stencil {
                        pass.stencil = wgpu::LoadOp::Clear(stencil);
                    }
                    pass.draws = index + 1..index + 1;
                }
            }
            Command::Draw(draw) => {
                let continues = passes.last().is_some_and(|p| {
                    p.target.id() == draw.target.id() && p.draws.end == index
                });
                if !continues {
                    passes.push(PassPlan::new(draw.target.clone(), index));
                }
                if let Some(pass) = passes.last_mut() {
                    pass.draws.end = index + 1;
                }
            }
        }
    }

    passes
}

/// Pipeline and texture bindings resolved for one draw.
struct Resolved {
    pipeline: Rc<wgpu::RenderPipeline>,
    textures: Rc<wgpu::BindGroup>,
}

impl WgpuState {
    pub(super) fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size: [u32; 2],
    ) {
        let commands = std::mem::take(&mut self.commands);
        let uniforms = std::mem::take(&mut self.uniforms);
        if commands.is_empty() {
            return;
        }

        let device = self.device.clone();
        let resources = &mut self.resources;
        let uniform_group = resources.upload_uniforms(&device, &self.queue, &uniforms);

        // All pipelines and bind groups exist before any pass borrows them.
        let mut texture_groups = HashMap::new();
        let resolved: Vec<Option<Resolved>> = commands
            .iter()
            .map(|command| match command {
                Command::Draw(draw) => Some(Resolved {
                    pipeline: resources.pipeline(&device, draw),
                    textures: resources.texture_group(&device, &mut texture_groups, draw),
                }),
                Command::Clear(_) => None,
            })
            .collect();

        let passes = plan_passes(&commands);
        let mut used_depth_targets = Vec::with_capacity(passes.len());
        log::trace!("encoding {} commands in {} passes", commands.len(), passes.len());

        for plan in &passes {
            let (color_view, target_size) = match &plan.target {
                Target::Surface => (view, size),
                Target::Texture { view, size, .. } => (&**view, *size),
            };
            let depth_view = resources.depth_target(&device, target_size);
            used_depth_targets.push(target_size);

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("vectile pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: plan.color, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: plan.depth,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: plan.stencil,
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for index in plan.draws.clone() {
                let (Command::Draw(draw), Some(resolved)) = (&commands[index], &resolved[index])
                else {
                    continue;
                };
                encode_draw(&mut pass, draw, resolved, &uniform_group, target_size);
            }
        }

        resources.depth_targets.retain(|size, _| used_depth_targets.contains(size));
    }
}

fn encode_draw(
    pass: &mut wgpu::RenderPass<'_>,
    draw: &DrawCommand,
    resolved: &Resolved,
    uniforms: &wgpu::BindGroup,
    target_size: [u32; 2],
) {
    // GL viewports grow up from the bottom-left corner.
    let vp = draw.viewport;
    let (width, height) = (target_size[0] as f32, target_size[1] as f32);
    let x = (vp.x as f32).clamp(0.0, width);
    let top = (height - (vp.y as f32 + vp.height as f32)).clamp(0.0, height);
    let w = (vp.width as f32).min(width - x);
    let h = (vp.height as f32).min(height - top);
    if w <= 0.0 || h <= 0.0 {
        log::warn!("skipping draw outside the {width}x{height} target");
        return;
    }

    let near = draw.depth_range.near.min(draw.depth_range.far);
    let far = draw.depth_range.near.max(draw.depth_range.far);

    pass.set_pipeline(&resolved.pipeline);
    pass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
    pass.set_bind_group(1, &*resolved.textures, &[]);
    for (slot, (buffer, offset)) in draw.vertex_buffers.iter().enumerate() {
        pass.set_vertex_buffer(slot as u32, buffer.slice(*offset..));
    }
    pass.set_viewport(x, top, w, h, near, far);
    pass.set_stencil_reference(draw.stencil_reference);
    pass.set_blend_constant(draw.blend_constant);

    match (draw.range, draw.index_buffer.as_ref()) {
        (DrawRange::Arrays { first, count }, _) => pass.draw(first..first + count, 0..1),
        (DrawRange::Elements { first, count }, Some(indices)) => {
            pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(first..first + count, 0, 0..1);
        }
        (DrawRange::Elements { .. }, None) => {}
    }
}
