//! Orchestrates one frame: uploads, clear, clipping masks, the opaque and
//! translucent layer passes and the per-source finish hooks.

mod background;
mod circle;
mod clipping;
mod debug;
mod fill;
mod line;
mod raster;
mod symbol;

use std::time::Duration;

use anyhow::Context as _;
use glam::{DMat4, Mat4};

use crate::algorithm::{ClipId, ClipIdGenerator};
use crate::gl::{
    BlendFactor, BlendFunction, ColorMask, ColorMode, CompareFunc, Context, Depth, DepthRange,
    GraphicsApi, Stencil, StencilOpKind, StencilTest, VertexBuffer, Viewport,
};
use crate::map::{ContextMode, MapMode, TransformState, ViewportMode};
use crate::paint::Color;
use crate::shader::vertex::{FillVertex, RASTER_TEXTURE_MAX, RasterVertex};
use crate::shader::{ShaderMode, Shaders};
use crate::style::{CustomLayer, LayerKind, RenderItem, RenderPass, SpriteAtlas, Style};
use crate::tile::{EXTENT, UnwrappedTileId};

use super::{FrameData, FrameHistory, PaintParameters, RenderTile, RendererConfig};

pub use raster::{contrast_factor, saturation_factor, spin_weights};

/// Depth distance between two neighbouring sublayers.
pub const DEPTH_EPSILON: f32 = 1.0 / 65536.0;

/// Draws styled tiles through a [`Context`].
///
/// Owns the context, the program sets and three static vertex buffers: a
/// tile-sized triangle list, a tile border line strip and a textured tile
/// quad.
pub struct Painter {
    context: Context,
    state: TransformState,
    config: RendererConfig,
    frame: FrameData,
    frame_history: FrameHistory,

    proj_matrix: DMat4,
    pixels_to_gl_units: [f32; 2],
    pass: RenderPass,
    /// Depth slot of the item being drawn; 0 is the topmost item.
    current_layer: i32,
    depth_range_size: f32,

    shaders: Shaders,
    #[cfg(debug_assertions)]
    overdraw_shaders: Shaders,

    tile_triangle_vertex_buffer: VertexBuffer<FillVertex>,
    tile_line_strip_vertex_buffer: VertexBuffer<FillVertex>,
    raster_vertex_buffer: VertexBuffer<RasterVertex>,
}

impl Painter {
    pub fn new(api: Box<dyn GraphicsApi>, state: TransformState, config: RendererConfig) -> anyhow::Result<Self> {
        let mut context = Context::with_texture_pool_size(api, config.texture_pool_size);

        const E: i16 = EXTENT;
        let tile_triangle_vertex_buffer = context.create_vertex_buffer(&[
            FillVertex::new(0, 0),
            FillVertex::new(E, 0),
            FillVertex::new(0, E),
            FillVertex::new(E, 0),
            FillVertex::new(0, E),
            FillVertex::new(E, E),
        ]);
        let tile_line_strip_vertex_buffer = context.create_vertex_buffer(&[
            FillVertex::new(0, 0),
            FillVertex::new(E, 0),
            FillVertex::new(E, E),
            FillVertex::new(0, E),
            FillVertex::new(0, 0),
        ]);
        const T: i16 = RASTER_TEXTURE_MAX;
        let raster_vertex_buffer = context.create_vertex_buffer(&[
            RasterVertex::new(0, 0, 0, 0),
            RasterVertex::new(E, 0, T, 0),
            RasterVertex::new(0, E, 0, T),
            RasterVertex::new(E, E, T, T),
        ]);

        let shaders = Shaders::new(&mut context, ShaderMode::Regular).context("failed to build shaders")?;
        #[cfg(debug_assertions)]
        let overdraw_shaders = Shaders::new(&mut context, ShaderMode::Overdraw)
            .context("failed to build overdraw shaders")?;

        // Nothing is known about the state the API starts in.
        context.set_dirty_state();
        log::debug!("painter ready ({}x{})", state.width(), state.height());

        Ok(Self {
            context,
            proj_matrix: state.proj_matrix(),
            state,
            config,
            frame: FrameData::new([0, 0], std::time::Instant::now()),
            frame_history: FrameHistory::new(),
            pixels_to_gl_units: [0.0, 0.0],
            pass: RenderPass::Opaque,
            current_layer: 0,
            depth_range_size: 0.0,
            shaders,
            #[cfg(debug_assertions)]
            overdraw_shaders,
            tile_triangle_vertex_buffer,
            tile_line_strip_vertex_buffer,
            raster_vertex_buffer,
        })
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    #[inline]
    pub fn transform(&self) -> &TransformState {
        &self.state
    }

    #[inline]
    pub fn transform_mut(&mut self) -> &mut TransformState {
        &mut self.state
    }

    /// The frame currently (or last) rendered.
    #[inline]
    pub fn frame(&self) -> &FrameData {
        &self.frame
    }

    #[inline]
    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    /// True while a symbol or raster fade is in flight.
    pub fn needs_animation(&self) -> bool {
        self.frame_history.needs_animation(self.config.fade_duration)
    }

    /// Deletes every abandoned GPU object.
    pub fn cleanup(&mut self) {
        self.context.perform_cleanup();
    }

    /// Draws one complete frame of `style`.
    pub fn render(&mut self, style: &dyn Style, frame: &FrameData, annotation_atlas: &dyn SpriteAtlas) {
        if self.frame.framebuffer_size != frame.framebuffer_size {
            let [width, height] = frame.framebuffer_size;
            self.context.set_viewport_default(Viewport::sized(width, height));
        }
        self.frame = frame.clone();

        let params = PaintParameters {
            programs: self.shaders().programs(),
            sprite_atlas: style.sprite_atlas(),
            glyph_atlas: style.glyph_atlas(),
            line_atlas: style.line_atlas(),
        };

        let data = style.render_data(self.frame.debug_options);

        self.proj_matrix = self.state.proj_matrix();
        let (width, height) = (self.state.width().max(1) as f32, self.state.height().max(1) as f32);
        self.pixels_to_gl_units = [2.0 / width, -2.0 / height];
        if self.state.viewport_mode() == ViewportMode::FlippedY {
            self.pixels_to_gl_units[1] *= -1.0;
        }

        let fade = match self.frame.map_mode {
            MapMode::Continuous => self.config.fade_duration,
            MapMode::Still => Duration::ZERO,
        };
        self.frame_history.record(self.frame.time_point, self.state.zoom(), fade);

        // upload
        params.sprite_atlas.upload(&mut self.context, 0);
        params.line_atlas.upload(&mut self.context, 0);
        params.glyph_atlas.upload(&mut self.context, 0);
        self.frame_history.upload(&mut self.context, 0);
        annotation_atlas.upload(&mut self.context, 0);
        for bucket in data.order.iter().filter_map(|item| item.bucket) {
            if bucket.needs_upload() {
                bucket.upload(&mut self.context);
            }
        }

        // clear
        self.context.reset_framebuffer();
        self.context.reset_viewport();
        let backdrop = if self.is_overdraw() { Color::black() } else { data.background_color };
        self.context.clear(Some(backdrop), Some(1.0), Some(0));

        // clipping masks
        let mut generator = ClipIdGenerator::new();
        for source in &data.sources {
            source.start_render(&mut generator, &self.proj_matrix, &self.state);
        }
        for (id, clip) in generator.stencils() {
            log::trace!("mask {id}: {clip}");
            self.render_clipping_mask(&id, clip);
        }

        // The item count stands in for the number of layers; custom layers
        // spanning several depth slots are not accounted for.
        let sublayers = self.config.sublayers as f32;
        self.depth_range_size = 1.0 - (data.order.len() as f32 + 2.0) * sublayers * DEPTH_EPSILON;

        // Opaque content top to bottom, so the depth test rejects what is
        // hidden; translucent content bottom to top for blending.
        let last = data.order.len() as i32 - 1;
        self.render_pass(&params, RenderPass::Opaque, data.order.iter().rev(), 0, 1);
        self.render_pass(&params, RenderPass::Translucent, data.order.iter(), last, -1);

        for source in &data.sources {
            source.finish_render(self);
        }

        if self.frame.context_mode == ContextMode::Shared {
            self.context.set_dirty_state();
        }
    }

    fn render_pass<'i, 'a: 'i>(
        &mut self,
        params: &PaintParameters<'_>,
        pass: RenderPass,
        items: impl Iterator<Item = &'i RenderItem<'a>>,
        first_layer: i32,
        step: i32,
    ) {
        self.pass = pass;
        log::trace!("{pass:?} pass {{");

        let mut index = first_layer;
        for item in items {
            self.current_layer = index;
            index += step;

            let layer = item.layer;
            if !layer.has_render_pass(pass) {
                continue;
            }

            match (&layer.kind, item.bucket, item.tile) {
                (LayerKind::Background(paint), _, _) => {
                    log::trace!("    {} - background", layer.id);
                    self.render_background(params, paint);
                }
                (LayerKind::Custom(custom), _, _) => {
                    log::trace!("    {} - custom", layer.id);
                    self.render_custom(custom);
                }
                (_, Some(bucket), Some(tile)) => {
                    log::trace!("    {} - {}", layer.id, tile.id);
                    bucket.render(self, params, layer, tile);
                }
                _ => log::warn!("{} layer `{}` has no tile to draw", layer.name(), layer.id),
            }
        }

        log::trace!("}}");
    }

    /// Runs an external renderer with the state cache out of the way.
    fn render_custom(&mut self, layer: &CustomLayer) {
        self.context.reset_state();
        layer.0.render(self.context.api_mut(), &self.state);
        self.context.set_dirty_state();
        self.context.reset_framebuffer();
        self.context.reset_viewport();
    }

    // ── policies ───────────────────────────────────────────────────────────

    #[cfg(debug_assertions)]
    fn is_overdraw(&self) -> bool {
        self.frame.debug_options.contains(super::DebugOptions::OVERDRAW)
    }

    #[cfg(not(debug_assertions))]
    fn is_overdraw(&self) -> bool {
        false
    }

    #[cfg(debug_assertions)]
    fn shaders(&self) -> &Shaders {
        if self.is_overdraw() { &self.overdraw_shaders } else { &self.shaders }
    }

    #[cfg(not(debug_assertions))]
    fn shaders(&self) -> &Shaders {
        &self.shaders
    }

    /// Depth slice of sublayer `n` of the current item.
    ///
    /// Slices start one epsilon apart so that a higher item always wins the
    /// `LessEqual` test against a lower one.
    pub fn depth_range_for_sublayer(&self, n: u32) -> DepthRange {
        let near = ((1 + self.current_layer) as f32 * self.config.sublayers as f32 + n as f32) * DEPTH_EPSILON;
        DepthRange { near, far: near + self.depth_range_size }
    }

    fn depth_for_sublayer(&self, n: u32, mask: bool) -> Depth {
        Depth { func: CompareFunc::LessEqual, mask, range: self.depth_range_for_sublayer(n) }
    }

    /// Only pixels owned by the tile pass.
    pub fn stencil_for_clipping(&self, clip: ClipId) -> Stencil {
        Stencil {
            test: StencilTest::Equal(u32::from(clip.mask)),
            reference: i32::from(clip.reference),
            mask: 0,
            fail: StencilOpKind::Keep,
            depth_fail: StencilOpKind::Keep,
            pass: StencilOpKind::Replace,
        }
    }

    /// Still images clip every tile; continuous tile layouts never overlap.
    fn stencil_for_tile(&self, tile: &RenderTile) -> Stencil {
        match self.frame.map_mode {
            MapMode::Still => self.stencil_for_clipping(tile.clip()),
            MapMode::Continuous => Stencil::disabled(),
        }
    }

    pub fn color_for_render_pass(&self) -> ColorMode {
        if self.is_overdraw() {
            const OVERDRAW: f32 = 1.0 / 8.0;
            ColorMode {
                blend_function: BlendFunction::Add { src: BlendFactor::ConstantColor, dst: BlendFactor::One },
                blend_color: Color::from_premul(OVERDRAW, OVERDRAW, OVERDRAW, 0.0),
                mask: ColorMask::ALL,
            }
        } else if self.pass == RenderPass::Translucent {
            ColorMode::alpha_blended()
        } else {
            ColorMode::unblended()
        }
    }

    /// Tile units of `id` to clip space.
    pub fn matrix_for_tile(&self, id: &UnwrappedTileId) -> Mat4 {
        (self.proj_matrix * self.state.matrix_for(id)).as_mat4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::backend::RecordingApi;
    use crate::renderer::DebugOptions;

    fn painter() -> Painter {
        Painter::new(Box::new(RecordingApi::new()), TransformState::new(512, 512), RendererConfig::default())
            .unwrap()
    }

    #[test]
    fn sublayers_of_one_item_are_ordered() {
        let mut painter = painter();
        painter.depth_range_size = 1.0 - 5.0 * 3.0 * DEPTH_EPSILON;
        painter.current_layer = 1;

        let ranges: Vec<_> = (0..3).map(|n| painter.depth_range_for_sublayer(n)).collect();
        assert!(ranges.windows(2).all(|w| w[0].near < w[1].near));
        assert!(ranges.iter().all(|r| r.far <= 1.0));
        assert_eq!(ranges[0].near, 6.0 * DEPTH_EPSILON);
    }

    #[test]
    fn clipping_stencil_tests_the_tile_bits() {
        let painter = painter();
        let stencil = painter.stencil_for_clipping(ClipId::new(0b0000_0110, 0b0000_0100));
        assert_eq!(stencil.test, StencilTest::Equal(0b110));
        assert_eq!(stencil.reference, 0b100);
        assert_eq!(stencil.mask, 0);
    }

    #[test]
    fn blending_follows_the_pass() {
        let mut painter = painter();
        painter.pass = RenderPass::Opaque;
        assert_eq!(painter.color_for_render_pass(), ColorMode::unblended());
        painter.pass = RenderPass::Translucent;
        assert_eq!(painter.color_for_render_pass(), ColorMode::alpha_blended());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn overdraw_blends_additively_in_every_pass() {
        let mut painter = painter();
        painter.frame.debug_options = DebugOptions::OVERDRAW;
        for pass in [RenderPass::Opaque, RenderPass::Translucent] {
            painter.pass = pass;
            let color = painter.color_for_render_pass();
            assert_eq!(
                color.blend_function,
                BlendFunction::Add { src: BlendFactor::ConstantColor, dst: BlendFactor::One }
            );
            assert_eq!(color.blend_color.r, 0.125);
            assert_eq!(color.blend_color.a, 0.0);
        }
    }
}
