//! Interactive viewer for the vectile renderer.
//!
//! Keys: arrows pan, `+`/`-` zoom, `b` toggles tile borders, `o` toggles
//! the overdraw inspector (debug builds).

mod demo;

use std::time::Instant;

use anyhow::Context as _;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use vectile_engine::core::{App, AppControl, FrameCtx};
use vectile_engine::device::{Gpu, GpuInit};
use vectile_engine::gl::backend::WgpuApi;
use vectile_engine::logging::{LoggingConfig, init_logging};
use vectile_engine::map::TransformState;
use vectile_engine::renderer::{DebugOptions, FrameData, Painter, RendererConfig};
use vectile_engine::style::{ImageAtlas, MemoryStyle};
use vectile_engine::window::{Runtime, RuntimeConfig};

/// Pixels moved per arrow key press.
const PAN_STEP: f64 = 64.0;

struct Studio {
    style: MemoryStyle,
    annotations: ImageAtlas,
    debug_options: DebugOptions,
    renderer: Option<(WgpuApi, Painter)>,
}

impl Studio {
    fn new() -> Self {
        Self {
            style: demo::style(),
            annotations: ImageAtlas::new(1, 1),
            debug_options: DebugOptions::empty(),
            renderer: None,
        }
    }

    fn toggle(&mut self, option: DebugOptions) -> AppControl {
        self.debug_options.toggle(option);
        log::info!("debug options: {:?}", self.debug_options);
        AppControl::Redraw
    }

    fn with_transform(&mut self, f: impl FnOnce(&mut TransformState)) -> AppControl {
        let Some((_, painter)) = &mut self.renderer else {
            return AppControl::Continue;
        };
        f(painter.transform_mut());
        AppControl::Redraw
    }
}

impl App for Studio {
    fn on_gpu_ready(&mut self, _window_id: WindowId, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let api = WgpuApi::new(gpu.device().clone(), gpu.queue().clone(), gpu.surface_format());
        let size = gpu.size();
        let painter = Painter::new(
            Box::new(api.clone()),
            TransformState::new(size.width, size.height),
            RendererConfig::default(),
        )
        .context("failed to create painter")?;
        self.renderer = Some((api, painter));
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed {
            return AppControl::Continue;
        }

        match event.logical_key.as_ref() {
            Key::Named(NamedKey::ArrowLeft) => self.with_transform(|t| t.move_by(-PAN_STEP, 0.0)),
            Key::Named(NamedKey::ArrowRight) => self.with_transform(|t| t.move_by(PAN_STEP, 0.0)),
            Key::Named(NamedKey::ArrowUp) => self.with_transform(|t| t.move_by(0.0, -PAN_STEP)),
            Key::Named(NamedKey::ArrowDown) => self.with_transform(|t| t.move_by(0.0, PAN_STEP)),
            Key::Character("+" | "=") => self.with_transform(|t| t.set_zoom(t.zoom() + 0.5)),
            Key::Character("-") => self.with_transform(|t| t.set_zoom(t.zoom() - 0.5)),
            Key::Character("b") => self.toggle(DebugOptions::TILE_BORDERS),
            Key::Character("o") => self.toggle(DebugOptions::OVERDRAW),
            Key::Named(NamedKey::Escape) => AppControl::Exit,
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some((api, painter)) = &mut self.renderer else {
            return AppControl::Continue;
        };

        let size = ctx.size();
        painter.transform_mut().set_size(size[0], size[1]);
        let frame = FrameData {
            pixel_ratio: ctx.window.scale_factor() as f32,
            debug_options: self.debug_options,
            ..FrameData::new(size, Instant::now())
        };
        painter.render(&self.style, &frame, &self.annotations);

        api.set_color_format(ctx.gpu.surface_format());
        let control = ctx.render(|target| api.encode(target.encoder, target.view, target.size));
        painter.cleanup();

        match control {
            AppControl::Continue if painter.needs_animation() => AppControl::Redraw,
            control => control,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig { title: "vectile studio".to_string(), ..RuntimeConfig::default() };
    Runtime::run(config, GpuInit::default(), Studio::new())
}
