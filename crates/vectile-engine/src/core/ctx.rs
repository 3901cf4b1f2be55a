use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::window::RuntimeCtx;

use super::app::AppControl;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

/// The acquired surface texture for one frame, as seen by draw code.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    /// Physical pixels.
    pub size: [u32; 2],
    pub format: wgpu::TextureFormat,
}

/// Per-redraw context.
///
/// `'a` spans the callback; `'w` is the window borrow held by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Drawable size in physical pixels.
    pub fn size(&self) -> [u32; 2] {
        let size = self.gpu.size();
        [size.width, size.height]
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Acquires the surface texture, hands it to `draw` and presents it.
    ///
    /// Surface loss reconfigures and schedules a redraw; only an
    /// out-of-memory error ends the app. A zero-sized window draws nothing.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut RenderTarget<'_>),
    {
        let size = self.size();
        if size[0] == 0 || size[1] == 0 {
            return AppControl::Continue;
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("failed to acquire surface texture: {err}");
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => AppControl::Exit,
                    SurfaceErrorAction::Reconfigured => AppControl::Redraw,
                    SurfaceErrorAction::SkipFrame => AppControl::Continue,
                };
            }
        };

        {
            let mut target = RenderTarget {
                encoder: &mut frame.encoder,
                view: &frame.view,
                size,
                format: self.gpu.surface_format(),
            };
            draw(&mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        AppControl::Continue
    }
}
