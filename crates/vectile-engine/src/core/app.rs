use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::device::Gpu;

use super::ctx::FrameCtx;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    /// Continue, and schedule another frame for the window.
    Redraw,
    Exit,
}

pub trait App {
    /// Called once per window after its GPU context exists. Device-bound
    /// resources (painters, backends) are created here.
    fn on_gpu_ready(&mut self, window_id: WindowId, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let _ = (window_id, gpu);
        Ok(())
    }

    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called for every redraw of a window.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
