/// Parameters for creating a [`Gpu`](super::Gpu).
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Use an sRGB surface. Style colors are blended in gamma space, so the
    /// default is a linear (non-sRGB) format.
    pub srgb_surface: bool,

    /// Present mode; FIFO is supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Requested alpha mode. Falls back to the first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,

    /// Hint only; backends may clamp it.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            srgb_surface: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            // Map rendering needs nothing beyond the WebGL2 baseline.
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
