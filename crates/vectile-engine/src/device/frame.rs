/// An acquired surface texture plus the encoder recording into it.
///
/// Hold it only for the duration of one frame; the next texture cannot be
/// acquired while this one is alive.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
