//! Implementations of [`GraphicsApi`](super::GraphicsApi).

mod recording;
pub mod wgpu;

pub use recording::{Call, RecordingApi};
pub use self::wgpu::WgpuApi;
