//! wgpu device and surface management.
//!
//! [`Gpu`] owns the adapter, device, queue and the window surface. The device
//! and queue are reference counted so the graphics backend can hold its own
//! handles for buffer and texture uploads.

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
