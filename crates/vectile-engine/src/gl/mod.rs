//! GPU context: resource lifetimes, cached pipeline state and draw calls.

pub mod api;
pub mod backend;
pub(crate) mod check;
pub mod context;
pub mod drawable;
pub mod object;
pub mod state;
pub mod types;
pub mod value;

pub use api::{ApiError, GraphicsApi};
pub use context::{Context, ContextState, TEXTURE_POOL_SIZE};
pub use drawable::{
    AttributeBinding, BlendFunction, ColorMode, Depth, DrawMode, Drawable, Segment, Stencil,
    StencilTest, Uniforms, Vertex,
};
pub use object::{
    Framebuffer, IndexBuffer, Texture, Unique, UniqueBuffer, UniqueFramebuffer, UniqueProgram,
    UniqueShader, UniqueTexture, UniqueVertexArray, VertexBuffer,
};
pub use state::{State, StateValue};
pub use types::*;
