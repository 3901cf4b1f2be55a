//! Contract between the windowing runtime and applications.
//!
//! Apps never touch the event loop; they receive window events and a
//! [`FrameCtx`] per redraw and answer with an [`AppControl`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, RenderTarget, WindowCtx};
