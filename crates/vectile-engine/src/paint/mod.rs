//! Color model shared between the style layers and the renderer.

pub mod color;

pub use color::Color;
