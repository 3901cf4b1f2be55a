/// How frames are produced.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum MapMode {
    /// Interactive rendering; fades animate across frames.
    #[default]
    Continuous,
    /// One-shot image rendering. Tiles are stencil-clipped and nothing fades.
    Still,
}

/// Whether the native graphics context is shared with other renderers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ContextMode {
    #[default]
    Exclusive,
    /// Other code may change state between frames; the cache is distrusted
    /// after every frame.
    Shared,
}

/// Vertical orientation of the target surface.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ViewportMode {
    #[default]
    Default,
    /// Rows run top to bottom, as in offscreen textures read back by the host.
    FlippedY,
}
