/// What the host should do after failing to acquire a surface texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was reconfigured; draw again on the next redraw.
    Reconfigured,
    /// Transient failure; drop this frame.
    SkipFrame,
    /// Out of memory; shut down.
    Fatal,
}
